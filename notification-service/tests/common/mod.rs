#![allow(dead_code)]

use axum::{
    body::{to_bytes, Body},
    http::{Request, StatusCode},
    Router,
};
use chrono::{DateTime, Duration, TimeZone, Utc};
use jsonwebtoken::{encode, EncodingKey, Header};
use notification_service::auth::{AccessTokenClaims, PrincipalResolver, TokenVerifier};
use notification_service::models::Notification;
use notification_service::services::InMemoryNotificationStore;
use notification_service::startup::{build_router, AppState};
use std::sync::Arc;
use tower::util::ServiceExt;

pub const TEST_SECRET: &str = "notification-test-secret";

pub struct TestApp {
    pub router: Router,
    pub store: Arc<InMemoryNotificationStore>,
}

impl TestApp {
    pub fn spawn(notifications: Vec<Notification>) -> Self {
        Self::spawn_with(notifications, false)
    }

    pub fn spawn_with(notifications: Vec<Notification>, trust_user_header: bool) -> Self {
        let store = Arc::new(InMemoryNotificationStore::with_notifications(notifications));
        let resolver =
            PrincipalResolver::new(TokenVerifier::from_secret(TEST_SECRET), trust_user_header);
        let router = build_router(AppState::new(store.clone(), resolver));

        TestApp { router, store }
    }

    /// Issue a GET, optionally with extra headers, and return status + body bytes.
    pub async fn get(&self, uri: &str, headers: &[(&str, &str)]) -> (StatusCode, Vec<u8>) {
        let mut builder = Request::builder().uri(uri);
        for (name, value) in headers {
            builder = builder.header(*name, *value);
        }

        let response = self
            .router
            .clone()
            .oneshot(builder.body(Body::empty()).unwrap())
            .await
            .unwrap();

        let status = response.status();
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, body.to_vec())
    }

    pub async fn get_as(&self, uri: &str, user_id: &str) -> (StatusCode, Vec<u8>) {
        let auth = format!("Bearer {}", issue_token(user_id, 3600));
        self.get(uri, &[("Authorization", auth.as_str())]).await
    }
}

pub fn issue_token(user_id: &str, ttl_secs: i64) -> String {
    issue_token_signed(TEST_SECRET, user_id, ttl_secs)
}

pub fn issue_token_signed(secret: &str, user_id: &str, ttl_secs: i64) -> String {
    let now = Utc::now().timestamp();
    let claims = AccessTokenClaims {
        sub: user_id.to_string(),
        email: format!("{}@example.com", user_id),
        exp: now + ttl_secs,
        iat: now,
        jti: uuid::Uuid::new_v4().to_string(),
    };
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .unwrap()
}

/// Same signing key as access tokens, refresh-token claim set (no `email`).
pub fn issue_refresh_token(user_id: &str, ttl_secs: i64) -> String {
    let now = Utc::now().timestamp();
    let claims = serde_json::json!({
        "sub": user_id,
        "jti": uuid::Uuid::new_v4().to_string(),
        "exp": now + ttl_secs,
        "iat": now,
    });
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(TEST_SECRET.as_bytes()),
    )
    .unwrap()
}

/// A fixed instant plus `minutes`.
pub fn at(minutes: i64) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, 15, 9, 0, 0).unwrap() + Duration::minutes(minutes)
}

pub fn notification(user_id: &str, title: &str, created_at: DateTime<Utc>) -> Notification {
    Notification::new(user_id, "schedule", title, format!("{} body", title), created_at)
}

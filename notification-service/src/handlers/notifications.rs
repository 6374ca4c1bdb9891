use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};

use crate::auth::Principal;
use crate::models::{NotificationCountResponse, NotificationResponse};
use crate::startup::AppState;
use service_core::error::AppError;

/// `GET /notifications/`: the caller's notifications, newest first.
///
/// No principal means 401 with an empty body and no store access.
#[tracing::instrument(skip(state, principal), fields(user_id = tracing::field::Empty))]
pub async fn get_notifications(
    State(state): State<AppState>,
    principal: Principal,
) -> Result<Response, AppError> {
    tracing::info!("Notification list request started");

    let Principal::Authenticated(user) = principal else {
        tracing::warn!("Unauthenticated attempt to read notifications");
        return Ok(StatusCode::UNAUTHORIZED.into_response());
    };

    tracing::Span::current().record("user_id", user.id.as_str());
    tracing::info!(user_id = %user.id, "Authenticated user");

    let notifications = state
        .notification_service
        .get_notifications_for_user(&user.id)
        .await?;

    tracing::info!(count = notifications.len(), "Notifications retrieved");
    tracing::debug!(?notifications, "Notification details");

    let body: Vec<NotificationResponse> = notifications
        .into_iter()
        .map(NotificationResponse::from)
        .collect();

    tracing::info!("Notification list request completed");
    Ok((StatusCode::OK, Json(body)).into_response())
}

/// `GET /notifications/count`: how many notifications the caller has.
#[tracing::instrument(skip(state, principal), fields(user_id = tracing::field::Empty))]
pub async fn count_notifications(
    State(state): State<AppState>,
    principal: Principal,
) -> Result<Response, AppError> {
    tracing::info!("Notification count request started");

    let Some(user) = principal.user() else {
        tracing::warn!("Unauthenticated attempt to count notifications");
        return Ok(StatusCode::UNAUTHORIZED.into_response());
    };

    tracing::Span::current().record("user_id", user.id.as_str());
    tracing::info!(user_id = %user.id, "Authenticated user");

    let result = state.notification_service.count_for_user(&user.id).await?;

    tracing::info!(result, "Notification count request completed");
    Ok(Json(NotificationCountResponse { result }).into_response())
}

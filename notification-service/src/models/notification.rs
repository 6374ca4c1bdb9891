use chrono::{DateTime, Utc};
use mongodb::bson::oid::ObjectId;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A notification owned by exactly one user.
///
/// Documents are written by upstream producers; this service only reads them.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Notification {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub notification_id: String,
    pub user_id: String,
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub metadata: HashMap<String, String>,
    #[serde(with = "mongodb::bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub created_at: DateTime<Utc>,
}

impl Notification {
    pub fn new(
        user_id: impl Into<String>,
        kind: impl Into<String>,
        title: impl Into<String>,
        message: impl Into<String>,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: None,
            notification_id: uuid::Uuid::new_v4().to_string(),
            user_id: user_id.into(),
            kind: kind.into(),
            title: title.into(),
            message: message.into(),
            metadata: HashMap::new(),
            created_at,
        }
    }
}

/// Wire shape of a notification. Hides the Mongo `_id` and renders
/// `created_at` as RFC 3339 instead of extended JSON.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NotificationResponse {
    pub notification_id: String,
    pub user_id: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub title: String,
    pub message: String,
    pub metadata: HashMap<String, String>,
    pub created_at: DateTime<Utc>,
}

impl From<Notification> for NotificationResponse {
    fn from(n: Notification) -> Self {
        Self {
            notification_id: n.notification_id,
            user_id: n.user_id,
            kind: n.kind,
            title: n.title,
            message: n.message,
            metadata: n.metadata,
            created_at: n.created_at,
        }
    }
}

/// Body of the count endpoint.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NotificationCountResponse {
    pub result: u64,
}

use crate::models::Notification;
use crate::services::{record_retrieval, NotificationRepository};
use service_core::error::AppError;
use std::sync::Arc;

/// Reads a user's notification inbox.
#[derive(Clone)]
pub struct NotificationService {
    repository: Arc<dyn NotificationRepository>,
}

impl NotificationService {
    pub fn new(repository: Arc<dyn NotificationRepository>) -> Self {
        Self { repository }
    }

    pub fn repository(&self) -> &Arc<dyn NotificationRepository> {
        &self.repository
    }

    /// Every notification owned by `user_id`, newest first. An unknown user
    /// is not an error and yields an empty list.
    pub async fn get_notifications_for_user(
        &self,
        user_id: &str,
    ) -> Result<Vec<Notification>, AppError> {
        tracing::info!("Notification lookup started");
        tracing::info!(user_id = %user_id, "Looking up notifications for user");

        let notifications = self
            .repository
            .find_by_user_id_order_by_created_at_desc(user_id)
            .await
            .inspect_err(|_| record_retrieval("error"))?;

        tracing::info!(user_id = %user_id, count = notifications.len(), "Notifications found");
        tracing::debug!(?notifications, "Notifications found");
        record_retrieval("ok");

        tracing::info!("Notification lookup completed");
        Ok(notifications)
    }

    pub async fn count_for_user(&self, user_id: &str) -> Result<u64, AppError> {
        let count = self.repository.count_by_user_id(user_id).await?;
        tracing::info!(user_id = %user_id, count, "Counted notifications for user");
        Ok(count)
    }
}

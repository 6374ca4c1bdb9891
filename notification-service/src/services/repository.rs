use crate::models::Notification;
use async_trait::async_trait;
use service_core::error::AppError;

/// Read access to persisted notifications.
#[async_trait]
pub trait NotificationRepository: Send + Sync {
    /// All notifications owned by `user_id`, newest first. Records sharing a
    /// `created_at` come back in whatever order the backend yields them.
    async fn find_by_user_id_order_by_created_at_desc(
        &self,
        user_id: &str,
    ) -> Result<Vec<Notification>, AppError>;

    async fn count_by_user_id(&self, user_id: &str) -> Result<u64, AppError>;

    async fn health_check(&self) -> Result<(), AppError>;
}

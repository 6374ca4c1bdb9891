use crate::models::Notification;
use crate::services::NotificationRepository;
use async_trait::async_trait;
use service_core::error::AppError;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use tokio::sync::RwLock;

/// Process-local notification store.
///
/// Keeps insertion order, so ties on `created_at` come back in the order they
/// were inserted. `set_available(false)` makes every call fail like an
/// unreachable database.
#[derive(Default)]
pub struct InMemoryNotificationStore {
    notifications: RwLock<Vec<Notification>>,
    unavailable: AtomicBool,
    queries: AtomicUsize,
}

impl InMemoryNotificationStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_notifications(notifications: Vec<Notification>) -> Self {
        Self {
            notifications: RwLock::new(notifications),
            ..Self::default()
        }
    }

    pub async fn insert(&self, notification: Notification) {
        self.notifications.write().await.push(notification);
    }

    pub fn set_available(&self, available: bool) {
        self.unavailable.store(!available, Ordering::SeqCst);
    }

    /// Number of lookups served, including failed ones.
    pub fn query_count(&self) -> usize {
        self.queries.load(Ordering::SeqCst)
    }

    fn ensure_available(&self) -> Result<(), AppError> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(AppError::DatabaseError(anyhow::anyhow!(
                "notification store unavailable"
            )));
        }
        Ok(())
    }
}

#[async_trait]
impl NotificationRepository for InMemoryNotificationStore {
    async fn find_by_user_id_order_by_created_at_desc(
        &self,
        user_id: &str,
    ) -> Result<Vec<Notification>, AppError> {
        self.queries.fetch_add(1, Ordering::SeqCst);
        self.ensure_available()?;

        let mut matching: Vec<Notification> = self
            .notifications
            .read()
            .await
            .iter()
            .filter(|n| n.user_id == user_id)
            .cloned()
            .collect();

        // sort_by is stable
        matching.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(matching)
    }

    async fn count_by_user_id(&self, user_id: &str) -> Result<u64, AppError> {
        self.queries.fetch_add(1, Ordering::SeqCst);
        self.ensure_available()?;

        let count = self
            .notifications
            .read()
            .await
            .iter()
            .filter(|n| n.user_id == user_id)
            .count();
        Ok(count as u64)
    }

    async fn health_check(&self) -> Result<(), AppError> {
        self.ensure_available()
    }
}

use crate::models::Notification;
use crate::services::NotificationRepository;
use async_trait::async_trait;
use futures::TryStreamExt;
use mongodb::{
    bson::doc,
    options::{FindOptions, IndexOptions},
    Client as MongoClient, Collection, Database, IndexModel,
};
use service_core::error::AppError;

#[derive(Clone)]
pub struct NotificationDb {
    client: MongoClient,
    db: Database,
}

impl NotificationDb {
    pub async fn connect(uri: &str, database: &str) -> Result<Self, AppError> {
        tracing::info!(database = %database, "Connecting to MongoDB");
        let client = MongoClient::with_uri_str(uri).await.map_err(|e| {
            tracing::error!("Failed to connect to MongoDB: {}", e);
            AppError::DatabaseError(anyhow::anyhow!(e.to_string()))
        })?;
        let db = client.database(database);
        tracing::info!(database = %database, "Successfully connected to MongoDB database");
        Ok(Self { client, db })
    }

    pub async fn initialize_indexes(&self) -> Result<(), AppError> {
        tracing::info!("Creating MongoDB indexes for notification-service");

        // Serves the inbox query: equality on user_id, then newest first
        let user_created_index = IndexModel::builder()
            .keys(doc! { "user_id": 1, "created_at": -1 })
            .options(
                IndexOptions::builder()
                    .name("user_id_created_at_idx".to_string())
                    .build(),
            )
            .build();

        self.notifications()
            .create_index(user_created_index, None)
            .await
            .map_err(|e| {
                tracing::error!("Failed to create user_id/created_at index: {}", e);
                AppError::DatabaseError(anyhow::anyhow!(e.to_string()))
            })?;

        let notification_id_index = IndexModel::builder()
            .keys(doc! { "notification_id": 1 })
            .options(
                IndexOptions::builder()
                    .name("notification_id_idx".to_string())
                    .unique(true)
                    .build(),
            )
            .build();

        self.notifications()
            .create_index(notification_id_index, None)
            .await
            .map_err(|e| {
                tracing::error!("Failed to create notification_id index: {}", e);
                AppError::DatabaseError(anyhow::anyhow!(e.to_string()))
            })?;

        tracing::info!("Successfully created all MongoDB indexes");
        Ok(())
    }

    pub fn notifications(&self) -> Collection<Notification> {
        self.db.collection("notifications")
    }
}

#[async_trait]
impl NotificationRepository for NotificationDb {
    async fn find_by_user_id_order_by_created_at_desc(
        &self,
        user_id: &str,
    ) -> Result<Vec<Notification>, AppError> {
        let find_options = FindOptions::builder()
            .sort(doc! { "created_at": -1 })
            .build();

        let cursor = self
            .notifications()
            .find(doc! { "user_id": user_id }, find_options)
            .await
            .map_err(|e| {
                tracing::error!("Failed to query notifications: {}", e);
                AppError::DatabaseError(anyhow::anyhow!(e.to_string()))
            })?;

        let notifications: Vec<Notification> = cursor.try_collect().await.map_err(|e| {
            tracing::error!("Failed to collect notifications: {}", e);
            AppError::DatabaseError(anyhow::anyhow!(e.to_string()))
        })?;

        Ok(notifications)
    }

    async fn count_by_user_id(&self, user_id: &str) -> Result<u64, AppError> {
        self.notifications()
            .count_documents(doc! { "user_id": user_id }, None)
            .await
            .map_err(|e| {
                tracing::error!("Failed to count notifications: {}", e);
                AppError::DatabaseError(anyhow::anyhow!(e.to_string()))
            })
    }

    async fn health_check(&self) -> Result<(), AppError> {
        self.client
            .database("admin")
            .run_command(doc! { "ping": 1 }, None)
            .await
            .map_err(|e| {
                tracing::error!("MongoDB health check failed: {}", e);
                AppError::DatabaseError(anyhow::anyhow!(e.to_string()))
            })?;
        Ok(())
    }
}

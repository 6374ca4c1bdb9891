pub mod database;
pub mod memory;
pub mod metrics;
pub mod notification;
pub mod repository;

pub use database::NotificationDb;
pub use memory::InMemoryNotificationStore;
pub use metrics::{get_metrics, init_metrics, record_retrieval};
pub use notification::NotificationService;
pub use repository::NotificationRepository;

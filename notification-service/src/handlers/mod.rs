//! HTTP handlers for notification-service.

pub mod health;
pub mod notifications;

pub use health::{health_check, metrics_endpoint, readiness_check};
pub use notifications::{count_notifications, get_notifications};

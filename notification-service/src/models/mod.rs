pub mod notification;

pub use notification::{Notification, NotificationCountResponse, NotificationResponse};

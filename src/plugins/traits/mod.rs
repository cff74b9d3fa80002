pub mod notifier;

pub use notifier::{Notification, NotificationResult, NotifierPlugin};

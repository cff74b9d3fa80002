// Notifier plugin implementations
pub mod email;

pub use email::EmailNotifier;

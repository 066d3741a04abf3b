use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum NotificationLevel { Success, Error, Info, Warning }

/// User-facing channel for operation outcomes. Fire-and-forget: implementations must not fail
/// or panic.
pub trait NotificationService: Send + Sync + 'static {
    fn notify(&self, level: NotificationLevel, message: &str, title: Option<&str>);

    fn success(&self, message: &str, title: Option<&str>) { self.notify(NotificationLevel::Success, message, title) }
    fn error(&self, message: &str, title: Option<&str>) { self.notify(NotificationLevel::Error, message, title) }
    fn info(&self, message: &str, title: Option<&str>) { self.notify(NotificationLevel::Info, message, title) }
    fn warning(&self, message: &str, title: Option<&str>) { self.notify(NotificationLevel::Warning, message, title) }
}

pub mod create_todo;
pub mod delete_todo;
pub mod get_todo_by_id;
pub mod get_todos;
pub mod patch;
pub mod todo_service;
pub mod update_todo;
pub mod update_todo_status;


use crate::domain::{error::TodoError, notification::NotificationService};

fn notify_failure(notifier: &dyn NotificationService, err: &TodoError, fallback: &str) {
    let message = err.to_string();
    tracing::warn!(error = %message, "todo operation failed");
    notifier.error(if message.is_empty() { fallback } else { &message }, None);
}

use std::sync::Arc;

use crate::domain::{error::TodoError, notification::NotificationService, repository::TodoRepository, todo::TodoId};

use super::notify_failure;

pub struct DeleteTodo {
    repo: Arc<dyn TodoRepository>,
    notifier: Arc<dyn NotificationService>,
}

impl DeleteTodo {
    pub fn new(repo: Arc<dyn TodoRepository>, notifier: Arc<dyn NotificationService>) -> Self {
        Self { repo, notifier }
    }

    pub async fn execute(&self, id: &TodoId) -> Result<(), TodoError> {
        match self.repo.delete(id).await {
            Ok(()) => {
                self.notifier.success("Todo deleted successfully", None);
                Ok(())
            }
            Err(e) => {
                let e = TodoError::from(e);
                notify_failure(self.notifier.as_ref(), &e, "Failed to delete todo");
                Err(e)
            }
        }
    }
}

use std::sync::Arc;

use crate::domain::{
    error::TodoError,
    notification::NotificationService,
    repository::TodoRepository,
    todo::{Todo, TodoId},
};

use super::notify_failure;

pub struct UpdateTodoStatus {
    repo: Arc<dyn TodoRepository>,
    notifier: Arc<dyn NotificationService>,
}

impl UpdateTodoStatus {
    pub fn new(repo: Arc<dyn TodoRepository>, notifier: Arc<dyn NotificationService>) -> Self {
        Self { repo, notifier }
    }

    /// Moves the todo to the requested completion state. Toggles only when the state differs,
    /// but always writes through the repository.
    pub async fn execute(&self, id: &TodoId, completed: bool) -> Result<Todo, TodoError> {
        match self.run(id, completed).await {
            Ok(todo) => {
                let message = if completed { "Todo marked as completed" } else { "Todo marked as pending" };
                self.notifier.success(message, None);
                Ok(todo)
            }
            Err(e) => {
                notify_failure(self.notifier.as_ref(), &e, "Failed to update todo status");
                Err(e)
            }
        }
    }

    async fn run(&self, id: &TodoId, completed: bool) -> Result<Todo, TodoError> {
        let mut todo = self.repo.find_by_id(id).await?.ok_or(TodoError::NotFound)?;
        if todo.completed() != completed {
            todo.toggle_complete();
        }
        Ok(self.repo.update(todo).await?)
    }
}

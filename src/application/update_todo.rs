use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Deserialize;

use crate::domain::{
    error::TodoError,
    notification::NotificationService,
    repository::TodoRepository,
    todo::{Todo, TodoId, TodoPriority},
};

use super::{notify_failure, patch::Patch};

/// Partial update. Title, priority and tags cannot be cleared, only replaced.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateTodoInput {
    pub id: TodoId,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Patch<String>,
    #[serde(default)]
    pub priority: Option<TodoPriority>,
    #[serde(default)]
    pub due_date: Patch<DateTime<Utc>>,
    #[serde(default)]
    pub tags: Option<Vec<String>>,
}

impl UpdateTodoInput {
    pub fn new(id: TodoId) -> Self { Self { id, ..Default::default() } }
}

pub struct UpdateTodo {
    repo: Arc<dyn TodoRepository>,
    notifier: Arc<dyn NotificationService>,
}

impl UpdateTodo {
    pub fn new(repo: Arc<dyn TodoRepository>, notifier: Arc<dyn NotificationService>) -> Self {
        Self { repo, notifier }
    }

    pub async fn execute(&self, input: UpdateTodoInput) -> Result<Todo, TodoError> {
        match self.run(input).await {
            Ok(todo) => {
                self.notifier.success("Todo updated successfully", None);
                Ok(todo)
            }
            Err(e) => {
                notify_failure(self.notifier.as_ref(), &e, "Failed to update todo");
                Err(e)
            }
        }
    }

    async fn run(&self, input: UpdateTodoInput) -> Result<Todo, TodoError> {
        let mut todo = self.repo.find_by_id(&input.id).await?.ok_or(TodoError::NotFound)?;

        if let Some(title) = input.title {
            todo.update_title(&title)?;
        }
        if let Some(description) = input.description.into_change() {
            todo.update_description(description);
        }
        if let Some(priority) = input.priority {
            todo.update_priority(priority);
        }
        if let Some(due_date) = input.due_date.into_change() {
            todo.set_due_date(due_date);
        }
        if let Some(tags) = input.tags {
            todo.replace_tags(tags);
        }

        todo.validate().into_result()?;
        Ok(self.repo.update(todo).await?)
    }
}

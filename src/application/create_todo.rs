use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Deserialize;

use crate::domain::{
    error::TodoError,
    notification::NotificationService,
    repository::TodoRepository,
    todo::{Todo, TodoPriority},
};

use super::notify_failure;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CreateTodoInput {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub priority: Option<TodoPriority>,
    pub user_id: String,
    #[serde(default)]
    pub due_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub tags: Option<Vec<String>>,
}

impl CreateTodoInput {
    pub fn new(title: impl Into<String>, user_id: impl Into<String>) -> Self {
        Self { title: title.into(), user_id: user_id.into(), ..Default::default() }
    }
}

pub struct CreateTodo {
    repo: Arc<dyn TodoRepository>,
    notifier: Arc<dyn NotificationService>,
}

impl CreateTodo {
    pub fn new(repo: Arc<dyn TodoRepository>, notifier: Arc<dyn NotificationService>) -> Self {
        Self { repo, notifier }
    }

    pub async fn execute(&self, input: CreateTodoInput) -> Result<Todo, TodoError> {
        match self.run(input).await {
            Ok(todo) => {
                self.notifier.success("Todo created successfully", None);
                Ok(todo)
            }
            Err(e) => {
                notify_failure(self.notifier.as_ref(), &e, "Failed to create todo");
                Err(e)
            }
        }
    }

    async fn run(&self, input: CreateTodoInput) -> Result<Todo, TodoError> {
        let description = input
            .description
            .map(|d| d.trim().to_string())
            .filter(|d| !d.is_empty());
        let todo = Todo::draft(
            input.title.trim().to_string(),
            description,
            input.priority.unwrap_or_default(),
            input.user_id,
            input.due_date,
            input.tags.unwrap_or_default(),
        );
        todo.validate().into_result()?;
        Ok(self.repo.save(todo).await?)
    }
}

use std::sync::Arc;

use crate::domain::{
    error::PersistenceError,
    repository::{TodoFilters, TodoRepository},
    todo::Todo,
};

pub struct GetTodos {
    repo: Arc<dyn TodoRepository>,
}

impl GetTodos {
    pub fn new(repo: Arc<dyn TodoRepository>) -> Self { Self { repo } }

    pub async fn execute(&self, user_id: &str, filters: Option<&TodoFilters>) -> Result<Vec<Todo>, PersistenceError> {
        self.repo.find_all(user_id, filters).await
    }
}

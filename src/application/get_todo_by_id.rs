use std::sync::Arc;

use crate::domain::{
    error::PersistenceError,
    repository::TodoRepository,
    todo::{Todo, TodoId},
};

pub struct GetTodoById {
    repo: Arc<dyn TodoRepository>,
}

impl GetTodoById {
    pub fn new(repo: Arc<dyn TodoRepository>) -> Self { Self { repo } }

    pub async fn execute(&self, id: &TodoId) -> Result<Option<Todo>, PersistenceError> {
        self.repo.find_by_id(id).await
    }
}

use std::sync::Arc;

use async_trait::async_trait;

use crate::domain::error::{PersistenceError, TodoError};
use crate::domain::notification::NotificationService;
use crate::domain::repository::{TodoFilters, TodoRepository};
use crate::domain::todo::{Todo, TodoId};

use super::{
    create_todo::{CreateTodo, CreateTodoInput},
    delete_todo::DeleteTodo,
    get_todo_by_id::GetTodoById,
    get_todos::GetTodos,
    update_todo::{UpdateTodo, UpdateTodoInput},
    update_todo_status::UpdateTodoStatus,
};

/// Everything a front end needs, one method per use case.
#[async_trait]
pub trait TodoService: Send + Sync + 'static {
    async fn create(&self, input: CreateTodoInput) -> Result<Todo, TodoError>;
    async fn get(&self, id: &TodoId) -> Result<Option<Todo>, PersistenceError>;
    async fn list(&self, user_id: &str, filters: Option<&TodoFilters>) -> Result<Vec<Todo>, PersistenceError>;
    async fn update(&self, input: UpdateTodoInput) -> Result<Todo, TodoError>;
    async fn set_completed(&self, id: &TodoId, completed: bool) -> Result<Todo, TodoError>;
    async fn delete(&self, id: &TodoId) -> Result<(), TodoError>;
}

pub struct TodoServiceImpl {
    create: CreateTodo,
    update: UpdateTodo,
    update_status: UpdateTodoStatus,
    delete: DeleteTodo,
    get_todos: GetTodos,
    get_todo_by_id: GetTodoById,
}

impl TodoServiceImpl {
    pub fn new(repo: Arc<dyn TodoRepository>, notifier: Arc<dyn NotificationService>) -> Self {
        Self {
            create: CreateTodo::new(repo.clone(), notifier.clone()),
            update: UpdateTodo::new(repo.clone(), notifier.clone()),
            update_status: UpdateTodoStatus::new(repo.clone(), notifier.clone()),
            delete: DeleteTodo::new(repo.clone(), notifier),
            get_todos: GetTodos::new(repo.clone()),
            get_todo_by_id: GetTodoById::new(repo),
        }
    }
}

#[async_trait]
impl TodoService for TodoServiceImpl {
    async fn create(&self, input: CreateTodoInput) -> Result<Todo, TodoError> { self.create.execute(input).await }
    async fn get(&self, id: &TodoId) -> Result<Option<Todo>, PersistenceError> { self.get_todo_by_id.execute(id).await }
    async fn list(&self, user_id: &str, filters: Option<&TodoFilters>) -> Result<Vec<Todo>, PersistenceError> { self.get_todos.execute(user_id, filters).await }
    async fn update(&self, input: UpdateTodoInput) -> Result<Todo, TodoError> { self.update.execute(input).await }
    async fn set_completed(&self, id: &TodoId, completed: bool) -> Result<Todo, TodoError> { self.update_status.execute(id, completed).await }
    async fn delete(&self, id: &TodoId) -> Result<(), TodoError> { self.delete.execute(id).await }
}

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::{
    error::PersistenceError,
    repository::{TodoFilters, TodoRepository},
    todo::{Todo, TodoId, TodoParts, TodoPriority, TodoStatus},
};

use super::key_value::KeyValueStore;

pub const STORAGE_KEY: &str = "todogo_todos";

/// Keeps every todo as one JSON array under [`STORAGE_KEY`].
///
/// Each write is a full read-modify-write of that array with no locking, so concurrent writers
/// can lose updates.
#[derive(Clone)]
pub struct LocalStorageTodoRepository {
    store: Arc<dyn KeyValueStore>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StoredTodo {
    id: String,
    title: String,
    description: Option<String>,
    completed: bool,
    status: TodoStatus,
    priority: TodoPriority,
    user_id: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    completed_at: Option<DateTime<Utc>>,
    due_date: Option<DateTime<Utc>>,
    #[serde(default)]
    tags: Vec<String>,
}

impl From<&Todo> for StoredTodo {
    fn from(todo: &Todo) -> Self {
        let p = todo.clone().into_parts();
        Self {
            id: p.id.0,
            title: p.title,
            description: p.description,
            completed: p.completed,
            status: p.status,
            priority: p.priority,
            user_id: p.user_id,
            created_at: p.created_at,
            updated_at: p.updated_at,
            completed_at: p.completed_at,
            due_date: p.due_date,
            tags: p.tags,
        }
    }
}

impl From<StoredTodo> for Todo {
    fn from(s: StoredTodo) -> Self {
        Todo::restore(TodoParts {
            id: TodoId(s.id),
            title: s.title,
            description: s.description,
            completed: s.completed,
            status: s.status,
            priority: s.priority,
            user_id: s.user_id,
            created_at: s.created_at,
            updated_at: s.updated_at,
            completed_at: s.completed_at,
            due_date: s.due_date,
            tags: s.tags,
        })
    }
}

impl LocalStorageTodoRepository {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self { Self { store } }

    async fn load(&self) -> Result<Vec<Todo>, PersistenceError> {
        let Some(raw) = self.store.get(STORAGE_KEY).await? else { return Ok(Vec::new()) };
        match serde_json::from_str::<Vec<StoredTodo>>(&raw) {
            Ok(items) => Ok(items.into_iter().map(Todo::from).collect()),
            Err(e) => {
                tracing::warn!(error = %e, "discarding unreadable todos from local storage");
                Ok(Vec::new())
            }
        }
    }

    async fn store_all(&self, todos: &[Todo]) -> Result<(), PersistenceError> {
        let items: Vec<StoredTodo> = todos.iter().map(StoredTodo::from).collect();
        let raw = serde_json::to_string(&items)?;
        self.store.set(STORAGE_KEY, &raw).await
    }

    async fn transition(&self, id: &TodoId, completed: bool) -> Result<Todo, PersistenceError> {
        let mut todo = self.find_by_id(id).await?.ok_or(PersistenceError::NotFound)?;
        if todo.completed() != completed {
            todo.toggle_complete();
        }
        self.update(todo).await
    }
}

/// `todo_<unix millis>_<9 random hex chars>`
fn generate_id() -> TodoId {
    let random = Uuid::new_v4().simple().to_string();
    TodoId(format!("todo_{}_{}", Utc::now().timestamp_millis(), &random[..9]))
}

#[async_trait]
impl TodoRepository for LocalStorageTodoRepository {
    async fn find_all(&self, user_id: &str, filters: Option<&TodoFilters>) -> Result<Vec<Todo>, PersistenceError> {
        let todos = self.load().await?;
        Ok(todos
            .into_iter()
            .filter(|t| t.user_id() == user_id)
            .filter(|t| filters.is_none_or(|f| f.matches(t)))
            .collect())
    }

    async fn find_by_id(&self, id: &TodoId) -> Result<Option<Todo>, PersistenceError> {
        Ok(self.load().await?.into_iter().find(|t| t.id() == id))
    }

    async fn save(&self, todo: Todo) -> Result<Todo, PersistenceError> {
        let mut todos = self.load().await?;
        let stored = todo.with_id(generate_id());
        todos.push(stored.clone());
        self.store_all(&todos).await?;
        tracing::debug!(id = %stored.id(), "saved todo to local storage");
        Ok(stored)
    }

    async fn update(&self, todo: Todo) -> Result<Todo, PersistenceError> {
        let mut todos = self.load().await?;
        let slot = todos.iter_mut().find(|t| t.id() == todo.id()).ok_or(PersistenceError::NotFound)?;
        *slot = todo.clone();
        self.store_all(&todos).await?;
        Ok(todo)
    }

    async fn delete(&self, id: &TodoId) -> Result<(), PersistenceError> {
        let mut todos = self.load().await?;
        todos.retain(|t| t.id() != id);
        self.store_all(&todos).await
    }

    async fn mark_as_completed(&self, id: &TodoId) -> Result<Todo, PersistenceError> {
        self.transition(id, true).await
    }

    async fn mark_as_pending(&self, id: &TodoId) -> Result<Todo, PersistenceError> {
        self.transition(id, false).await
    }
}

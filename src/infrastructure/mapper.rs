//! Translation between the backend's wire schema and the [`Todo`] entity.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::todo::{Todo, TodoId, TodoParts, TodoPriority, TodoStatus};

/// A todo as the backend sends and accepts it: snake_case fields, RFC 3339 dates, enums as
/// lowercase strings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TodoDto {
    /// Omitted on the wire while empty so creation requests carry no placeholder id.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    pub completed: bool,
    pub status: TodoStatus,
    pub priority: TodoPriority,
    pub user_id: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default)]
    pub completed_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub due_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub tags: Option<Vec<String>>,
}

pub struct TodoMapper;

impl TodoMapper {
    pub fn to_domain(dto: TodoDto) -> Todo {
        Todo::restore(TodoParts {
            id: TodoId(dto.id),
            title: dto.title,
            description: dto.description,
            completed: dto.completed,
            status: dto.status,
            priority: dto.priority,
            user_id: dto.user_id,
            created_at: dto.created_at,
            updated_at: dto.updated_at,
            completed_at: dto.completed_at,
            due_date: dto.due_date,
            tags: dto.tags.unwrap_or_default(),
        })
    }

    pub fn to_dto(todo: &Todo) -> TodoDto {
        TodoDto {
            id: todo.id().0.clone(),
            title: todo.title().to_string(),
            description: todo.description().map(str::to_string),
            completed: todo.completed(),
            status: todo.status(),
            priority: todo.priority(),
            user_id: todo.user_id().to_string(),
            created_at: todo.created_at(),
            updated_at: todo.updated_at(),
            completed_at: todo.completed_at(),
            due_date: todo.due_date(),
            tags: Some(todo.tags().to_vec()),
        }
    }

    pub fn to_domain_list(dtos: Vec<TodoDto>) -> Vec<Todo> {
        dtos.into_iter().map(Self::to_domain).collect()
    }
}

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::error::ValidationError;

pub const TITLE_MAX_LEN: usize = 200;
pub const DESCRIPTION_MAX_LEN: usize = 1000;

/// Opaque identifier assigned by the backing store. Empty until the todo is first persisted.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(transparent)]
pub struct TodoId(pub String);

impl TodoId {
    pub fn unassigned() -> Self { Self(String::new()) }
    pub fn is_assigned(&self) -> bool { !self.0.is_empty() }
    pub fn as_str(&self) -> &str { &self.0 }
}

impl fmt::Display for TodoId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(&self.0) }
}

impl From<&str> for TodoId {
    fn from(s: &str) -> Self { Self(s.to_string()) }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum TodoStatus { Pending, Completed }

impl TodoStatus {
    pub fn as_str(&self) -> &'static str {
        match self { TodoStatus::Pending => "pending", TodoStatus::Completed => "completed" }
    }
}

impl FromStr for TodoStatus {
    type Err = ValidationError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(TodoStatus::Pending),
            "completed" => Ok(TodoStatus::Completed),
            other => Err(ValidationError::new(format!("invalid status: {other}"))),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum TodoPriority { Low, #[default] Medium, High }

impl TodoPriority {
    pub fn as_str(&self) -> &'static str {
        match self { TodoPriority::Low => "low", TodoPriority::Medium => "medium", TodoPriority::High => "high" }
    }

    /// Next priority in the low → medium → high → low cycle.
    pub fn next(&self) -> Self {
        match self { TodoPriority::Low => TodoPriority::Medium, TodoPriority::Medium => TodoPriority::High, TodoPriority::High => TodoPriority::Low }
    }
}

impl FromStr for TodoPriority {
    type Err = ValidationError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "low" => Ok(TodoPriority::Low),
            "medium" => Ok(TodoPriority::Medium),
            "high" => Ok(TodoPriority::High),
            other => Err(ValidationError::new(format!("invalid priority: {other}"))),
        }
    }
}

/// Every field of a todo as stored by an adapter. Used to rebuild an entity without going
/// through the mutation methods.
#[derive(Debug, Clone, PartialEq)]
pub struct TodoParts {
    pub id: TodoId,
    pub title: String,
    pub description: Option<String>,
    pub completed: bool,
    pub status: TodoStatus,
    pub priority: TodoPriority,
    pub user_id: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    pub due_date: Option<DateTime<Utc>>,
    pub tags: Vec<String>,
}

/// Outcome of [`Todo::validate`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Validation {
    pub is_valid: bool,
    pub errors: Vec<String>,
}

impl Validation {
    pub fn into_result(self) -> Result<(), ValidationError> {
        if self.is_valid { Ok(()) } else { Err(ValidationError::new(self.errors.join(", "))) }
    }
}

/// The todo entity. Fields are only changed through the methods below, each of which refreshes
/// `updated_at`.
#[derive(Debug, Clone, PartialEq)]
pub struct Todo {
    id: TodoId,
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
    tags: Vec<String>,
}

impl Todo {
    /// A fresh, pending todo with an unassigned id. Nothing is validated here; callers run
    /// [`Todo::validate`] before persisting.
    pub fn draft(
        title: String,
        description: Option<String>,
        priority: TodoPriority,
        user_id: String,
        due_date: Option<DateTime<Utc>>,
        tags: Vec<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: TodoId::unassigned(),
            title,
            description,
            completed: false,
            status: TodoStatus::Pending,
            priority,
            user_id,
            created_at: now,
            updated_at: now,
            completed_at: None,
            due_date,
            tags: dedup_tags(tags),
        }
    }

    /// Rebuilds an entity from stored fields. `status` and `completed_at` follow `completed`
    /// so a stored record can never break the completion invariants.
    pub fn restore(parts: TodoParts) -> Self {
        let completed = parts.completed;
        let completed_at = if completed { parts.completed_at.or(Some(parts.updated_at)) } else { None };
        Self {
            id: parts.id,
            title: parts.title,
            description: parts.description,
            completed,
            status: if completed { TodoStatus::Completed } else { TodoStatus::Pending },
            priority: parts.priority,
            user_id: parts.user_id,
            created_at: parts.created_at,
            updated_at: parts.updated_at,
            completed_at,
            due_date: parts.due_date,
            tags: dedup_tags(parts.tags),
        }
    }

    pub fn into_parts(self) -> TodoParts {
        TodoParts {
            id: self.id,
            title: self.title,
            description: self.description,
            completed: self.completed,
            status: self.status,
            priority: self.priority,
            user_id: self.user_id,
            created_at: self.created_at,
            updated_at: self.updated_at,
            completed_at: self.completed_at,
            due_date: self.due_date,
            tags: self.tags,
        }
    }

    /// Same todo under the id a store assigned to it.
    pub fn with_id(mut self, id: TodoId) -> Self {
        self.id = id;
        self
    }

    pub fn id(&self) -> &TodoId { &self.id }
    pub fn title(&self) -> &str { &self.title }
    pub fn description(&self) -> Option<&str> { self.description.as_deref() }
    pub fn completed(&self) -> bool { self.completed }
    pub fn status(&self) -> TodoStatus { self.status }
    pub fn priority(&self) -> TodoPriority { self.priority }
    pub fn user_id(&self) -> &str { &self.user_id }
    pub fn created_at(&self) -> DateTime<Utc> { self.created_at }
    pub fn updated_at(&self) -> DateTime<Utc> { self.updated_at }
    pub fn completed_at(&self) -> Option<DateTime<Utc>> { self.completed_at }
    pub fn due_date(&self) -> Option<DateTime<Utc>> { self.due_date }
    pub fn tags(&self) -> &[String] { &self.tags }

    pub fn toggle_complete(&mut self) {
        self.completed = !self.completed;
        self.status = if self.completed { TodoStatus::Completed } else { TodoStatus::Pending };
        self.completed_at = if self.completed { Some(Utc::now()) } else { None };
        self.touch();
    }

    pub fn update_title(&mut self, title: &str) -> Result<(), ValidationError> {
        let trimmed = title.trim();
        if trimmed.is_empty() {
            return Err(ValidationError::new("Title cannot be empty"));
        }
        self.title = trimmed.to_string();
        self.touch();
        Ok(())
    }

    pub fn update_description(&mut self, description: Option<String>) {
        self.description = description;
        self.touch();
    }

    pub fn update_priority(&mut self, priority: TodoPriority) {
        self.priority = priority;
        self.touch();
    }

    pub fn set_due_date(&mut self, due_date: Option<DateTime<Utc>>) {
        self.due_date = due_date;
        self.touch();
    }

    /// No-op when the tag is already present.
    pub fn add_tag(&mut self, tag: &str) {
        if !self.tags.iter().any(|t| t == tag) {
            self.tags.push(tag.to_string());
            self.touch();
        }
    }

    /// Always refreshes `updated_at`, even when the tag was not present.
    pub fn remove_tag(&mut self, tag: &str) {
        self.tags.retain(|t| t != tag);
        self.touch();
    }

    pub fn replace_tags(&mut self, tags: Vec<String>) {
        self.tags = dedup_tags(tags);
        self.touch();
    }

    pub fn is_overdue(&self) -> bool {
        self.is_overdue_at(Utc::now())
    }

    pub fn is_overdue_at(&self, now: DateTime<Utc>) -> bool {
        match self.due_date {
            Some(due) if !self.completed => now > due,
            _ => false,
        }
    }

    pub fn validate(&self) -> Validation {
        let mut errors = Vec::new();
        if self.title.trim().is_empty() {
            errors.push("Title is required".to_string());
        }
        if self.title.chars().count() > TITLE_MAX_LEN {
            errors.push(format!("Title must be less than {TITLE_MAX_LEN} characters"));
        }
        if self.description.as_ref().is_some_and(|d| d.chars().count() > DESCRIPTION_MAX_LEN) {
            errors.push(format!("Description must be less than {DESCRIPTION_MAX_LEN} characters"));
        }
        Validation { is_valid: errors.is_empty(), errors }
    }

    // updated_at never moves backwards, even if the wall clock does
    fn touch(&mut self) {
        let now = Utc::now();
        if now > self.updated_at {
            self.updated_at = now;
        }
    }
}

fn dedup_tags(tags: Vec<String>) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(tags.len());
    for tag in tags {
        if !out.contains(&tag) {
            out.push(tag);
        }
    }
    out
}

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use super::error::PersistenceError;
use super::todo::{Todo, TodoId, TodoPriority, TodoStatus};

/// Inclusive due-date window. Either bound may be open.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DueDateRange {
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
}

/// Optional query narrowing for [`TodoRepository::find_all`]. An empty filter matches everything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TodoFilters {
    pub status: Option<TodoStatus>,
    pub priority: Option<TodoPriority>,
    /// Case-insensitive substring of title or description.
    pub search: Option<String>,
    /// Matches when any of these tags is present.
    pub tags: Vec<String>,
    /// Not every adapter honours this; the remote API ignores it.
    pub due_date: Option<DueDateRange>,
}

impl TodoFilters {
    pub fn matches(&self, todo: &Todo) -> bool {
        if self.status.is_some_and(|s| s != todo.status()) {
            return false;
        }
        if self.priority.is_some_and(|p| p != todo.priority()) {
            return false;
        }
        if let Some(search) = self.search.as_deref().filter(|s| !s.is_empty()) {
            let needle = search.to_lowercase();
            let in_title = todo.title().to_lowercase().contains(&needle);
            let in_description = todo.description().is_some_and(|d| d.to_lowercase().contains(&needle));
            if !in_title && !in_description {
                return false;
            }
        }
        if !self.tags.is_empty() && !self.tags.iter().any(|t| todo.tags().contains(t)) {
            return false;
        }
        if let Some(range) = &self.due_date {
            if range.from.is_some() || range.to.is_some() {
                let Some(due) = todo.due_date() else { return false };
                if range.from.is_some_and(|from| due < from) || range.to.is_some_and(|to| due > to) {
                    return false;
                }
            }
        }
        true
    }
}

#[async_trait]
pub trait TodoRepository: Send + Sync + 'static {
    /// Todos owned by `user_id`, narrowed by `filters` where the adapter supports them.
    async fn find_all(&self, user_id: &str, filters: Option<&TodoFilters>) -> Result<Vec<Todo>, PersistenceError>;
    /// `Ok(None)` means not found.
    async fn find_by_id(&self, id: &TodoId) -> Result<Option<Todo>, PersistenceError>;
    /// Persists a new todo and returns the stored copy with its assigned id.
    async fn save(&self, todo: Todo) -> Result<Todo, PersistenceError>;
    async fn update(&self, todo: Todo) -> Result<Todo, PersistenceError>;
    async fn delete(&self, id: &TodoId) -> Result<(), PersistenceError>;
    async fn mark_as_completed(&self, id: &TodoId) -> Result<Todo, PersistenceError>;
    async fn mark_as_pending(&self, id: &TodoId) -> Result<Todo, PersistenceError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn todo(title: &str, description: Option<&str>, tags: &[&str]) -> Todo {
        Todo::draft(
            title.into(),
            description.map(str::to_string),
            TodoPriority::Medium,
            "u1".into(),
            None,
            tags.iter().map(|t| t.to_string()).collect(),
        )
    }

    #[test]
    fn empty_filter_matches_all() {
        assert!(TodoFilters::default().matches(&todo("a", None, &[])));
    }

    #[test]
    fn search_is_case_insensitive_over_title_and_description() {
        let f = TodoFilters { search: Some("MILK".into()), ..Default::default() };
        assert!(f.matches(&todo("buy milk", None, &[])));
        assert!(f.matches(&todo("shopping", Some("oat milk"), &[])));
        assert!(!f.matches(&todo("shopping", None, &[])));
    }

    #[test]
    fn tags_match_any() {
        let f = TodoFilters { tags: vec!["work".into(), "home".into()], ..Default::default() };
        assert!(f.matches(&todo("a", None, &["home"])));
        assert!(!f.matches(&todo("a", None, &["gym"])));
    }

    #[test]
    fn due_range_excludes_undated_and_out_of_range() {
        let now = Utc::now();
        let f = TodoFilters {
            due_date: Some(DueDateRange { from: Some(now - Duration::days(1)), to: Some(now + Duration::days(1)) }),
            ..Default::default()
        };
        let mut dated = todo("a", None, &[]);
        assert!(!f.matches(&dated));
        dated.set_due_date(Some(now));
        assert!(f.matches(&dated));
        dated.set_due_date(Some(now + Duration::days(2)));
        assert!(!f.matches(&dated));
    }

    #[test]
    fn status_and_priority_are_exact() {
        let mut t = todo("a", None, &[]);
        let f = TodoFilters { status: Some(TodoStatus::Completed), priority: Some(TodoPriority::Medium), ..Default::default() };
        assert!(!f.matches(&t));
        t.toggle_complete();
        assert!(f.matches(&t));
        t.update_priority(TodoPriority::High);
        assert!(!f.matches(&t));
    }
}

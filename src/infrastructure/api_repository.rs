use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::{de::DeserializeOwned, Deserialize};

use crate::domain::{
    error::PersistenceError,
    repository::{TodoFilters, TodoRepository},
    todo::{Todo, TodoId},
};

use super::credentials::CredentialStore;
use super::mapper::{TodoDto, TodoMapper};

/// `{ "data": ... }` envelope used by every backend response.
#[derive(Debug, Deserialize)]
pub(crate) struct Envelope<T> {
    pub data: Option<T>,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: Option<String>,
}

/// Todos held by the remote backend, reached over JSON/HTTP.
#[derive(Clone)]
pub struct ApiTodoRepository {
    client: Client,
    base_url: String,
    credentials: CredentialStore,
}

impl ApiTodoRepository {
    pub fn new(base_url: &str, credentials: CredentialStore) -> Self {
        Self::with_client(Client::new(), base_url, credentials)
    }

    pub fn with_client(client: Client, base_url: &str, credentials: CredentialStore) -> Self {
        Self { client, base_url: base_url.trim_end_matches('/').to_string(), credentials }
    }

    fn url(&self, path: &str) -> String { format!("{}{}", self.base_url, path) }

    /// Attaches the bearer token when one is stored; an absent token is not an error.
    async fn authorize(&self, req: RequestBuilder) -> Result<RequestBuilder, PersistenceError> {
        Ok(match self.credentials.token().await? {
            Some(token) => req.bearer_auth(token),
            None => req,
        })
    }

    async fn send(&self, req: RequestBuilder) -> Result<Response, PersistenceError> {
        let req = self.authorize(req).await?;
        req.send().await.map_err(|e| PersistenceError::Transport(e.to_string()))
    }

    async fn fetch_list(&self, req: RequestBuilder) -> Result<Vec<Todo>, PersistenceError> {
        let resp = self.send(req).await?;
        let dtos: Vec<TodoDto> = read_data(resp).await?.unwrap_or_default();
        Ok(TodoMapper::to_domain_list(dtos))
    }

    /// A 404 answer is `None`, not an error.
    async fn fetch_optional(&self, req: RequestBuilder) -> Result<Option<Todo>, PersistenceError> {
        let resp = self.send(req).await?;
        if resp.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let dto: Option<TodoDto> = read_data(resp).await?;
        Ok(dto.map(TodoMapper::to_domain))
    }

    /// Any success status, with or without a body.
    async fn execute(&self, req: RequestBuilder) -> Result<(), PersistenceError> {
        check_status(self.send(req).await?).await?;
        Ok(())
    }

    async fn fetch_todo(&self, req: RequestBuilder) -> Result<Todo, PersistenceError> {
        let resp = self.send(req).await?;
        let status = resp.status().as_u16();
        let dto: TodoDto = read_data(resp).await?.ok_or_else(|| PersistenceError::Api {
            status,
            message: "response carried no data".into(),
        })?;
        Ok(TodoMapper::to_domain(dto))
    }
}

pub(crate) async fn check_status(resp: Response) -> Result<Response, PersistenceError> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let body = resp.bytes().await.unwrap_or_default();
    Err(PersistenceError::Api { status: status.as_u16(), message: error_message(status.as_u16(), &body) })
}

/// The body's `message`, a status line when the JSON has none, a generic text when it is not JSON.
fn error_message(status: u16, body: &[u8]) -> String {
    match serde_json::from_slice::<ErrorBody>(body) {
        Ok(ErrorBody { message: Some(m) }) if !m.is_empty() => m,
        Ok(_) => format!("HTTP error! status: {status}"),
        Err(_) => "An error occurred".to_string(),
    }
}

pub(crate) async fn read_data<T: DeserializeOwned>(resp: Response) -> Result<Option<T>, PersistenceError> {
    let resp = check_status(resp).await?;
    let bytes = resp.bytes().await.map_err(|e| PersistenceError::Transport(e.to_string()))?;
    let envelope: Envelope<T> = serde_json::from_slice(&bytes)?;
    Ok(envelope.data)
}

fn query_params(filters: Option<&TodoFilters>) -> Vec<(&'static str, String)> {
    let mut params = Vec::new();
    let Some(f) = filters else { return params };
    if let Some(status) = f.status {
        params.push(("status", status.as_str().to_string()));
    }
    if let Some(priority) = f.priority {
        params.push(("priority", priority.as_str().to_string()));
    }
    if let Some(search) = f.search.as_deref().filter(|s| !s.is_empty()) {
        params.push(("search", search.to_string()));
    }
    if !f.tags.is_empty() {
        params.push(("tags", f.tags.join(",")));
    }
    params
}

fn logged<T>(op: &'static str, result: Result<T, PersistenceError>) -> Result<T, PersistenceError> {
    if let Err(e) = &result {
        tracing::error!(error = %e, "{op}");
    }
    result
}

#[async_trait]
impl TodoRepository for ApiTodoRepository {
    // todos are scoped to the user by the bearer token, not by a parameter
    async fn find_all(&self, _user_id: &str, filters: Option<&TodoFilters>) -> Result<Vec<Todo>, PersistenceError> {
        let req = self.client.get(self.url("/todos")).query(&query_params(filters));
        logged("error fetching todos", self.fetch_list(req).await)
    }

    async fn find_by_id(&self, id: &TodoId) -> Result<Option<Todo>, PersistenceError> {
        let req = self.client.get(self.url(&format!("/todos/{id}")));
        logged("error fetching todo", self.fetch_optional(req).await)
    }

    async fn save(&self, todo: Todo) -> Result<Todo, PersistenceError> {
        let req = self.client.post(self.url("/todos")).json(&TodoMapper::to_dto(&todo));
        logged("error creating todo", self.fetch_todo(req).await)
    }

    async fn update(&self, todo: Todo) -> Result<Todo, PersistenceError> {
        let req = self.client.put(self.url(&format!("/todos/{}", todo.id()))).json(&TodoMapper::to_dto(&todo));
        logged("error updating todo", self.fetch_todo(req).await)
    }

    async fn delete(&self, id: &TodoId) -> Result<(), PersistenceError> {
        let req = self.client.delete(self.url(&format!("/todos/{id}")));
        logged("error deleting todo", self.execute(req).await)
    }

    async fn mark_as_completed(&self, id: &TodoId) -> Result<Todo, PersistenceError> {
        let req = self.client.patch(self.url(&format!("/todos/{id}/complete")));
        logged("error marking todo as completed", self.fetch_todo(req).await)
    }

    async fn mark_as_pending(&self, id: &TodoId) -> Result<Todo, PersistenceError> {
        let req = self.client.patch(self.url(&format!("/todos/{id}/incomplete")));
        logged("error marking todo as pending", self.fetch_todo(req).await)
    }
}

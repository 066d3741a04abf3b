use std::sync::{Arc, Mutex};

use axum::body::to_bytes;
use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::IntoResponse;
use axum::routing::{get, patch, post};
use axum::{Json, Router};
use serde_json::{json, Value};

use todogo::application::{create_todo::CreateTodoInput, patch::Patch, todo_service::{TodoService, TodoServiceImpl}, update_todo::UpdateTodoInput};
use todogo::domain::error::{PersistenceError, TodoError};
use todogo::domain::repository::{TodoFilters, TodoRepository};
use todogo::domain::todo::{TodoId, TodoPriority, TodoStatus};
use todogo::http::{routes::todos, routing};
use todogo::infrastructure::{
    api_repository::ApiTodoRepository,
    auth_service::{AuthError, AuthService, LoginInput, RegisterInput},
    credentials::CredentialStore,
    key_value::InMemoryKeyValueStore,
    notification::ToastNotificationService,
};

const TOKEN: &str = "tok-123";
// ids the fake backend answers oddly for
const PLAIN_ERROR_ID: &str = "plain-error";
const NO_DATA_ID: &str = "no-data";

type Db = Arc<Mutex<Vec<Value>>>;

// ---- fake backend -------------------------------------------------------------------------

fn authorized(headers: &HeaderMap) -> bool {
    headers.get("authorization").and_then(|v| v.to_str().ok()) == Some(&format!("Bearer {TOKEN}"))
}

fn unauthorized() -> axum::response::Response {
    (StatusCode::UNAUTHORIZED, Json(json!({ "success": false, "message": "missing token" }))).into_response()
}

fn not_found() -> axum::response::Response {
    (StatusCode::NOT_FOUND, Json(json!({ "success": false, "message": "todo not found" }))).into_response()
}

async fn login(Json(body): Json<Value>) -> axum::response::Response {
    if body["password"] == "secret1" {
        Json(json!({ "success": true, "data": { "token": TOKEN, "user": { "id": "u1", "name": "Ada", "email": body["email"] } } })).into_response()
    } else {
        (StatusCode::UNAUTHORIZED, Json(json!({ "success": false, "message": "invalid credentials" }))).into_response()
    }
}

async fn register(Json(body): Json<Value>) -> axum::response::Response {
    let mut keys: Vec<&str> = body.as_object().map(|o| o.keys().map(String::as_str).collect()).unwrap_or_default();
    keys.sort_unstable();
    let name = body["name"].as_str().unwrap_or_default();
    if keys != ["email", "name", "password"] || name != name.trim() {
        return (StatusCode::BAD_REQUEST, Json(json!({ "success": false, "message": format!("unexpected body {body}") }))).into_response();
    }
    if body["email"] == "taken@example.com" {
        return (StatusCode::CONFLICT, Json(json!({ "success": false, "message": "Email already registered" }))).into_response();
    }
    let user = json!({ "id": "u2", "name": name, "email": body["email"] });
    (StatusCode::CREATED, Json(json!({ "success": true, "data": { "token": TOKEN, "user": user } }))).into_response()
}

async fn list(State(db): State<Db>, headers: HeaderMap, Query(q): Query<std::collections::HashMap<String, String>>) -> axum::response::Response {
    if !authorized(&headers) { return unauthorized(); }
    let items: Vec<Value> = db.lock().unwrap().iter()
        .filter(|t| q.get("status").is_none_or(|s| t["status"] == s.as_str()))
        .cloned()
        .collect();
    Json(json!({ "success": true, "data": items })).into_response()
}

async fn create(State(db): State<Db>, headers: HeaderMap, Json(mut body): Json<Value>) -> axum::response::Response {
    if !authorized(&headers) { return unauthorized(); }
    assert!(body.get("id").is_none(), "creation must not send an id");
    let now = chrono::Utc::now().to_rfc3339();
    body["id"] = json!(uuid::Uuid::new_v4().to_string());
    body["user_id"] = json!("u1");
    body["created_at"] = json!(now);
    body["updated_at"] = json!(now);
    db.lock().unwrap().push(body.clone());
    (StatusCode::CREATED, Json(json!({ "success": true, "data": body }))).into_response()
}

async fn fetch(State(db): State<Db>, headers: HeaderMap, Path(id): Path<String>) -> axum::response::Response {
    if !authorized(&headers) { return unauthorized(); }
    match db.lock().unwrap().iter().find(|t| t["id"] == id.as_str()) {
        Some(t) => Json(json!({ "success": true, "data": t })).into_response(),
        None => not_found(),
    }
}

async fn replace(State(db): State<Db>, headers: HeaderMap, Path(id): Path<String>, Json(body): Json<Value>) -> axum::response::Response {
    if !authorized(&headers) { return unauthorized(); }
    let mut db = db.lock().unwrap();
    let Some(slot) = db.iter_mut().find(|t| t["id"] == id.as_str()) else { return not_found() };
    for key in ["title", "description", "priority", "due_date", "tags", "completed", "status", "completed_at"] {
        slot[key] = body[key].clone();
    }
    slot["updated_at"] = json!(chrono::Utc::now().to_rfc3339());
    Json(json!({ "success": true, "data": slot })).into_response()
}

async fn remove(State(db): State<Db>, headers: HeaderMap, Path(id): Path<String>) -> axum::response::Response {
    if !authorized(&headers) { return unauthorized(); }
    if id == PLAIN_ERROR_ID {
        return (StatusCode::BAD_GATEWAY, "upstream exploded").into_response();
    }
    db.lock().unwrap().retain(|t| t["id"] != id.as_str());
    StatusCode::NO_CONTENT.into_response()
}

async fn set_completed(db: Db, headers: HeaderMap, id: String, completed: bool) -> axum::response::Response {
    if !authorized(&headers) { return unauthorized(); }
    if id == NO_DATA_ID {
        return Json(json!({ "success": true })).into_response();
    }
    let mut db = db.lock().unwrap();
    let Some(slot) = db.iter_mut().find(|t| t["id"] == id.as_str()) else { return not_found() };
    slot["completed"] = json!(completed);
    slot["status"] = json!(if completed { "completed" } else { "pending" });
    slot["completed_at"] = if completed { json!(chrono::Utc::now().to_rfc3339()) } else { Value::Null };
    Json(json!({ "success": true, "data": slot })).into_response()
}

fn backend(db: Db) -> Router {
    Router::new()
        .route("/api/v1/auth/login", post(login))
        .route("/api/v1/auth/register", post(register))
        .route("/api/v1/todos", get(list).post(create))
        .route("/api/v1/todos/:id", get(fetch).put(replace).delete(remove))
        .route("/api/v1/todos/:id/complete", patch(|State(db): State<Db>, h: HeaderMap, Path(id): Path<String>| set_completed(db, h, id, true)))
        .route("/api/v1/todos/:id/incomplete", patch(|State(db): State<Db>, h: HeaderMap, Path(id): Path<String>| set_completed(db, h, id, false)))
        .with_state(db)
}

async fn spawn_backend() -> (String, Db) {
    let db: Db = Arc::default();
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let app = backend(db.clone());
    tokio::spawn(async move { axum::serve(listener, app).await.unwrap() });
    (format!("http://{addr}/api/v1/"), db)
}

fn client(base_url: &str) -> (AuthService, ApiTodoRepository) {
    let credentials = CredentialStore::new(Arc::new(InMemoryKeyValueStore::new()));
    (AuthService::new(base_url, credentials.clone()), ApiTodoRepository::new(base_url, credentials))
}

// ---- remote adapter -----------------------------------------------------------------------

#[tokio::test]
async fn acceptance_login_then_crud_through_use_cases() {
    let (base_url, db) = spawn_backend().await;
    let (auth, repo) = client(&base_url);

    let session = auth.login(&LoginInput { email: "ada@example.com".into(), password: "secret1".into() }).await.unwrap();
    assert_eq!(session.user.id, "u1");
    assert!(auth.is_authenticated().await.unwrap());
    assert_eq!(auth.current_user().await.unwrap().unwrap().name, "Ada");

    let repo = Arc::new(repo);
    let toasts = ToastNotificationService::new();
    let service = TodoServiceImpl::new(repo.clone(), Arc::new(toasts.clone()));

    // create
    let input = CreateTodoInput { tags: Some(vec!["home".into()]), ..CreateTodoInput::new("Buy milk", "u1") };
    let created = service.create(input).await.unwrap();
    assert!(created.id().is_assigned());
    assert_eq!(created.priority(), TodoPriority::Medium);
    assert_eq!(created.tags(), ["home".to_string()]);
    assert_eq!(db.lock().unwrap()[0]["priority"], "medium");

    // list
    let all = service.list("u1", None).await.unwrap();
    assert_eq!(all.len(), 1);

    // get
    assert_eq!(service.get(created.id()).await.unwrap().unwrap().title(), "Buy milk");

    // update
    let updated = service
        .update(UpdateTodoInput { description: Patch::Set("2 litres".into()), priority: Some(TodoPriority::High), ..UpdateTodoInput::new(created.id().clone()) })
        .await
        .unwrap();
    assert_eq!(updated.description(), Some("2 litres"));
    assert_eq!(updated.priority(), TodoPriority::High);

    // status through the dedicated endpoints
    let done = repo.mark_as_completed(created.id()).await.unwrap();
    assert_eq!(done.status(), TodoStatus::Completed);
    assert!(done.completed_at().is_some());
    let filters = TodoFilters { status: Some(TodoStatus::Completed), ..Default::default() };
    assert_eq!(service.list("u1", Some(&filters)).await.unwrap().len(), 1);
    let pending = repo.mark_as_pending(created.id()).await.unwrap();
    assert_eq!(pending.completed_at(), None);
    assert!(service.list("u1", Some(&filters)).await.unwrap().is_empty());

    // delete, then 404 reads as None
    service.delete(created.id()).await.unwrap();
    assert!(service.get(created.id()).await.unwrap().is_none());

    let messages: Vec<String> = toasts.toasts().into_iter().map(|t| t.message).collect();
    assert_eq!(messages, ["Todo created successfully", "Todo updated successfully", "Todo deleted successfully"]);

    auth.logout().await.unwrap();
    assert!(!auth.is_authenticated().await.unwrap());
}

#[tokio::test]
async fn acceptance_requests_without_token_carry_no_header() {
    let (base_url, _) = spawn_backend().await;
    let (_, repo) = client(&base_url);

    match repo.find_all("u1", None).await {
        Err(PersistenceError::Api { status, message }) => {
            assert_eq!(status, 401);
            assert_eq!(message, "missing token");
        }
        other => panic!("expected 401, got {other:?}"),
    }

    let toasts = ToastNotificationService::new();
    let service = TodoServiceImpl::new(Arc::new(repo), Arc::new(toasts.clone()));
    let err = service.set_completed(&TodoId::from("x"), true).await.unwrap_err();
    assert!(matches!(err, TodoError::Persistence(_)));
    assert_eq!(toasts.toasts()[0].message, "missing token");
}

#[tokio::test]
async fn acceptance_rejected_login_keeps_no_session() {
    let (base_url, _) = spawn_backend().await;
    let (auth, _) = client(&base_url);

    let err = auth.login(&LoginInput { email: "ada@example.com".into(), password: "wrong-password".into() }).await.unwrap_err();
    assert!(matches!(err, AuthError::Rejected(ref m) if m == "invalid credentials"));
    assert!(!auth.is_authenticated().await.unwrap());

    let err = auth.login(&LoginInput { email: "not-an-email".into(), password: "secret1".into() }).await.unwrap_err();
    assert!(matches!(err, AuthError::Invalid(_)));
}

fn registration(name: &str, email: &str) -> RegisterInput {
    RegisterInput { name: name.into(), email: email.into(), password: "secret1".into(), confirm_password: "secret1".into() }
}

#[tokio::test]
async fn acceptance_register_remembers_the_session() {
    let (base_url, _) = spawn_backend().await;
    let (auth, repo) = client(&base_url);

    let session = auth.register(&registration("  Grace ", "grace@example.com")).await.unwrap();
    assert_eq!(session.token, TOKEN);
    assert_eq!(session.user.id, "u2");
    assert_eq!(session.user.name, "Grace");

    assert!(auth.is_authenticated().await.unwrap());
    let user = auth.current_user().await.unwrap().unwrap();
    assert_eq!(user.name, "Grace");
    assert_eq!(user.email, "grace@example.com");

    // the stored token now authorizes todo requests
    assert!(repo.find_all("u2", None).await.unwrap().is_empty());
}

#[tokio::test]
async fn acceptance_rejected_registration_keeps_no_session() {
    let (base_url, _) = spawn_backend().await;
    let (auth, _) = client(&base_url);

    let err = auth.register(&registration("Grace", "taken@example.com")).await.unwrap_err();
    assert!(matches!(err, AuthError::Rejected(ref m) if m == "Email already registered"));
    assert!(!auth.is_authenticated().await.unwrap());
    assert_eq!(auth.current_user().await.unwrap(), None);
}

#[tokio::test]
async fn acceptance_odd_backend_answers_are_api_errors() {
    let (base_url, _) = spawn_backend().await;
    let (auth, repo) = client(&base_url);
    auth.login(&LoginInput { email: "ada@example.com".into(), password: "secret1".into() }).await.unwrap();

    match repo.delete(&TodoId::from(PLAIN_ERROR_ID)).await {
        Err(PersistenceError::Api { status, message }) => {
            assert_eq!(status, 502);
            assert_eq!(message, "An error occurred");
        }
        other => panic!("expected 502, got {other:?}"),
    }

    match repo.mark_as_completed(&TodoId::from(NO_DATA_ID)).await {
        Err(PersistenceError::Api { status, message }) => {
            assert_eq!(status, 200);
            assert_eq!(message, "response carried no data");
        }
        other => panic!("expected a missing-data error, got {other:?}"),
    }
}

#[tokio::test]
async fn acceptance_unreachable_backend_is_a_transport_error() {
    let (_, repo) = client("http://127.0.0.1:1/api/v1");
    assert!(matches!(repo.find_by_id(&TodoId::from("x")).await, Err(PersistenceError::Transport(_))));
}

// ---- proxy --------------------------------------------------------------------------------

#[tokio::test]
async fn acceptance_proxy_relays_status_and_body() {
    let (base_url, _) = spawn_backend().await;
    let app = routing::app(todos::router(todos::ProxyState::new(&base_url)));
    let auth = format!("Bearer {TOKEN}");

    let res = request(&app, "GET", "/health", None, None).await;
    assert_eq!(res.status(), 200);

    // no token forwarded, backend refuses
    let res = request(&app, "GET", "/api/todos", None, None).await;
    assert_eq!(res.status(), 401);
    assert_eq!(body(res).await["message"], "missing token");

    let payload = json!({ "title": "Buy milk", "description": null, "completed": false, "status": "pending", "priority": "low", "user_id": "u1", "due_date": null, "tags": [] });
    let res = request(&app, "POST", "/api/todos", Some(&auth), Some(payload.to_string())).await;
    assert_eq!(res.status(), 201);
    let id = body(res).await["data"]["id"].as_str().unwrap().to_string();

    let res = request(&app, "GET", "/api/todos?status=pending", Some(&auth), None).await;
    assert_eq!(res.status(), 200);
    assert_eq!(body(res).await["data"].as_array().unwrap().len(), 1);

    let res = request(&app, "PATCH", &format!("/api/todos/{id}/complete"), Some(&auth), None).await;
    assert_eq!(body(res).await["data"]["status"], "completed");

    let res = request(&app, "GET", "/api/todos?status=pending", Some(&auth), None).await;
    assert!(body(res).await["data"].as_array().unwrap().is_empty());

    let res = request(&app, "PATCH", &format!("/api/todos/{id}/incomplete"), Some(&auth), None).await;
    assert_eq!(body(res).await["data"]["completed"], false);

    let res = request(&app, "DELETE", &format!("/api/todos/{id}"), Some(&auth), None).await;
    assert_eq!(res.status(), 204);

    let res = request(&app, "GET", &format!("/api/todos/{id}"), Some(&auth), None).await;
    assert_eq!(res.status(), 404);
}

#[tokio::test]
async fn acceptance_proxy_local_failures_are_fixed_500s() {
    let (base_url, _) = spawn_backend().await;
    let app = routing::app(todos::router(todos::ProxyState::new(&base_url)));

    let res = request(&app, "POST", "/api/todos", None, Some("{not json".into())).await;
    assert_eq!(res.status(), 500);
    assert_eq!(body(res).await, json!({ "error": "Failed to create todo", "success": false }));

    let dead = routing::app(todos::router(todos::ProxyState::new("http://127.0.0.1:1/api/v1")));
    let res = request(&dead, "GET", "/api/todos", None, None).await;
    assert_eq!(res.status(), 500);
    assert_eq!(body(res).await, json!({ "error": "Failed to fetch todos", "success": false }));

    let res = request(&dead, "PATCH", "/api/todos/abc/incomplete", None, None).await;
    assert_eq!(body(res).await["error"], "Failed to mark todo as incomplete");
}

async fn body(res: hyper::Response<axum::body::Body>) -> Value {
    serde_json::from_slice(&to_bytes(res.into_body(), 1024 * 1024).await.unwrap()).unwrap()
}

async fn request(app: &Router, method: &str, path: &str, auth: Option<&str>, body: Option<String>) -> hyper::Response<axum::body::Body> {
    use axum::body::Body;
    use axum::http::{Request, Method};
    use tower::ServiceExt;

    let mut req = Request::builder().method(Method::from_bytes(method.as_bytes()).unwrap()).uri(path);
    if let Some(auth) = auth {
        req = req.header("authorization", auth);
    }
    let req = match body {
        Some(json) => req.header("content-type", "application/json").body(Body::from(json)).unwrap(),
        None => req.body(Body::empty()).unwrap(),
    };
    app.clone().oneshot(req).await.unwrap()
}

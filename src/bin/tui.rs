use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use crossterm::{event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEventKind}, execute, terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen}};
use ratatui::{backend::CrosstermBackend, Terminal, widgets::{Block, Borders, List, ListItem, Paragraph, ListState}, layout::{Layout, Constraint, Direction}, style::{Style, Modifier, Color}};
use tracing_subscriber::EnvFilter;

use todogo::{
    application::{create_todo::CreateTodoInput, patch::Patch, todo_service::{TodoService, TodoServiceImpl}, update_todo::UpdateTodoInput},
    config::{BackendKind, Config},
    domain::{notification::{NotificationLevel, NotificationService}, repository::{TodoFilters, TodoRepository}, todo::{Todo, TodoStatus}},
    infrastructure::{
        api_repository::ApiTodoRepository,
        auth_service::{AuthService, LoginInput},
        credentials::CredentialStore,
        key_value::SqliteKeyValueStore,
        local_storage::LocalStorageTodoRepository,
        notification::ToastNotificationService,
    },
};

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::from_env()?;
    // logs would tear the alternate screen, so they stay off unless asked for
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "off".into()))
        .with_writer(std::io::stderr)
        .init();

    let store = Arc::new(SqliteKeyValueStore::connect(&config.storage_url).await?);
    store.init().await?;
    let credentials = CredentialStore::new(store.clone());
    let auth = AuthService::new(&config.api_base_url, credentials.clone());

    let (repo, user_id): (Arc<dyn TodoRepository>, Option<String>) = match config.backend {
        BackendKind::Api => {
            let user = credentials.user().await?.map(|u| u.id);
            let repo: Arc<dyn TodoRepository> = Arc::new(ApiTodoRepository::new(&config.api_base_url, credentials));
            (repo, user)
        }
        BackendKind::Local => {
            let repo: Arc<dyn TodoRepository> = Arc::new(LocalStorageTodoRepository::new(store));
            (repo, Some(config.local_user_id.clone()))
        }
    };
    let toasts = ToastNotificationService::new();
    let service = TodoServiceImpl::new(repo, Arc::new(toasts.clone()));

    // Terminal setup
    enable_raw_mode()?;
    let mut stdout = std::io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let mut app = App {
        service,
        auth,
        toasts,
        backend: config.backend,
        user_id,
        items: vec![],
        selected: 0,
        list_state: ListState::default(),
        mode: Mode::View,
        filter: Filter::All,
        search: String::new(),
        field: ActiveField::First,
        draft_first: String::new(),
        draft_second: String::new(),
    };
    let res = run_app(&mut terminal, &mut app).await;

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen, DisableMouseCapture)?;
    terminal.show_cursor()?;

    res
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Mode { View, Create, Edit, Search, Login }

#[derive(Clone, Copy, PartialEq, Eq)]
enum Filter { All, Pending, Completed }

impl Filter {
    fn next(self) -> Self {
        match self { Filter::All => Filter::Pending, Filter::Pending => Filter::Completed, Filter::Completed => Filter::All }
    }

    fn label(self) -> &'static str {
        match self { Filter::All => "All", Filter::Pending => "Pending", Filter::Completed => "Completed" }
    }

    fn status(self) -> Option<TodoStatus> {
        match self { Filter::All => None, Filter::Pending => Some(TodoStatus::Pending), Filter::Completed => Some(TodoStatus::Completed) }
    }
}

/// Title/description while editing a todo, email/password while logging in.
#[derive(Clone, Copy, PartialEq, Eq)]
enum ActiveField { First, Second }

struct App<S: TodoService> {
    service: S,
    auth: AuthService,
    toasts: ToastNotificationService,
    backend: BackendKind,
    user_id: Option<String>,
    items: Vec<Todo>,
    selected: usize,
    list_state: ListState,
    mode: Mode,
    filter: Filter,
    search: String,
    field: ActiveField,
    draft_first: String,
    draft_second: String,
}

impl<S: TodoService> App<S> {
    async fn load(&mut self) {
        let Some(user_id) = self.user_id.clone() else {
            self.items.clear();
            self.clamp_selection();
            return;
        };
        let filters = TodoFilters {
            status: self.filter.status(),
            search: Some(self.search.clone()).filter(|s| !s.is_empty()),
            ..Default::default()
        };
        match self.service.list(&user_id, Some(&filters)).await {
            Ok(items) => self.items = items,
            // reads do not notify on their own
            Err(e) => self.toasts.error(&e.to_string(), Some("Could not load todos")),
        }
        self.clamp_selection();
    }

    fn clamp_selection(&mut self) {
        let len = self.items.len();
        if len == 0 { self.selected = 0; self.list_state.select(None); }
        else { if self.selected >= len { self.selected = len - 1; } self.list_state.select(Some(self.selected)); }
    }

    fn current(&self) -> Option<&Todo> { self.items.get(self.selected) }

    fn start_input(&mut self, mode: Mode, first: String, second: String) {
        self.mode = mode;
        self.field = ActiveField::First;
        self.draft_first = first;
        self.draft_second = second;
    }

    fn reset_input(&mut self) {
        self.mode = Mode::View;
        self.draft_first.clear();
        self.draft_second.clear();
    }

    fn active_draft(&mut self) -> &mut String {
        match (self.mode, self.field) {
            (Mode::Search, _) => &mut self.search,
            (_, ActiveField::First) => &mut self.draft_first,
            (_, ActiveField::Second) => &mut self.draft_second,
        }
    }

    async fn submit(&mut self) {
        match self.mode {
            Mode::Create => {
                if let Some(user_id) = self.user_id.clone() {
                    let description = Some(self.draft_second.clone()).filter(|d| !d.trim().is_empty());
                    let input = CreateTodoInput { description, ..CreateTodoInput::new(self.draft_first.clone(), user_id) };
                    // failures are already reported as toasts
                    let _ = self.service.create(input).await;
                } else {
                    self.toasts.warning("Log in first (press l)", None);
                }
            }
            Mode::Edit => {
                if let Some(todo) = self.current() {
                    let description = if self.draft_second.trim().is_empty() { Patch::Clear } else { Patch::Set(self.draft_second.trim().to_string()) };
                    let input = UpdateTodoInput { title: Some(self.draft_first.clone()), description, ..UpdateTodoInput::new(todo.id().clone()) };
                    let _ = self.service.update(input).await;
                }
            }
            Mode::Login => {
                let input = LoginInput { email: self.draft_first.trim().to_string(), password: self.draft_second.clone() };
                match self.auth.login(&input).await {
                    Ok(session) => {
                        self.toasts.success(&format!("Welcome back, {}", session.user.name), None);
                        self.user_id = Some(session.user.id);
                    }
                    Err(e) => self.toasts.error(&e.to_string(), Some("Login failed")),
                }
            }
            Mode::Search | Mode::View => {}
        }
        self.reset_input();
        self.load().await;
    }
}

async fn run_app<S: TodoService>(terminal: &mut Terminal<CrosstermBackend<std::io::Stdout>>, app: &mut App<S>) -> Result<()> {
    let tick_rate = Duration::from_millis(200);
    app.load().await;

    loop {
        let toasts = app.toasts.toasts();
        terminal.draw(|f| {
            let chunks = Layout::default()
                .direction(Direction::Vertical)
                .constraints([
                    Constraint::Length(3),
                    Constraint::Min(1),
                    Constraint::Length(3),
                    Constraint::Length(5),
                ])
                .split(f.size());

            let header = Paragraph::new("Enter: toggle, n: new, e: edit, p: priority, d: delete, f: filter, /: search, l: login, x: dismiss, q: quit")
                .block(Block::default().borders(Borders::ALL).title("todogo"));
            f.render_widget(header, chunks[0]);

            let middle = Layout::default()
                .direction(Direction::Horizontal)
                .constraints([Constraint::Percentage(60), Constraint::Percentage(40)])
                .split(chunks[1]);

            let list_items: Vec<ListItem> = app.items.iter().map(|t| {
                let mark = if t.completed() { "[x]" } else { "[ ]" };
                let overdue = if t.is_overdue() { " (overdue)" } else { "" };
                ListItem::new(format!("{} {:<6} {}{}", mark, t.priority().as_str(), t.title(), overdue))
            }).collect();
            let title = match &app.user_id {
                Some(user) => format!("todos [{}] search=\"{}\" user={}", app.filter.label(), app.search, user),
                None => "todos (not logged in)".to_string(),
            };
            let list = List::new(list_items)
                .block(Block::default().borders(Borders::ALL).title(title))
                .highlight_style(Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD | Modifier::REVERSED))
                .highlight_symbol(">> ");
            f.render_stateful_widget(list, middle[0], &mut app.list_state);

            let detail = match app.items.get(app.selected) {
                Some(t) => format!(
                    "Title:\n{}\n\nStatus: {}\nPriority: {}\nDue: {}\nTags: {}\n\nDescription:\n{}",
                    t.title(),
                    t.status().as_str(),
                    t.priority().as_str(),
                    t.due_date().map(|d| d.format("%Y-%m-%d %H:%M").to_string()).unwrap_or_else(|| "-".into()),
                    t.tags().join(", "),
                    t.description().unwrap_or("(no description)"),
                ),
                None => String::new(),
            };
            f.render_widget(Paragraph::new(detail).block(Block::default().borders(Borders::ALL).title("details")), middle[1]);

            let (input_title, input_text) = match app.mode {
                Mode::View => ("info", format!("backend={}", match app.backend { BackendKind::Api => "api", BackendKind::Local => "local" })),
                Mode::Search => ("search", format!("{}_  |  Enter to apply, Esc to cancel", app.search)),
                Mode::Create | Mode::Edit => (
                    if app.mode == Mode::Create { "create" } else { "edit" },
                    match app.field {
                        ActiveField::First => format!("Title: {}_  |  Tab to switch, Enter to save, Esc to cancel", app.draft_first),
                        ActiveField::Second => format!("Desc: {}_  |  Tab to switch, Enter to save, Esc to cancel", app.draft_second),
                    },
                ),
                Mode::Login => ("login", match app.field {
                    ActiveField::First => format!("Email: {}_  |  Tab to switch, Enter to log in, Esc to cancel", app.draft_first),
                    ActiveField::Second => format!("Password: {}_  |  Tab to switch, Enter to log in, Esc to cancel", "*".repeat(app.draft_second.chars().count())),
                }),
            };
            f.render_widget(Paragraph::new(input_text).block(Block::default().borders(Borders::ALL).title(input_title)), chunks[2]);

            let toast_lines: Vec<ListItem> = toasts.iter().rev().take(3).map(|t| {
                let color = match t.level {
                    NotificationLevel::Success => Color::Green,
                    NotificationLevel::Error => Color::Red,
                    NotificationLevel::Info => Color::Blue,
                    NotificationLevel::Warning => Color::Yellow,
                };
                let text = match &t.title { Some(title) => format!("{title}: {}", t.message), None => t.message.clone() };
                ListItem::new(text).style(Style::default().fg(color))
            }).collect();
            f.render_widget(List::new(toast_lines).block(Block::default().borders(Borders::ALL).title("notifications")), chunks[3]);
        })?;

        if !event::poll(tick_rate)? { continue; }
        let Event::Key(key) = event::read()? else { continue };
        // Only act on key presses; ignore repeats and releases to prevent duplicate input
        if key.kind != KeyEventKind::Press { continue; }

        match app.mode {
            Mode::View => match key.code {
                KeyCode::Char('q') => break,
                KeyCode::Up => { if app.selected > 0 { app.selected -= 1; app.list_state.select(Some(app.selected)); } }
                KeyCode::Down => { if app.selected + 1 < app.items.len() { app.selected += 1; app.list_state.select(Some(app.selected)); } }
                KeyCode::Enter => {
                    if let Some(todo) = app.current() {
                        let (id, completed) = (todo.id().clone(), todo.completed());
                        let _ = app.service.set_completed(&id, !completed).await;
                        app.load().await;
                    }
                }
                KeyCode::Char('p') => {
                    if let Some(todo) = app.current() {
                        let input = UpdateTodoInput { priority: Some(todo.priority().next()), ..UpdateTodoInput::new(todo.id().clone()) };
                        let _ = app.service.update(input).await;
                        app.load().await;
                    }
                }
                KeyCode::Char('n') => app.start_input(Mode::Create, String::new(), String::new()),
                KeyCode::Char('e') => {
                    if let Some(todo) = app.current() {
                        let (title, desc) = (todo.title().to_string(), todo.description().unwrap_or_default().to_string());
                        app.start_input(Mode::Edit, title, desc);
                    }
                }
                KeyCode::Char('d') => {
                    if let Some(todo) = app.current() {
                        let id = todo.id().clone();
                        let _ = app.service.delete(&id).await;
                        if app.selected > 0 { app.selected -= 1; }
                        app.load().await;
                    }
                }
                KeyCode::Char('f') => { app.filter = app.filter.next(); app.load().await; }
                KeyCode::Char('/') => { app.mode = Mode::Search; }
                KeyCode::Char('l') if app.backend == BackendKind::Api => app.start_input(Mode::Login, String::new(), String::new()),
                KeyCode::Char('x') => { if let Some(last) = app.toasts.toasts().last() { app.toasts.remove_toast(last.id); } }
                _ => {}
            },
            Mode::Search => match key.code {
                KeyCode::Esc => { app.search.clear(); app.mode = Mode::View; app.load().await; }
                KeyCode::Enter => { app.mode = Mode::View; app.load().await; }
                KeyCode::Backspace => { app.search.pop(); }
                KeyCode::Char(c) => app.search.push(c),
                _ => {}
            },
            Mode::Create | Mode::Edit | Mode::Login => match key.code {
                KeyCode::Esc => app.reset_input(),
                KeyCode::Enter => app.submit().await,
                KeyCode::Backspace => { app.active_draft().pop(); }
                KeyCode::Char(c) => app.active_draft().push(c),
                KeyCode::Tab => { app.field = match app.field { ActiveField::First => ActiveField::Second, ActiveField::Second => ActiveField::First }; }
                _ => {}
            },
        }
    }
    Ok(())
}

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, Weak};
use std::time::Duration;

use tokio::runtime::Handle;
use tokio::task::JoinHandle;

use crate::domain::notification::{NotificationLevel, NotificationService};

pub const DEFAULT_EXPIRY: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ToastId(pub u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Toast {
    pub id: ToastId,
    pub level: NotificationLevel,
    pub message: String,
    pub title: Option<String>,
}

type Listener = Arc<dyn Fn(&[Toast]) + Send + Sync>;

#[derive(Default)]
struct State {
    toasts: Vec<Toast>,
    timers: HashMap<ToastId, JoinHandle<()>>,
    listeners: Vec<(SubscriptionId, Listener)>,
}

struct Inner {
    state: Mutex<State>,
    next_id: AtomicU64,
    expiry: Duration,
}

impl Inner {
    // a listener that panicked must not take the notification channel down with it
    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn remove(&self, id: ToastId) {
        let (snapshot, listeners) = {
            let mut state = self.lock();
            if let Some(timer) = state.timers.remove(&id) {
                timer.abort();
            }
            state.toasts.retain(|t| t.id != id);
            (state.toasts.clone(), listeners_of(&state))
        };
        broadcast(&listeners, &snapshot);
    }
}

fn listeners_of(state: &State) -> Vec<Listener> {
    state.listeners.iter().map(|(_, l)| l.clone()).collect()
}

// listeners run outside the lock so they may call back into the service
fn broadcast(listeners: &[Listener], snapshot: &[Toast]) {
    for listener in listeners {
        listener(snapshot);
    }
}

/// Ordered buffer of active toasts. Each toast expires after a fixed delay unless removed
/// first; subscribers see the full list after every change.
///
/// Clones share the same buffer.
#[derive(Clone)]
pub struct ToastNotificationService {
    inner: Arc<Inner>,
}

impl Default for ToastNotificationService {
    fn default() -> Self { Self::new() }
}

impl ToastNotificationService {
    pub fn new() -> Self { Self::with_expiry(DEFAULT_EXPIRY) }

    pub fn with_expiry(expiry: Duration) -> Self {
        Self {
            inner: Arc::new(Inner { state: Mutex::new(State::default()), next_id: AtomicU64::new(1), expiry }),
        }
    }

    pub fn subscribe<F>(&self, listener: F) -> SubscriptionId
    where
        F: Fn(&[Toast]) + Send + Sync + 'static,
    {
        let id = SubscriptionId(self.inner.next_id.fetch_add(1, Ordering::Relaxed));
        self.inner.lock().listeners.push((id, Arc::new(listener)));
        id
    }

    pub fn unsubscribe(&self, id: SubscriptionId) {
        self.inner.lock().listeners.retain(|(sid, _)| *sid != id);
    }

    pub fn toasts(&self) -> Vec<Toast> { self.inner.lock().toasts.clone() }

    pub fn remove_toast(&self, id: ToastId) { self.inner.remove(id) }

    fn add_toast(&self, level: NotificationLevel, message: &str, title: Option<&str>) -> ToastId {
        let id = ToastId(self.inner.next_id.fetch_add(1, Ordering::Relaxed));
        let toast = Toast { id, level, message: message.to_string(), title: title.map(str::to_string) };

        let (snapshot, listeners) = {
            let mut state = self.inner.lock();
            state.toasts.push(toast);
            // spawned under the lock so the timer cannot fire before it is registered
            if let Some(timer) = self.schedule_expiry(id) {
                state.timers.insert(id, timer);
            }
            (state.toasts.clone(), listeners_of(&state))
        };
        broadcast(&listeners, &snapshot);
        id
    }

    /// Without a runtime the toast simply stays until removed by hand.
    fn schedule_expiry(&self, id: ToastId) -> Option<JoinHandle<()>> {
        let handle = Handle::try_current().ok()?;
        let inner: Weak<Inner> = Arc::downgrade(&self.inner);
        let delay = self.inner.expiry;
        Some(handle.spawn(async move {
            tokio::time::sleep(delay).await;
            if let Some(inner) = inner.upgrade() {
                // detach our own handle first so remove() does not abort the running task
                let _ = inner.lock().timers.remove(&id);
                inner.remove(id);
            }
        }))
    }
}

impl NotificationService for ToastNotificationService {
    fn notify(&self, level: NotificationLevel, message: &str, title: Option<&str>) {
        tracing::debug!(?level, %message, "notification");
        self.add_toast(level, message, title);
    }
}

//! Transient toast queue.
//!
//! Entries are kept in enqueue order. Each toast with a positive duration
//! gets its own expiry task keyed by id; dismissing or clearing cancels the
//! task. The queue is never persisted.

use chrono::Utc;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::time::Duration;

use tokio::task::AbortHandle;

use crate::app::domain::notification::{Notification, NotificationId, NotificationKind};
use crate::app::infrastructure::error::{AppError, Result};
use crate::app::infrastructure::store::{Store, SubscriptionId};

struct Inner {
    store: Store<Vec<Notification>>,
    timers: Mutex<HashMap<NotificationId, AbortHandle>>,
    default_duration: Duration,
}

impl Inner {
    fn timers(&self) -> MutexGuard<'_, HashMap<NotificationId, AbortHandle>> {
        self.timers.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn remove(&self, id: NotificationId) -> bool {
        self.store.update_if(|queue| {
            let before = queue.len();
            queue.retain(|n| n.id != id);
            queue.len() != before
        })
    }
}

/// Handle to the toast queue. Clones share the queue and its timers.
#[derive(Clone)]
pub struct NotificationStore {
    inner: Arc<Inner>,
}

impl NotificationStore {
    /// `default_duration` applies when a toast is enqueued without one.
    pub fn new(default_duration: Duration) -> Self {
        Self {
            inner: Arc::new(Inner {
                store: Store::new(Vec::new()),
                timers: Mutex::new(HashMap::new()),
                default_duration,
            }),
        }
    }

    /// Current queue, oldest first.
    pub fn snapshot(&self) -> Vec<Notification> {
        self.inner.store.get_state()
    }

    pub fn get(&self, id: NotificationId) -> Option<Notification> {
        self.inner
            .store
            .read(|queue| queue.iter().find(|n| n.id == id).cloned())
    }

    pub fn len(&self) -> usize {
        self.inner.store.read(Vec::len)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn subscribe<F>(&self, listener: F) -> SubscriptionId
    where
        F: Fn(&Vec<Notification>) + Send + Sync + 'static,
    {
        self.inner.store.subscribe(listener)
    }

    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.inner.store.unsubscribe(id)
    }

    /// Append a toast. `duration` of `None` uses the store default; zero
    /// keeps the toast until dismissed.
    pub fn enqueue(
        &self,
        kind: NotificationKind,
        title: impl Into<String>,
        message: Option<String>,
        duration: Option<Duration>,
    ) -> Result<NotificationId> {
        let title = title.into();
        if title.trim().is_empty() {
            return Err(AppError::Validation("Notification title is required".to_string()));
        }

        let notification = Notification {
            id: NotificationId::new(),
            kind,
            title,
            message,
            duration: duration.unwrap_or(self.inner.default_duration),
            created_at: Utc::now(),
        };
        let id = notification.id;
        let lifetime = notification.duration;

        self.inner.store.update(|queue| queue.push(notification));
        tracing::debug!(%id, %kind, "Notification enqueued");

        if !lifetime.is_zero() {
            self.schedule_expiry(id, lifetime);
        }
        Ok(id)
    }

    pub fn success(
        &self,
        title: impl Into<String>,
        message: Option<String>,
    ) -> Result<NotificationId> {
        self.enqueue(NotificationKind::Success, title, message, None)
    }

    pub fn error(
        &self,
        title: impl Into<String>,
        message: Option<String>,
    ) -> Result<NotificationId> {
        self.enqueue(NotificationKind::Error, title, message, None)
    }

    pub fn warning(
        &self,
        title: impl Into<String>,
        message: Option<String>,
    ) -> Result<NotificationId> {
        self.enqueue(NotificationKind::Warning, title, message, None)
    }

    pub fn info(
        &self,
        title: impl Into<String>,
        message: Option<String>,
    ) -> Result<NotificationId> {
        self.enqueue(NotificationKind::Info, title, message, None)
    }

    /// Remove a toast early. Returns false if it was already gone.
    pub fn dismiss(&self, id: NotificationId) -> bool {
        if let Some(timer) = self.inner.timers().remove(&id) {
            timer.abort();
        }
        self.inner.remove(id)
    }

    pub fn clear_all(&self) {
        let timers: Vec<AbortHandle> = self.inner.timers().drain().map(|(_, t)| t).collect();
        for timer in timers {
            timer.abort();
        }
        self.inner.store.update(Vec::clear);
    }

    /// Number of expiry tasks still waiting to fire.
    pub fn pending_timers(&self) -> usize {
        self.inner.timers().len()
    }

    fn schedule_expiry(&self, id: NotificationId, lifetime: Duration) {
        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            tracing::warn!(%id, "No async runtime; notification will not expire");
            return;
        };

        let weak: Weak<Inner> = Arc::downgrade(&self.inner);
        // Registered under the lock: the task must not see a missing entry.
        let mut timers = self.inner.timers();
        let task = runtime.spawn(async move {
            tokio::time::sleep(lifetime).await;
            if let Some(inner) = weak.upgrade() {
                inner.timers().remove(&id);
                if inner.remove(id) {
                    tracing::debug!(%id, "Notification expired");
                }
            }
        });
        timers.insert(id, task.abort_handle());
    }
}

impl Drop for Inner {
    fn drop(&mut self) {
        let timers = self.timers.get_mut().unwrap_or_else(PoisonError::into_inner);
        for (_, timer) in timers.drain() {
            timer.abort();
        }
    }
}

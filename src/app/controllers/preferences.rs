//! Theme and sidebar layout preferences.
//!
//! The store resolves the theme against the OS signal and reflects the
//! result on the presentation root. It is the only writer of that root.
//! Construction hydrates `theme-storage`, applies the resolved mode right
//! away and, when a tokio runtime is available, starts listening for OS
//! preference changes until [`PreferenceStore::shutdown`] or drop.

use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex, PoisonError, Weak};

use tokio::task::AbortHandle;

use crate::app::domain::theme::{ResolvedTheme, Theme};
use crate::app::infrastructure::platform::SystemThemeSignal;
use crate::app::infrastructure::presentation::PresentationRoot;
use crate::app::infrastructure::storage::{KeyValueStorage, load_persisted, save_persisted};
use crate::app::infrastructure::store::{Store, SubscriptionId};

pub const THEME_STORAGE_KEY: &str = "theme-storage";

/// Snapshot of the layout preferences handed to subscribers.
///
/// `resolved` always equals `theme` resolved against
/// `system_prefers_dark`.
#[derive(Debug, Clone, PartialEq)]
pub struct PreferenceState {
    pub theme: Theme,
    pub sidebar_collapsed: bool,
    pub sidebar_mobile_open: bool,
    /// Last OS preference the store has seen.
    pub system_prefers_dark: bool,
    /// Mode currently applied to the presentation root.
    pub resolved: ResolvedTheme,
}

#[derive(Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PersistedPreferences {
    #[serde(default)]
    theme: Theme,
    #[serde(default)]
    sidebar_collapsed: bool,
}

struct Inner {
    store: Store<PreferenceState>,
    storage: Arc<dyn KeyValueStorage>,
    root: Box<dyn PresentationRoot>,
    system: SystemThemeSignal,
    listener: Mutex<Option<AbortHandle>>,
}

/// Handle to the theme and sidebar preferences.
///
/// Clones share one state and one OS listener. The listener stops with
/// [`PreferenceStore::shutdown`] or when the last clone is dropped.
#[derive(Clone)]
pub struct PreferenceStore {
    inner: Arc<Inner>,
}

impl PreferenceStore {
    pub fn new(
        storage: Arc<dyn KeyValueStorage>,
        root: Box<dyn PresentationRoot>,
        system: SystemThemeSignal,
    ) -> Self {
        let persisted: PersistedPreferences = load_persisted(storage.as_ref(), THEME_STORAGE_KEY);
        let system_prefers_dark = system.prefers_dark();
        let resolved = persisted.theme.resolve(system_prefers_dark);

        // Applied before anyone can observe the store
        root.apply_mode(resolved);
        tracing::debug!(theme = %persisted.theme, %resolved, "Preferences hydrated");

        let inner = Arc::new(Inner {
            store: Store::new(PreferenceState {
                theme: persisted.theme,
                sidebar_collapsed: persisted.sidebar_collapsed,
                sidebar_mobile_open: false,
                system_prefers_dark,
                resolved,
            }),
            storage,
            root,
            system,
            listener: Mutex::new(None),
        });

        let store = Self { inner };
        store.listen_for_system_changes();
        store
    }

    pub fn get_state(&self) -> PreferenceState {
        self.inner.store.get_state()
    }

    pub fn theme(&self) -> Theme {
        self.inner.store.read(|s| s.theme)
    }

    pub fn resolved_theme(&self) -> ResolvedTheme {
        self.inner.store.read(|s| s.resolved)
    }

    /// What the presentation root currently shows.
    pub fn presentation_mode(&self) -> Option<ResolvedTheme> {
        self.inner.root.applied_mode()
    }

    pub fn subscribe<F>(&self, listener: F) -> SubscriptionId
    where
        F: Fn(&PreferenceState) + Send + Sync + 'static,
    {
        self.inner.store.subscribe(listener)
    }

    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.inner.store.unsubscribe(id)
    }

    pub fn set_theme(&self, theme: Theme) {
        self.change_theme(|_| theme);
    }

    /// Dark becomes light, anything else becomes dark.
    pub fn toggle_theme(&self) {
        self.change_theme(Theme::toggled);
    }

    pub fn toggle_sidebar_collapsed(&self) {
        self.inner
            .store
            .update(|s| s.sidebar_collapsed = !s.sidebar_collapsed);
        self.persist();
    }

    /// Mobile drawer state. Never persisted.
    pub fn set_sidebar_mobile_open(&self, open: bool) {
        self.inner.store.update(|s| s.sidebar_mobile_open = open);
    }

    /// React to an OS preference change. Explicit themes ignore it.
    pub fn handle_system_change(&self, prefers_dark: bool) {
        self.inner.on_system_change(prefers_dark);
    }

    /// Stop listening for OS preference changes.
    pub fn shutdown(&self) {
        let handle = self
            .inner
            .listener
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(handle) = handle {
            handle.abort();
            tracing::debug!("System theme listener stopped");
        }
    }

    pub fn is_listening(&self) -> bool {
        self.inner
            .listener
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }

    fn listen_for_system_changes(&self) {
        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            tracing::debug!("No async runtime; system theme changes must be fed manually");
            return;
        };

        let weak: Weak<Inner> = Arc::downgrade(&self.inner);
        let mut signal = self.inner.system.clone();
        let task = runtime.spawn(async move {
            while let Some(prefers_dark) = signal.changed().await {
                let Some(inner) = weak.upgrade() else {
                    break;
                };
                inner.on_system_change(prefers_dark);
            }
        });

        *self
            .inner
            .listener
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = Some(task.abort_handle());
    }

    fn change_theme(&self, next: impl FnOnce(Theme) -> Theme) {
        // Root and state change together under the store lock
        let (theme, resolved) = self.inner.store.update(|s| {
            s.theme = next(s.theme);
            s.resolved = s.theme.resolve(s.system_prefers_dark);
            self.inner.root.apply_mode(s.resolved);
            (s.theme, s.resolved)
        });
        tracing::debug!(%theme, %resolved, "Theme changed");
        self.persist();
    }

    fn persist(&self) {
        let record = self.inner.store.read(|s| PersistedPreferences {
            theme: s.theme,
            sidebar_collapsed: s.sidebar_collapsed,
        });
        if let Err(e) = save_persisted(self.inner.storage.as_ref(), THEME_STORAGE_KEY, &record) {
            tracing::warn!("Failed to save {THEME_STORAGE_KEY}: {e}");
        }
    }
}

impl Inner {
    /// Record the OS preference; only a `system` theme re-resolves.
    fn on_system_change(&self, prefers_dark: bool) {
        let resolved = ResolvedTheme::from_dark(prefers_dark);
        let followed = self.store.update_if(|s| {
            s.system_prefers_dark = prefers_dark;
            if s.theme != Theme::System || s.resolved == resolved {
                return false;
            }
            s.resolved = resolved;
            self.root.apply_mode(resolved);
            true
        });
        if followed {
            tracing::debug!(%resolved, "Followed system theme change");
        }
    }
}

impl Drop for Inner {
    fn drop(&mut self) {
        if let Some(handle) = self
            .listener
            .get_mut()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
        {
            handle.abort();
        }
    }
}

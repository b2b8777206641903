//! Who is signed in.
//!
//! `SessionStore` is the single source of truth for the authenticated user.
//! The signed-in flag is derived from the user's presence, so the two can
//! never disagree. `{user, isAuthenticated}` is written to `auth-storage`
//! after every change to the user and read back on construction.

use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::app::domain::user::{ProfileUpdate, User};
use crate::app::infrastructure::error::{AppError, AuthError, Result};
use crate::app::infrastructure::storage::{KeyValueStorage, load_persisted, save_persisted};
use crate::app::infrastructure::store::{Store, SubscriptionId};
use crate::app::services::auth::{Authenticator, Credentials, Registration};

pub const AUTH_STORAGE_KEY: &str = "auth-storage";

/// Snapshot handed to subscribers.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SessionState {
    user: Option<User>,
    in_flight: u32,
    epoch: u64,
}

impl SessionState {
    pub fn user(&self) -> Option<&User> {
        self.user.as_ref()
    }

    pub fn is_authenticated(&self) -> bool {
        self.user.is_some()
    }

    pub fn is_loading(&self) -> bool {
        self.in_flight > 0
    }
}

#[derive(Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PersistedSession {
    #[serde(default)]
    user: Option<User>,
    #[serde(default)]
    is_authenticated: bool,
}

/// Handle to the signed-in session.
///
/// Clones share one state; every mutation notifies subscribers with the
/// new [`SessionState`].
#[derive(Clone)]
pub struct SessionStore {
    store: Store<SessionState>,
    storage: Arc<dyn KeyValueStorage>,
    authenticator: Arc<dyn Authenticator>,
}

impl SessionStore {
    /// Build the store, hydrating the user from `auth-storage`.
    pub fn new(storage: Arc<dyn KeyValueStorage>, authenticator: Arc<dyn Authenticator>) -> Self {
        let persisted: PersistedSession = load_persisted(storage.as_ref(), AUTH_STORAGE_KEY);
        if persisted.is_authenticated != persisted.user.is_some() {
            tracing::warn!("Inconsistent {AUTH_STORAGE_KEY} record, trusting the stored user");
        }
        tracing::debug!(authenticated = persisted.user.is_some(), "Session hydrated");

        Self {
            store: Store::new(SessionState {
                user: persisted.user,
                ..Default::default()
            }),
            storage,
            authenticator,
        }
    }

    pub fn get_state(&self) -> SessionState {
        self.store.get_state()
    }

    pub fn user(&self) -> Option<User> {
        self.store.read(|s| s.user.clone())
    }

    pub fn is_authenticated(&self) -> bool {
        self.store.read(SessionState::is_authenticated)
    }

    pub fn is_loading(&self) -> bool {
        self.store.read(SessionState::is_loading)
    }

    pub fn subscribe<F>(&self, listener: F) -> SubscriptionId
    where
        F: Fn(&SessionState) + Send + Sync + 'static,
    {
        self.store.subscribe(listener)
    }

    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.store.unsubscribe(id)
    }

    pub async fn login(&self, email: &str, password: &str) -> Result<()> {
        let credentials = Credentials {
            email: email.to_string(),
            password: password.to_string(),
        };
        self.exchange("login", self.authenticator.login(&credentials)).await
    }

    pub async fn register(&self, name: &str, email: &str, password: &str) -> Result<()> {
        let registration = Registration {
            name: name.to_string(),
            email: email.to_string(),
            password: password.to_string(),
        };
        self.exchange("register", self.authenticator.register(&registration))
            .await
    }

    /// Sign out. Any login still in flight will not restore the session.
    pub fn logout(&self) {
        let was_authenticated = self.store.update(|s| {
            s.epoch += 1;
            s.user.take().is_some()
        });
        tracing::debug!(was_authenticated, "Logged out");
        self.persist();
    }

    /// Merge `update` into the signed-in user.
    pub fn update_profile(&self, update: ProfileUpdate) -> Result<()> {
        update.validate()?;
        let applied = self.store.update_if(|s| match s.user.as_mut() {
            Some(user) => {
                user.apply(update);
                true
            }
            None => false,
        });
        if !applied {
            return Err(AppError::NotAuthenticated);
        }
        self.persist();
        Ok(())
    }

    async fn exchange<F>(&self, operation: &'static str, request: F) -> Result<()>
    where
        F: std::future::Future<Output = Result<User>>,
    {
        let (in_flight, epoch) = InFlight::begin(&self.store);
        tracing::debug!(operation, "Authentication started");

        let outcome = request.await;

        let accepted = in_flight.settle(|s| match &outcome {
            Ok(user) if s.epoch == epoch => {
                s.user = Some(user.clone());
                true
            }
            _ => false,
        });

        match outcome {
            Ok(user) if accepted => {
                tracing::info!(operation, email = %user.email, "Signed in");
                self.persist();
                Ok(())
            }
            Ok(user) => {
                tracing::warn!(
                    operation,
                    email = %user.email,
                    "Discarding sign-in that finished after logout"
                );
                Err(AuthError::Superseded.into())
            }
            Err(e) => {
                tracing::debug!(operation, "Authentication failed: {e}");
                Err(e)
            }
        }
    }

    fn persist(&self) {
        let record = self.store.read(|s| PersistedSession {
            user: s.user.clone(),
            is_authenticated: s.user.is_some(),
        });
        if let Err(e) = save_persisted(self.storage.as_ref(), AUTH_STORAGE_KEY, &record) {
            tracing::warn!("Failed to save {AUTH_STORAGE_KEY}: {e}");
        }
    }
}

/// One pending login or register.
///
/// The in-flight count goes back down when the exchange settles or, if the
/// caller drops the future first, when the guard is dropped.
struct InFlight {
    store: Store<SessionState>,
    armed: bool,
}

impl InFlight {
    fn begin(store: &Store<SessionState>) -> (Self, u64) {
        let epoch = store.update(|s| {
            s.in_flight += 1;
            s.epoch
        });
        let guard = Self {
            store: store.clone(),
            armed: true,
        };
        (guard, epoch)
    }

    /// Leave the in-flight set and apply `f` in the same mutation.
    fn settle<R>(mut self, f: impl FnOnce(&mut SessionState) -> R) -> R {
        self.armed = false;
        self.store.update(|s| {
            s.in_flight = s.in_flight.saturating_sub(1);
            f(s)
        })
    }
}

impl Drop for InFlight {
    fn drop(&mut self) {
        if self.armed {
            self.store
                .update(|s| s.in_flight = s.in_flight.saturating_sub(1));
            tracing::debug!("Authentication abandoned before it settled");
        }
    }
}

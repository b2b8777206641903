use std::sync::Arc;

use super::controllers::notifications::NotificationStore;
use super::controllers::preferences::PreferenceStore;
use super::controllers::session::SessionStore;
use super::domain::settings::StateSettings;
use super::infrastructure::error::Result;
use super::infrastructure::platform::SystemThemeSignal;
use super::infrastructure::presentation::PresentationRoot;
use super::infrastructure::storage::KeyValueStorage;
use super::services::auth::{Authenticator, MockAuthenticator};

/// The three application stores, built once and handed to every consumer.
///
/// Cloning is cheap; all clones share the same stores.
#[derive(Clone)]
pub struct AppContext {
    pub session: SessionStore,
    pub preferences: PreferenceStore,
    pub notifications: NotificationStore,
}

impl AppContext {
    pub fn new(
        settings: &StateSettings,
        storage: Arc<dyn KeyValueStorage>,
        authenticator: Arc<dyn Authenticator>,
        root: Box<dyn PresentationRoot>,
        system: SystemThemeSignal,
    ) -> Self {
        Self {
            session: SessionStore::new(Arc::clone(&storage), authenticator),
            preferences: PreferenceStore::new(storage, root, system),
            notifications: NotificationStore::new(settings.toast_duration()),
        }
    }

    /// Context backed by the demo authentication service.
    pub fn with_demo_backend(
        settings: &StateSettings,
        storage: Arc<dyn KeyValueStorage>,
        root: Box<dyn PresentationRoot>,
        system: SystemThemeSignal,
    ) -> Self {
        let authenticator = Arc::new(MockAuthenticator::new(settings.auth_latency()));
        Self::new(settings, storage, authenticator, root, system)
    }

    /// Sign in and report the outcome as a toast.
    pub async fn login_with_feedback(&self, email: &str, password: &str) -> Result<()> {
        match self.session.login(email, password).await {
            Ok(()) => {
                self.notify_success("Welcome back!", "You have successfully logged in.");
                Ok(())
            }
            Err(e) => {
                tracing::info!("Login failed: {e}");
                self.notify_error("Login failed", "Please check your credentials and try again.");
                Err(e)
            }
        }
    }

    /// Create an account and report the outcome as a toast.
    pub async fn register_with_feedback(
        &self,
        name: &str,
        email: &str,
        password: &str,
    ) -> Result<()> {
        match self.session.register(name, email, password).await {
            Ok(()) => {
                self.notify_success("Account created!", "Welcome to AdminX Dashboard.");
                Ok(())
            }
            Err(e) => {
                tracing::info!("Registration failed: {e}");
                self.notify_error("Registration failed", "Please try again later.");
                Err(e)
            }
        }
    }

    /// Stop background work: the OS theme listener and pending toast timers.
    pub fn shutdown(&self) {
        self.preferences.shutdown();
        self.notifications.clear_all();
    }

    fn notify_success(&self, title: &str, message: &str) {
        if let Err(e) = self.notifications.success(title, Some(message.to_string())) {
            tracing::debug!("Could not enqueue notification: {e}");
        }
    }

    fn notify_error(&self, title: &str, message: &str) {
        if let Err(e) = self.notifications.error(title, Some(message.to_string())) {
            tracing::debug!("Could not enqueue notification: {e}");
        }
    }
}

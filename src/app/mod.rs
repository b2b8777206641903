//! Application state layer, organized by Clean Architecture principles.
//!
//! # Structure
//!
//! - `domain/` - Core data structures (User, Theme, Notification, Settings)
//! - `controllers/` - The stores (session, preferences, notifications)
//! - `services/` - Business operations (authentication exchange)
//! - `infrastructure/` - Store container, storage, OS signal, presentation root, errors
//! - `state.rs` - `AppContext`, the bundle handed to consumers

pub mod controllers;
pub mod domain;
pub mod infrastructure;
pub mod services;
pub mod state;

// Re-exports for convenient external access
pub use controllers::notifications::NotificationStore;
pub use controllers::preferences::{PreferenceState, PreferenceStore, THEME_STORAGE_KEY};
pub use controllers::session::{AUTH_STORAGE_KEY, SessionState, SessionStore};
pub use domain::{
    Notification, NotificationId, NotificationKind, ProfileUpdate, ResolvedTheme, Role,
    StateSettings, Theme, User,
};
pub use infrastructure::error::{AppError, AuthError, Result};
pub use infrastructure::platform::{
    SystemThemeFeed, SystemThemeMonitor, SystemThemeSignal, detect_system_dark_mode,
    system_theme_channel,
};
pub use infrastructure::presentation::{DocumentRoot, PresentationRoot};
pub use infrastructure::storage::{FileStorage, KeyValueStorage, MemoryStorage};
pub use infrastructure::store::{Store, SubscriptionId};
pub use services::auth::{Authenticator, Credentials, MockAuthenticator, Registration};
pub use state::AppContext;

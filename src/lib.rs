//! # adminx-state
//!
//! UI state layer of the AdminX admin dashboard: three independent stores
//! that every view reads from and writes through.
//!
//! - [`SessionStore`] - who is signed in; persisted to `auth-storage`
//! - [`PreferenceStore`] - theme and sidebar layout; persisted to
//!   `theme-storage`, reflected on the [`PresentationRoot`], follows the OS
//!   dark-mode signal while the theme is `system`
//! - [`NotificationStore`] - the toast queue, with per-toast expiry timers
//!
//! Stores are explicit handles, not globals. Build them together with
//! [`AppContext`] or one by one, and pass clones to consumers.

pub mod app;

pub use app::{
    AUTH_STORAGE_KEY, AppContext, AppError, AuthError, Authenticator, Credentials, DocumentRoot,
    FileStorage, KeyValueStorage, MemoryStorage, MockAuthenticator, Notification, NotificationId,
    NotificationKind, NotificationStore, PreferenceState, PreferenceStore, PresentationRoot,
    ProfileUpdate, Registration, ResolvedTheme, Result, Role, SessionState, SessionStore,
    StateSettings, Store, SubscriptionId, SystemThemeFeed, SystemThemeMonitor, SystemThemeSignal,
    THEME_STORAGE_KEY, Theme, User, detect_system_dark_mode, system_theme_channel,
};

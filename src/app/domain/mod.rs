//! Domain layer - core data structures and types.
//!
//! This module contains the fundamental domain models:
//! - The signed-in user and profile edits
//! - Theme preference and resolved mode
//! - Toast notifications
//! - State layer settings

pub mod notification;
pub mod settings;
pub mod theme;
pub mod user;

pub use notification::{Notification, NotificationId, NotificationKind};
pub use settings::StateSettings;
pub use theme::{ResolvedTheme, Theme};
pub use user::{ProfileUpdate, Role, User};

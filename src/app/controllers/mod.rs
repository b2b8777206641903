//! Controllers layer - the application stores.
//!
//! Each store owns one slice of UI state, notifies subscribers after every
//! mutation and persists what needs to survive a restart:
//! - Session (who is signed in)
//! - Preferences (theme and sidebar layout)
//! - Notifications (toast queue)

pub mod notifications;
pub mod preferences;
pub mod session;

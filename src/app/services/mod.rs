//! Services layer - business operations.
//!
//! - Authentication exchange (trait plus the demo backend)

pub mod auth;

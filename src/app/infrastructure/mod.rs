//! Infrastructure layer - external integrations and utilities.
//!
//! This module contains code that interfaces with external systems:
//! - The generic subscribable store container
//! - Key/value persistence
//! - OS theme detection
//! - The presentation root
//! - Error types

pub mod error;
pub mod platform;
pub mod presentation;
pub mod storage;
pub mod store;

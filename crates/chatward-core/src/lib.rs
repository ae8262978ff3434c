//! chatward Core
//!
//! Core types, traits, and utilities shared across chatward components.
//!
//! This crate provides:
//! - The actor context handed to the rule engine by its collaborators
//! - Rule categories and the event kinds that can be evaluated
//! - Error types and result handling
//! - Color-code helpers (`&`-codes and section-sign codes) and placeholder expansion

pub mod error;
pub mod text;
pub mod types;

pub use error::{Error, Result};
pub use text::{colorize, strip_colors, Placeholders};
pub use types::{Actor, Category, EventKind, GameMode, Location};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::error::{Error, Result};
    pub use crate::text::{colorize, strip_colors, Placeholders};
    pub use crate::types::{Actor, Category, EventKind, GameMode, Location};
}

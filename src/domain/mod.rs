//! Domain module containing core data types
//!
//! This module defines the daily metric record, the user profile, goals,
//! insight and achievement records and the chat history, together with their
//! validation rules.

pub mod achievement;
pub mod chat;
pub mod goal;
pub mod insight;
pub mod metric;
pub mod profile;
pub mod types;

// Re-export public types for easy access
pub use achievement::*;
pub use chat::*;
pub use goal::*;
pub use insight::*;
pub use metric::*;
pub use profile::*;
pub use types::*;

use thiserror::Error;

/// Errors that can occur during domain operations
#[derive(Error, Debug)]
pub enum DomainError {
    #[error("Validation error: {message}")]
    Validation { message: String },

    #[error("Invalid date: {0}")]
    InvalidDate(String),

    #[error("Invalid value: {message}")]
    InvalidValue { message: String },
}

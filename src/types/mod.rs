//! Shared types

pub mod error;

pub use error::{JournalError, Result};

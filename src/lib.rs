//! Pib Journal - backend for a single-author journal
//!
//! One admin logs in for a 12 hour JWT and writes entries. Each entry is
//! stored as its own blob in a remote file store; a single index blob
//! lists them all and is re-uploaded on every write.
//!
//! ## Endpoints
//!
//! - `POST /api/login` - admin credentials for a token
//! - `GET /api/entries` - public listing of index records
//! - `POST /api/entries` - create an entry (Bearer token)

pub mod auth;
pub mod config;
pub mod journal;
pub mod routes;
pub mod server;
pub mod storage;
pub mod types;

pub use config::Args;
pub use server::{run, AppState};
pub use types::{JournalError, Result};

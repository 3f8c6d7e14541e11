//! Core library for Voteboard.
//!
//! This crate provides the domain models, the SQLite-backed vote ledger,
//! and the GitHub issue sync engine, independent of any transport layer.
//!
//! # Usage
//!
//! ```no_run
//! use voteboard_core::db::Database;
//! use voteboard_core::models::*;
//!
//! let db = Database::open_default()?;
//! db.migrate()?;
//!
//! let projects = db.list_projects(true)?;
//! # Ok::<(), voteboard_core::Error>(())
//! ```

pub mod db;
pub mod error;
pub mod models;
pub mod slug;
pub mod sync;

// Re-export commonly used types at crate root
pub use db::Database;
pub use error::{Error, Result};

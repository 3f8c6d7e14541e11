//! Voteboard: a feature-request voting platform.
//!
//! The HTTP boundary lives here; models, the vote ledger, and the
//! GitHub sync engine live in `voteboard-core`.

pub mod api;

pub use api::{create_router, AppState};

//! SQLite game-store demos: schema changes, dummy data, grouping and
//! aggregation, transaction rollback, and an additive migration.
//!
//! # Intention
//!
//! - Provide a small, safe wrapper over one SQLite connection so demo code
//!   never touches engine handles directly.
//! - Keep each demo flow a short, readable script over that wrapper.
//!
//! # Architectural Boundaries
//!
//! - SQL parsing, planning, storage and durability all belong to SQLite.
//! - No concurrency: one synchronous connection for the process lifetime.

pub mod demos;
pub mod dummy;
pub mod sqlite;

pub use sqlite::{DbError, GameStoreDb, Row, Value};

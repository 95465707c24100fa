//! Durable checksum records (SQLite via sqlx).
//!
//! One row per object key holding the last audited size, timestamp, and
//! digest. Writes are upserts keyed by object key, so concurrent workers on
//! distinct keys never conflict.

pub mod db;
mod objects;
pub mod types;

pub use db::*;
pub use types::*;

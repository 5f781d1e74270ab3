//! SQLite backend for the counter engine.
//!
//! The schema lives in `migrations/` and is embedded into the binary; run it with [`SqliteDatabase::migrate`].
mod sqlite_impl;

pub mod db;
pub use sqlite_impl::SqliteDatabase;

//! # UpTask Shared Library
//!
//! Domain types, persistence and authorization used by the UpTask API
//! server.
//!
//! ## Module Organization
//!
//! - `models`: records and their SQL
//! - `store`: the data-access trait with PostgreSQL and in-memory backends
//! - `cascade`: transactional project and task removal
//! - `auth`: bearer token validation and permission checks
//! - `db`: connection pool and migrations

pub mod auth;
pub mod cascade;
pub mod db;
pub mod models;
pub mod store;

/// Current version of the UpTask shared library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

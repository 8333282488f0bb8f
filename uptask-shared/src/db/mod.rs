/// PostgreSQL plumbing: connection pool and schema migrations
///
/// Models live in [`crate::models`]; handlers reach them through
/// [`crate::store`].

pub mod migrations;
pub mod pool;

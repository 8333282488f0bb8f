/// Middleware for the API server
///
/// - `resource`: extractors that load and authorize the project, task and
///   note named in the path
/// - `security`: hardening headers on every response

pub mod resource;
pub mod security;

//! # UpTask API Server Library
//!
//! HTTP layer of the UpTask project manager: routing, authentication,
//! request validation and error mapping over a [`uptask_shared::store::Store`].
//!
//! ## Modules
//!
//! - `app`: Application state and router builder
//! - `config`: Configuration from the environment
//! - `error`: Error handling and HTTP response mapping
//! - `middleware`: Resource extractors and security headers
//! - `routes`: API route handlers
//! - `validation`: Validated JSON bodies and field rules

pub mod app;
pub mod config;
pub mod error;
pub mod middleware;
pub mod routes;
pub mod validation;

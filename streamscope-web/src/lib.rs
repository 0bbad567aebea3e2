//! JSON API server for Streamscope
//!
//! Exposes the catalog operations over HTTP with axum. Request validation
//! happens in the handlers; every error renders as a JSON body with the
//! matching status code.

#![warn(missing_docs)]

pub mod handlers;
pub mod server;

pub use handlers::ApiError;
pub use server::{AppState, ServerError, build_router, run_server};

//! Integration tests for Streamscope
//!
//! These tests drive the catalog service and the HTTP router together with
//! scripted providers, checking caching, coalescing and failure isolation
//! across crate boundaries.

#[path = "integration/support.rs"]
mod support;

#[path = "integration/catalog_caching.rs"]
mod catalog_caching;
#[path = "integration/demo_catalog.rs"]
mod demo_catalog;
#[path = "integration/http_api.rs"]
mod http_api;
#[path = "integration/partial_failure.rs"]
mod partial_failure;

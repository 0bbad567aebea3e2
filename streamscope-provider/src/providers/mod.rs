//! `CatalogProvider` implementations.

pub mod demo;
pub mod streaming_availability;

pub use demo::DemoProvider;
pub use streaming_availability::StreamingAvailabilityClient;

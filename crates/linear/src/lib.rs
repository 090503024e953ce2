//! Linear GraphQL data source for roadmap slides.

pub mod client;
pub mod queries;
pub mod wire;

pub use client::{HttpTransport, LinearClient, Transport, LINEAR_API_URL};

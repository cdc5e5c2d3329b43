//! Arkalia sync - Progression sources
//!
//! Endpoint shapes and response decoding are always available; the HTTP
//! client requires the `http` feature.

mod envelope;
#[cfg(feature = "http")]
mod http;

pub use envelope::*;
#[cfg(feature = "http")]
pub use http::*;

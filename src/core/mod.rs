//! Arkalia sync - Core
//!
//! Traits, default constants and error types shared by every layer.

pub mod constants;
mod error;
mod traits;

pub use error::*;
pub use traits::*;

//! Arkalia sync - Progression model
//!
//! Implements:
//! - The progression snapshot mirrored from the backend
//! - Structural diffing with per-category deltas
//! - Optimistic local updates

mod delta;
mod diff;
mod snapshot;

pub use delta::*;
pub use diff::*;
pub use snapshot::*;

//! Arkalia sync - Player profile
//!
//! Implements:
//! - Rule-based profile inference from interaction counts, play time and
//!   observed behaviors
//! - An interaction tracker persisted through client storage

mod classify;
mod tracker;

pub use classify::*;
pub use tracker::*;

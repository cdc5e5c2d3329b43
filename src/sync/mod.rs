//! Arkalia sync - Sync layer
//!
//! Implements:
//! - The progression sync agent (periodic polling, in-flight guard)
//! - Typed progression events and callback registries
//! - Linear retry backoff and terminal recovery

mod agent;
mod events;
mod retry;
mod state;

pub use agent::*;
pub use events::{
    EventCallback, EventHandle, ProgressionEvent, SubscriptionHandle, UpdateCallback,
    UpdateHandle,
};
pub use retry::*;
pub use state::AgentStatus;

//! Outbound HTTP dispatch and the replay service.

pub mod dispatch;
pub mod service;

pub use dispatch::{DispatchError, DispatchResponse, Dispatcher};
pub use service::{ReplayError, ReplayOutcome, ReplayOverrides, ReplayRequest, ReplayService};

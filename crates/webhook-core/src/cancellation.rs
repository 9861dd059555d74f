//! Cross-cutting cancellation error used by every long-running
//! operation in the workspace.

use thiserror::Error;

/// Returned when an operation observes a cancelled
/// [`tokio_util::sync::CancellationToken`] at one of its I/O
/// boundaries.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
#[error("operation cancelled")]
pub struct Cancelled;

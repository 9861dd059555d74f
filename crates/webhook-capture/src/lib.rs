//! Capture record storage, provider detection, and the localhost HTTP
//! capture server.

pub mod detect;
pub mod record;
pub mod server;
pub mod store;

pub use detect::{Detection, DetectionContext, DetectorRegistry, ProviderDetector};
pub use record::{CaptureFile, CaptureMeta, CaptureRecord};
pub use server::{build_router, run_server, CaptureServerState};
pub use store::{CaptureStore, CaptureStoreError};

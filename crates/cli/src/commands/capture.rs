//! `capture`: runs the localhost capture server until Ctrl-C.

use std::net::SocketAddr;
use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use webhook_capture::CaptureServerState;

use crate::context::AppContext;
use crate::errors::CliError;
use crate::output;

/// The capture server never accepts a body larger than this.
const MAX_CAPTURE_BODY_BYTES: usize = 10 * 1024 * 1024;

/// How long in-flight handlers get to finish after a shutdown signal
/// before the process exits anyway.
const SHUTDOWN_GRACE: std::time::Duration = std::time::Duration::from_secs(5);

pub async fn run(ctx: &AppContext, host: String, port: u16) -> Result<(), CliError> {
    let addr: SocketAddr = format!("{host}:{port}")
        .parse()
        .map_err(|err| CliError::Other(anyhow::anyhow!("invalid host/port: {err}")))?;

    let cancel = CancellationToken::new();
    let state = Arc::new(CaptureServerState {
        store: ctx.capture_store(),
        detectors: ctx.detector_registry(),
        cancel: cancel.clone(),
    });

    output::info_line(&format!(
        "capturing on http://{addr} — writing to {}",
        state.store.root().display()
    ));

    let server = tokio::spawn(async move {
        webhook_capture::run_server(state, addr, MAX_CAPTURE_BODY_BYTES).await
    });

    if tokio::signal::ctrl_c().await.is_ok() {
        output::info_line("shutting down...");
    }
    cancel.cancel();

    match tokio::time::timeout(SHUTDOWN_GRACE, server).await {
        Ok(Ok(Ok(()))) => Ok(()),
        Ok(Ok(Err(err))) => Err(CliError::Other(anyhow::anyhow!(err))),
        Ok(Err(err)) => Err(CliError::Other(anyhow::anyhow!(err))),
        Err(_) => Err(CliError::Other(anyhow::anyhow!(
            "capture server did not shut down within the grace period"
        ))),
    }
}

//! Development server with live reload.
//!
//! ```text
//! build -> ServerSlot::start -> watch loop (rebuild -> reload) -> Ctrl+C -> stop
//! ```

mod content;
mod lifecycle;
mod response;
mod route;

use lifecycle::ServerSlot;

use crate::cli::build::build_site;
use crate::config::cfg;
use crate::core::register_shutdown;
use crate::{log, watch};
use anyhow::{Result, anyhow};
use crossbeam::channel;
use std::sync::Arc;
use std::thread;

/// Serve the current env's serve directory until Ctrl+C.
///
/// The initial build must succeed; later rebuilds only report failures.
pub fn serve_site() -> Result<()> {
    let config = cfg();
    build_site(&config)?;

    let slot = Arc::new(ServerSlot::new());
    let url = slot.start(&config.serve, &config.layout().serve_dir())?;
    log!("serve"; "{url}");

    let (shutdown_tx, shutdown_rx) = channel::bounded::<()>(1);
    register_shutdown(shutdown_tx);

    let watcher = if config.serve.watch {
        let (stop_tx, stop_rx) = channel::bounded::<()>(1);
        let slot = Arc::clone(&slot);
        let handle = thread::Builder::new().name("watch".into()).spawn(move || {
            watch::run(&stop_rx, |config| build_site(config).map(drop), || slot.reload())
        })?;
        Some((stop_tx, handle))
    } else {
        None
    };

    let _ = shutdown_rx.recv();
    if let Some((stop_tx, handle)) = watcher {
        let _ = stop_tx.send(());
        handle
            .join()
            .map_err(|_| anyhow!("watch loop panicked"))??;
    }
    slot.stop();
    Ok(())
}

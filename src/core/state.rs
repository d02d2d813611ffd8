//! Process-wide shutdown state.
//!
//! Ctrl+C sets `SHUTDOWN` and, once a long-running task (serve) has
//! registered a channel, notifies it so it can stop its server handle.
//! Before registration the process exits right away.

use crossbeam::channel::Sender;
use std::sync::OnceLock;
use std::sync::atomic::{AtomicBool, Ordering};

/// Shutdown has been requested (Ctrl+C received)
static SHUTDOWN: AtomicBool = AtomicBool::new(false);

static SHUTDOWN_TX: OnceLock<Sender<()>> = OnceLock::new();

/// Install the global Ctrl+C handler. Call once at program start.
pub fn setup_shutdown_handler() -> anyhow::Result<()> {
    ctrlc::set_handler(|| {
        SHUTDOWN.store(true, Ordering::SeqCst);
        match SHUTDOWN_TX.get() {
            Some(tx) => {
                crate::log!("serve"; "shutting down...");
                let _ = tx.send(());
            }
            None => std::process::exit(130),
        }
    })
    .map_err(|e| anyhow::anyhow!("failed to set Ctrl+C handler: {e}"))
}

/// Route Ctrl+C to `tx` instead of exiting. First registration wins.
pub fn register_shutdown(tx: Sender<()>) {
    let _ = SHUTDOWN_TX.set(tx);
}

pub fn is_shutdown() -> bool {
    SHUTDOWN.load(Ordering::Relaxed)
}

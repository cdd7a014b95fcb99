//! Ctrl+C handling for the launch batch.
//!
//! The launcher checks the receiver between environments, so an interrupt
//! lets the running launch finish and skips the ones still queued.

use tokio::sync::watch;

/// Set up a shutdown channel triggered by Ctrl+C.
///
/// Returns the sender (for the signal handler) and a receiver for the caller.
/// Children in inherit mode receive the same interrupt from the terminal.
pub fn setup_shutdown() -> anyhow::Result<(watch::Sender<()>, watch::Receiver<()>)> {
    let (tx, rx) = watch::channel(());
    let shutdown_tx = tx.clone();
    ctrlc::set_handler(move || {
        log::info!("Received Ctrl+C, finishing the current step...");
        let _ = shutdown_tx.send(());
    })?;
    Ok((tx, rx))
}

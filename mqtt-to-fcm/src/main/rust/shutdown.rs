use std::future::Future;

use tokio::sync::watch;

/// Flip `tx` once `signal` fires.
///
/// A signal that cannot be installed leaves `tx` untouched, so the bridge
/// keeps running without Ctrl+C support.
pub async fn forward_signal<S>(signal: S, tx: &watch::Sender<bool>)
where
    S: Future<Output = std::io::Result<()>>,
{
    match signal.await {
        Ok(()) => {
            tracing::info!("Received shutdown signal");
            let _ = tx.send(true);
        }
        Err(e) => {
            tracing::error!("Failed to listen for shutdown signal: {}", e);
        }
    }
}

/// Resolves once shutdown is requested or every sender is gone
pub async fn wait_for_shutdown(mut rx: watch::Receiver<bool>) {
    let _ = rx.wait_for(|stopped| *stopped).await;
}

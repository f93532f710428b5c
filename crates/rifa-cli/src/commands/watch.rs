use tokio::sync::watch;

use crate::commands::common::{open_service, open_store};
use crate::config::AppContext;
use crate::error::CliError;

/// Run the background loops of a long-lived session until Ctrl-C
pub async fn run_watch(ctx: &AppContext) -> Result<(), CliError> {
    let service = open_service(ctx, open_store(ctx)?)?;

    if let Some(count) = service.initial_load().await {
        println!("Loaded {count} sales from the remote sheet");
    }

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let mut handles = vec![service.spawn_sync_loop(ctx.config.sync_interval(), shutdown_rx.clone())];
    for subscription in service.subscribe() {
        handles.push(service.spawn_listener(subscription, shutdown_rx.clone()));
    }

    println!("Watching for sales; press Ctrl-C to stop");
    tokio::signal::ctrl_c().await?;

    // Receivers may already be gone if every task stopped.
    let _ = shutdown_tx.send(true);
    for handle in handles {
        if let Err(error) = handle.await {
            tracing::warn!("Background task ended abnormally: {error}");
        }
    }
    service.wait_for_sync().await;
    Ok(())
}

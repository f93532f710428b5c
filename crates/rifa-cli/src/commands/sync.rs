use crate::commands::common::{format_duplicate_lines, open_service, open_store};
use crate::config::AppContext;
use crate::error::CliError;

pub async fn run_sync(ctx: &AppContext) -> Result<(), CliError> {
    if !ctx.config.is_sync_enabled() {
        return Err(CliError::SyncNotConfigured);
    }

    let service = open_service(ctx, open_store(ctx)?)?;
    let report = service.sync_pending().await?;

    if report.attempted == 0 {
        println!("Nothing to sync");
    } else {
        println!("Synced {} of {} sales", report.synced, report.attempted);
    }
    if report.failed > 0 {
        println!("{} sales are still pending and will be retried", report.failed);
    }
    if let Some(at) = service.last_sync().await? {
        println!("Last successful sync: {}", at.to_rfc3339());
    }
    Ok(())
}

pub async fn run_sync_conflicts(ctx: &AppContext, as_json: bool) -> Result<(), CliError> {
    let service = open_service(ctx, open_store(ctx)?)?;
    let duplicates = service.duplicates().await;

    if as_json {
        println!("{}", serde_json::to_string_pretty(&duplicates)?);
        return Ok(());
    }

    if duplicates.is_empty() {
        println!("No duplicate tickets found.");
        return Ok(());
    }

    for line in format_duplicate_lines(&duplicates) {
        println!("{line}");
    }
    Ok(())
}

pub async fn run_pull(ctx: &AppContext) -> Result<(), CliError> {
    if ctx.config.remote_sheet_url.is_none() {
        return Err(CliError::SheetNotConfigured);
    }

    let service = open_service(ctx, open_store(ctx)?)?;
    let count = service.load_remote().await?.unwrap_or_default();
    println!("Merged {count} sales from the remote sheet");
    Ok(())
}

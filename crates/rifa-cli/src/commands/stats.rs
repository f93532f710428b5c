use crate::commands::common::{format_stats_lines, open_service, open_store};
use crate::config::AppContext;
use crate::error::CliError;

pub async fn run_stats(ctx: &AppContext, as_json: bool) -> Result<(), CliError> {
    let service = open_service(ctx, open_store(ctx)?)?;
    let stats = service.stats().await;

    if as_json {
        println!("{}", serde_json::to_string_pretty(&stats)?);
    } else {
        for line in format_stats_lines(&stats) {
            println!("{line}");
        }
    }

    Ok(())
}

use crate::commands::common::{format_sale_lines, open_service, open_store};
use crate::config::AppContext;
use crate::error::CliError;

pub async fn run_list(ctx: &AppContext, group: Option<&str>, as_json: bool) -> Result<(), CliError> {
    let service = open_service(ctx, open_store(ctx)?)?;
    let sales = match group.map(str::trim) {
        Some(group) => service.sales_in_group(group).await,
        None => service.sales().await,
    };

    if as_json {
        println!("{}", serde_json::to_string_pretty(&sales)?);
    } else if sales.is_empty() {
        println!("No sales recorded.");
    } else {
        for line in format_sale_lines(&sales) {
            println!("{line}");
        }
    }

    Ok(())
}

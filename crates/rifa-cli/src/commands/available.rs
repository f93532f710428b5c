use crate::commands::common::{format_number_ranges, open_service, open_store};
use crate::config::AppContext;
use crate::error::CliError;

pub async fn run_available(ctx: &AppContext, group: &str, as_json: bool) -> Result<(), CliError> {
    let service = open_service(ctx, open_store(ctx)?)?;
    let numbers = service.available_numbers(group.trim()).await;

    if as_json {
        println!("{}", serde_json::to_string(&numbers)?);
    } else if numbers.is_empty() {
        println!("No numbers left in {}", group.trim());
    } else {
        println!("{} free: {}", numbers.len(), format_number_ranges(&numbers));
    }

    Ok(())
}

use rifa_core::BuyerInfo;

use crate::commands::common::{open_service, open_store};
use crate::config::AppContext;
use crate::error::CliError;

pub async fn run_reserve(
    ctx: &AppContext,
    group: &str,
    number: u32,
    name: Option<String>,
    phone: Option<String>,
) -> Result<(), CliError> {
    let service = open_service(ctx, open_store(ctx)?)?;
    let sale = service
        .reserve(group, number, BuyerInfo::new(name, phone))
        .await?;
    service.wait_for_sync().await;

    println!("{}", sale.id);
    Ok(())
}

use rifa_core::{BuyerInfo, ManualSale};

use crate::commands::common::{open_service, open_store, parse_status, require_admin};
use crate::config::AppContext;
use crate::error::CliError;

pub async fn run_add(
    ctx: &AppContext,
    group: &str,
    number: u32,
    name: Option<String>,
    phone: Option<String>,
    status: Option<&str>,
) -> Result<(), CliError> {
    let status = status.map(parse_status).transpose()?;
    let store = open_store(ctx)?;
    require_admin(&store)?;

    let service = open_service(ctx, store)?;
    let sale = service
        .add_manual(ManualSale {
            group: group.to_string(),
            number,
            buyer: BuyerInfo::new(name, phone),
            status,
        })
        .await?;
    service.wait_for_sync().await;

    println!("{}", sale.id);
    Ok(())
}

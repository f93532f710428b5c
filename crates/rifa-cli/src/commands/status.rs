use crate::commands::common::{
    normalize_sale_id, open_service, open_store, parse_status, require_admin,
};
use crate::config::AppContext;
use crate::error::CliError;

pub async fn run_status(ctx: &AppContext, id: &str, status: &str) -> Result<(), CliError> {
    let id = normalize_sale_id(id)?;
    let status = parse_status(status)?;
    let store = open_store(ctx)?;
    require_admin(&store)?;

    let service = open_service(ctx, store)?;
    let sale = match service.update_status(&id, status).await {
        Err(rifa_core::Error::NotFound(_)) => return Err(CliError::SaleNotFound(id.to_string())),
        other => other?,
    };
    service.wait_for_sync().await;

    println!("{} {}", sale.id, sale.status);
    Ok(())
}

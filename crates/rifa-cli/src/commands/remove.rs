use crate::commands::common::{normalize_sale_id, open_service, open_store, require_admin};
use crate::config::AppContext;
use crate::error::CliError;

pub async fn run_remove(ctx: &AppContext, id: &str) -> Result<(), CliError> {
    let id = normalize_sale_id(id)?;
    let store = open_store(ctx)?;
    require_admin(&store)?;

    let service = open_service(ctx, store)?;
    if !service.remove(&id).await? {
        return Err(CliError::SaleNotFound(id.to_string()));
    }

    println!("{id}");
    Ok(())
}

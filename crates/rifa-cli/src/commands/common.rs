use std::sync::Arc;

use rifa_core::db::SqliteStore;
use rifa_core::events::{Notifier, StoreBus};
use rifa_core::models::{format_brl, DuplicateTicket, SaleStats};
use rifa_core::sync::HttpRemote;
use rifa_core::{AdminSession, Ledger, RaffleService, Sale, SaleId, SaleStatus};

use crate::config::AppContext;
use crate::error::CliError;

/// Service type every command runs against
pub type CliService = RaffleService<SqliteStore, HttpRemote>;

pub fn open_store(ctx: &AppContext) -> Result<Arc<SqliteStore>, CliError> {
    Ok(Arc::new(SqliteStore::open(&ctx.db_path)?))
}

/// Open the ledger over `store`, announcing sales through the store itself
pub fn open_service(ctx: &AppContext, store: Arc<SqliteStore>) -> Result<CliService, CliError> {
    let ledger = Ledger::open(store.clone(), ctx.config.rules())?;
    let remote = HttpRemote::from_config(&ctx.config)?;
    let notifier =
        Notifier::new().with_bus(Arc::new(StoreBus::new(store, ctx.config.poll_interval())));
    Ok(RaffleService::new(ledger, Arc::new(remote), notifier))
}

/// Fail unless `rifa admin login` opened a session on this store
pub fn require_admin(store: &Arc<SqliteStore>) -> Result<(), CliError> {
    AdminSession::new(store.clone()).require()?;
    Ok(())
}

pub fn normalize_sale_id(value: &str) -> Result<SaleId, CliError> {
    let value = value.trim();
    if value.is_empty() {
        Err(CliError::EmptySaleId)
    } else {
        Ok(SaleId::from(value))
    }
}

pub fn parse_status(value: &str) -> Result<SaleStatus, CliError> {
    value.parse::<SaleStatus>().map_err(CliError::InvalidStatus)
}

pub fn format_sale_lines(sales: &[Sale]) -> Vec<String> {
    sales
        .iter()
        .map(|sale| {
            let mut line = format!(
                "{}  {} #{:<4} {:<9}",
                sale.id, sale.group, sale.number, sale.status
            );
            if let Some(name) = &sale.buyer_name {
                line.push_str("  ");
                line.push_str(name);
            }
            if let Some(phone) = &sale.buyer_phone {
                line.push_str(&format!(" ({phone})"));
            }
            if !sale.synced {
                line.push_str("  [pending sync]");
            }
            line
        })
        .collect()
}

/// Compact ranges, e.g. `1-3, 5, 8-10`
pub fn format_number_ranges(numbers: &[u32]) -> String {
    let mut parts = Vec::new();
    let mut iter = numbers.iter().copied().peekable();

    while let Some(start) = iter.next() {
        let mut end = start;
        while iter.peek() == Some(&(end + 1)) {
            end += 1;
            iter.next();
        }
        if start == end {
            parts.push(start.to_string());
        } else {
            parts.push(format!("{start}-{end}"));
        }
    }

    parts.join(", ")
}

pub fn format_stats_lines(stats: &SaleStats) -> Vec<String> {
    let mut lines = vec![
        format!("Sold:       {}", stats.total),
        format!("Reserved:   {}", stats.reserved),
        format!("Paid:       {}", stats.paid),
        format!("Cancelled:  {}", stats.cancelled),
        format!("Collected:  {}", format_brl(stats.collected_cents)),
    ];

    for (group, counts) in &stats.by_group {
        lines.push(format!(
            "  {group}: {} sold ({} paid, {} reserved, {} cancelled)",
            counts.sold(),
            counts.paid,
            counts.reserved,
            counts.cancelled
        ));
    }
    lines
}

pub fn format_duplicate_lines(duplicates: &[DuplicateTicket]) -> Vec<String> {
    duplicates
        .iter()
        .map(|duplicate| {
            let ids = duplicate
                .ids
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join(", ");
            format!("{} #{}: {ids}", duplicate.group, duplicate.number)
        })
        .collect()
}

//! Data models for Rifa

mod sale;
mod stats;

pub use sale::{BuyerInfo, ManualSale, Sale, SaleId, SaleStatus};
pub use stats::{format_brl, DuplicateTicket, GroupStats, SaleStats};

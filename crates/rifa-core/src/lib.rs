//! rifa-core - Core library for Rifa
//!
//! This crate contains the sale models, the local ledger and its durable
//! store, cross-context notification, and remote sync used by every Rifa
//! interface.

pub mod admin;
pub mod config;
pub mod db;
pub mod error;
pub mod events;
pub mod export;
pub mod ledger;
pub mod models;
pub mod services;
pub mod sync;
pub mod util;

pub use admin::AdminSession;
pub use config::{PayloadFormat, RaffleConfig, RaffleRules};
pub use error::{Error, Result};
pub use ledger::Ledger;
pub use models::{BuyerInfo, ManualSale, Sale, SaleId, SaleStats, SaleStatus};
pub use services::RaffleService;

//! Aggregates over the sale ledger

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::{Sale, SaleId, SaleStatus};

/// Per-group status counts
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupStats {
    #[serde(rename = "reservados")]
    pub reserved: usize,
    #[serde(rename = "pagos")]
    pub paid: usize,
    #[serde(rename = "cancelados")]
    pub cancelled: usize,
}

impl GroupStats {
    /// Tickets currently held (reserved or paid)
    #[must_use]
    pub const fn sold(&self) -> usize {
        self.reserved + self.paid
    }

    fn record(&mut self, status: SaleStatus) {
        match status {
            SaleStatus::Reserved => self.reserved += 1,
            SaleStatus::Paid => self.paid += 1,
            SaleStatus::Cancelled => self.cancelled += 1,
        }
    }
}

/// Ledger-wide sale statistics
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaleStats {
    /// Records that hold a ticket (cancelled excluded)
    pub total: usize,
    #[serde(rename = "reservados")]
    pub reserved: usize,
    #[serde(rename = "pagos")]
    pub paid: usize,
    #[serde(rename = "cancelados")]
    pub cancelled: usize,
    /// Paid tickets times the unit price, in cents
    #[serde(rename = "arrecadado")]
    pub collected_cents: u64,
    #[serde(rename = "por_turma")]
    pub by_group: BTreeMap<String, GroupStats>,
}

impl SaleStats {
    /// Aggregate `sales` using `unit_price_cents` for the collected total
    #[must_use]
    pub fn collect(sales: &[Sale], unit_price_cents: u64) -> Self {
        let mut stats = Self::default();
        let mut overall = GroupStats::default();

        for sale in sales {
            overall.record(sale.status);
            stats
                .by_group
                .entry(sale.group.clone())
                .or_default()
                .record(sale.status);
        }

        stats.total = overall.sold();
        stats.reserved = overall.reserved;
        stats.paid = overall.paid;
        stats.cancelled = overall.cancelled;
        stats.collected_cents = u64::try_from(overall.paid)
            .unwrap_or(u64::MAX)
            .saturating_mul(unit_price_cents);
        stats
    }
}

/// A ticket held by more than one non-cancelled sale
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DuplicateTicket {
    #[serde(rename = "turma")]
    pub group: String,
    #[serde(rename = "numero")]
    pub number: u32,
    pub ids: Vec<SaleId>,
}

/// Format cents as `R$ 12,50`
#[must_use]
pub fn format_brl(cents: u64) -> String {
    format!("R$ {},{:02}", cents / 100, cents % 100)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::BuyerInfo;
    use pretty_assertions::assert_eq;

    fn sale(group: &str, number: u32, status: SaleStatus) -> Sale {
        Sale::new(group, number, BuyerInfo::default(), status)
    }

    #[test]
    fn collect_counts_by_group_and_status() {
        let sales = vec![
            sale("3A", 1, SaleStatus::Paid),
            sale("3A", 2, SaleStatus::Reserved),
            sale("3B", 1, SaleStatus::Paid),
            sale("3B", 2, SaleStatus::Cancelled),
        ];

        let stats = SaleStats::collect(&sales, 500);
        assert_eq!(stats.total, 3);
        assert_eq!(stats.paid, 2);
        assert_eq!(stats.reserved, 1);
        assert_eq!(stats.cancelled, 1);
        assert_eq!(stats.collected_cents, 1000);
        assert_eq!(
            stats.by_group.get("3B").copied(),
            Some(GroupStats {
                reserved: 0,
                paid: 1,
                cancelled: 1,
            })
        );
    }

    #[test]
    fn collect_on_empty_ledger_is_zero() {
        assert_eq!(SaleStats::collect(&[], 500), SaleStats::default());
    }

    #[test]
    fn format_brl_pads_cents() {
        assert_eq!(format_brl(1005), "R$ 10,05");
        assert_eq!(format_brl(0), "R$ 0,00");
    }
}

//! Sale model

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::util::normalize_text_option;

/// Identifier of a sale, derived from group, ticket number and creation time
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SaleId(String);

impl SaleId {
    /// Derive the identifier for a sale created at `created_at`
    #[must_use]
    pub fn derive(group: &str, number: u32, created_at: DateTime<Utc>) -> Self {
        Self(format!(
            "{group}-{number}-{}",
            created_at.timestamp_millis()
        ))
    }

    /// Get the string representation of this ID
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SaleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(&self.0)
    }
}

impl From<&str> for SaleId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for SaleId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// Lifecycle state of a sale
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SaleStatus {
    #[serde(rename = "reservado")]
    Reserved,
    #[serde(rename = "pago")]
    Paid,
    #[serde(rename = "cancelado")]
    Cancelled,
}

impl SaleStatus {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Reserved => "reservado",
            Self::Paid => "pago",
            Self::Cancelled => "cancelado",
        }
    }

    /// Whether a sale in this state holds its ticket number
    #[must_use]
    pub const fn holds_ticket(self) -> bool {
        !matches!(self, Self::Cancelled)
    }
}

impl fmt::Display for SaleStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl FromStr for SaleStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "reservado" | "reserved" => Ok(Self::Reserved),
            "pago" | "paid" => Ok(Self::Paid),
            "cancelado" | "cancelled" | "canceled" => Ok(Self::Cancelled),
            other => Err(format!("unknown sale status '{other}'")),
        }
    }
}

/// Optional buyer contact details
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BuyerInfo {
    pub name: Option<String>,
    pub phone: Option<String>,
}

impl BuyerInfo {
    /// Build buyer info, dropping blank values
    #[must_use]
    pub fn new(name: Option<String>, phone: Option<String>) -> Self {
        Self {
            name: normalize_text_option(name),
            phone: normalize_text_option(phone),
        }
    }
}

/// Input for the admin manual-entry path
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManualSale {
    pub group: String,
    pub number: u32,
    pub buyer: BuyerInfo,
    /// Defaults to [`SaleStatus::Paid`] when absent
    pub status: Option<SaleStatus>,
}

fn is_false(value: &bool) -> bool {
    !*value
}

/// One reservation or purchase of a ticket number within a group
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sale {
    pub id: SaleId,
    #[serde(rename = "turma")]
    pub group: String,
    #[serde(rename = "numero")]
    pub number: u32,
    #[serde(rename = "nome", default, skip_serializing_if = "Option::is_none")]
    pub buyer_name: Option<String>,
    #[serde(rename = "telefone", default, skip_serializing_if = "Option::is_none")]
    pub buyer_phone: Option<String>,
    pub status: SaleStatus,
    /// Creation time, stored as RFC 3339
    #[serde(rename = "data")]
    pub created_at: DateTime<Utc>,
    /// Set once the remote endpoint accepted the current state
    #[serde(rename = "sincronizado", default)]
    pub synced: bool,
    /// Entered through the admin manual path
    #[serde(default, skip_serializing_if = "is_false")]
    pub manual: bool,
    /// Imported from the remote sheet
    #[serde(rename = "origem", default, skip_serializing_if = "is_false")]
    pub from_remote: bool,
}

impl Sale {
    /// Create a new unsynced sale stamped with the current time
    #[must_use]
    pub fn new(group: impl Into<String>, number: u32, buyer: BuyerInfo, status: SaleStatus) -> Self {
        Self::new_at(group, number, buyer, status, Utc::now())
    }

    /// Create a new unsynced sale with an explicit creation time
    #[must_use]
    pub fn new_at(
        group: impl Into<String>,
        number: u32,
        buyer: BuyerInfo,
        status: SaleStatus,
        created_at: DateTime<Utc>,
    ) -> Self {
        let group = group.into();
        Self {
            id: SaleId::derive(&group, number, created_at),
            group,
            number,
            buyer_name: buyer.name,
            buyer_phone: buyer.phone,
            status,
            created_at,
            synced: false,
            manual: false,
            from_remote: false,
        }
    }

    /// Whether this sale currently holds its ticket number
    #[must_use]
    pub const fn is_active(&self) -> bool {
        self.status.holds_ticket()
    }

    /// Whether this sale is for ticket `number` in `group`
    #[must_use]
    pub fn same_ticket(&self, group: &str, number: u32) -> bool {
        self.group == group && self.number == number
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use pretty_assertions::assert_eq;

    #[test]
    fn sale_id_combines_group_number_and_time() {
        let at = Utc.timestamp_millis_opt(1_700_000_000_123).unwrap();
        assert_eq!(SaleId::derive("3A", 7, at).as_str(), "3A-7-1700000000123");
    }

    #[test]
    fn sale_new_starts_unsynced() {
        let sale = Sale::new("3A", 7, BuyerInfo::default(), SaleStatus::Reserved);
        assert!(!sale.synced);
        assert!(!sale.manual);
        assert!(!sale.from_remote);
        assert!(sale.id.as_str().starts_with("3A-7-"));
    }

    #[test]
    fn status_parses_portuguese_and_english() {
        assert_eq!("pago".parse::<SaleStatus>().unwrap(), SaleStatus::Paid);
        assert_eq!("Cancelled".parse::<SaleStatus>().unwrap(), SaleStatus::Cancelled);
        assert_eq!(" reservado ".parse::<SaleStatus>().unwrap(), SaleStatus::Reserved);
        assert!("vendido".parse::<SaleStatus>().is_err());
    }

    #[test]
    fn buyer_info_drops_blank_fields() {
        let buyer = BuyerInfo::new(Some("  Ana ".to_string()), Some("   ".to_string()));
        assert_eq!(buyer.name.as_deref(), Some("Ana"));
        assert_eq!(buyer.phone, None);
    }

    #[test]
    fn sale_serializes_with_storage_field_names() {
        let at = Utc.timestamp_millis_opt(0).unwrap();
        let buyer = BuyerInfo::new(Some("Ana".to_string()), None);
        let sale = Sale::new_at("3A", 7, buyer, SaleStatus::Reserved, at);

        let value = serde_json::to_value(&sale).unwrap();
        assert_eq!(
            value,
            serde_json::json!({
                "id": "3A-7-0",
                "turma": "3A",
                "numero": 7,
                "nome": "Ana",
                "status": "reservado",
                "data": "1970-01-01T00:00:00Z",
                "sincronizado": false
            })
        );
    }

    #[test]
    fn sale_deserializes_without_optional_flags() {
        let raw = r#"{"id":"3B-12-5","turma":"3B","numero":12,"status":"pago","data":"2024-05-01T10:00:00Z"}"#;
        let sale: Sale = serde_json::from_str(raw).unwrap();
        assert_eq!(sale.status, SaleStatus::Paid);
        assert!(!sale.synced);
        assert!(!sale.manual);
        assert!(!sale.from_remote);
        assert_eq!(sale.buyer_name, None);
    }
}

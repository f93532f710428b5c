//! Runtime configuration for the ledger and its remote sync.
//!
//! Business constants (ticket ceiling, unit price) and remote endpoints are
//! deployment-time values. A missing remote endpoint disables sync without
//! being an error.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::util::{is_http_url, normalize_text_option};

const DEFAULT_MAX_TICKET: u32 = 300;
const DEFAULT_UNIT_PRICE_CENTS: u64 = 1000;
const DEFAULT_SYNC_INTERVAL_SECS: u64 = 300;
const DEFAULT_POLL_INTERVAL_MS: u64 = 1000;
const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 15;

/// Business rules applied by the ledger
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RaffleRules {
    /// Highest ticket number; valid numbers are `1..=max_ticket`
    pub max_ticket: u32,
    pub unit_price_cents: u64,
}

impl Default for RaffleRules {
    fn default() -> Self {
        Self {
            max_ticket: DEFAULT_MAX_TICKET,
            unit_price_cents: DEFAULT_UNIT_PRICE_CENTS,
        }
    }
}

impl RaffleRules {
    /// Whether `number` is a valid ticket number
    #[must_use]
    pub const fn contains(&self, number: u32) -> bool {
        number >= 1 && number <= self.max_ticket
    }
}

/// Body encoding used when pushing a sale to the remote endpoint
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PayloadFormat {
    #[default]
    Json,
    Form,
}

/// Deployment configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RaffleConfig {
    pub max_ticket: u32,
    pub unit_price_cents: u64,
    pub sync_interval_secs: u64,
    pub poll_interval_ms: u64,
    pub http_timeout_secs: u64,
    pub admin_password: Option<String>,
    /// Write endpoint receiving one sale per POST
    pub remote_endpoint_url: Option<String>,
    /// Bulk read URL returning the sheet as CSV
    pub remote_sheet_url: Option<String>,
    pub payload_format: PayloadFormat,
}

impl Default for RaffleConfig {
    fn default() -> Self {
        Self {
            max_ticket: DEFAULT_MAX_TICKET,
            unit_price_cents: DEFAULT_UNIT_PRICE_CENTS,
            sync_interval_secs: DEFAULT_SYNC_INTERVAL_SECS,
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
            http_timeout_secs: DEFAULT_HTTP_TIMEOUT_SECS,
            admin_password: None,
            remote_endpoint_url: None,
            remote_sheet_url: None,
            payload_format: PayloadFormat::default(),
        }
    }
}

impl RaffleConfig {
    /// Parse a config document from JSON and validate it.
    pub fn from_json(raw: &str) -> Result<Self, String> {
        let config = serde_json::from_str::<Self>(raw)
            .map_err(|error| format!("invalid config JSON: {error}"))?;
        config.normalized()
    }

    /// Trim optional values and check invariants.
    pub fn normalized(mut self) -> Result<Self, String> {
        self.admin_password = normalize_text_option(self.admin_password);
        self.remote_endpoint_url = normalize_optional_http_url(
            self.remote_endpoint_url,
            "remote_endpoint_url",
        )?;
        self.remote_sheet_url =
            normalize_optional_http_url(self.remote_sheet_url, "remote_sheet_url")?;

        if self.max_ticket == 0 {
            return Err("max_ticket must be at least 1".to_string());
        }
        if self.sync_interval_secs == 0 {
            return Err("sync_interval_secs must be at least 1".to_string());
        }
        if self.poll_interval_ms == 0 {
            return Err("poll_interval_ms must be at least 1".to_string());
        }
        if self.http_timeout_secs == 0 {
            return Err("http_timeout_secs must be at least 1".to_string());
        }
        Ok(self)
    }

    #[must_use]
    pub const fn rules(&self) -> RaffleRules {
        RaffleRules {
            max_ticket: self.max_ticket,
            unit_price_cents: self.unit_price_cents,
        }
    }

    #[must_use]
    pub const fn sync_interval(&self) -> Duration {
        Duration::from_secs(self.sync_interval_secs)
    }

    #[must_use]
    pub const fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    #[must_use]
    pub const fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_secs)
    }

    /// Whether pushes to the remote endpoint are enabled
    #[must_use]
    pub const fn is_sync_enabled(&self) -> bool {
        self.remote_endpoint_url.is_some()
    }
}

fn normalize_optional_http_url(raw: Option<String>, field: &str) -> Result<Option<String>, String> {
    let Some(value) = normalize_text_option(raw) else {
        return Ok(None);
    };
    if is_http_url(&value) {
        Ok(Some(value.trim_end_matches('/').to_string()))
    } else {
        Err(format!("config field '{field}' must include http:// or https://"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn empty_document_uses_defaults() {
        let config = RaffleConfig::from_json("{}").unwrap();
        assert_eq!(config, RaffleConfig::default());
        assert_eq!(config.rules().max_ticket, 300);
        assert_eq!(config.sync_interval(), Duration::from_secs(300));
        assert!(!config.is_sync_enabled());
    }

    #[test]
    fn blank_endpoint_disables_sync() {
        let config = RaffleConfig::from_json(r#"{"remote_endpoint_url": "   "}"#).unwrap();
        assert_eq!(config.remote_endpoint_url, None);
        assert!(!config.is_sync_enabled());
    }

    #[test]
    fn endpoint_is_trimmed_and_requires_http_scheme() {
        let config = RaffleConfig::from_json(
            r#"{"remote_endpoint_url": " https://script.example.com/exec/ "}"#,
        )
        .unwrap();
        assert_eq!(
            config.remote_endpoint_url.as_deref(),
            Some("https://script.example.com/exec")
        );

        let error =
            RaffleConfig::from_json(r#"{"remote_sheet_url": "docs.example.com"}"#).unwrap_err();
        assert!(error.contains("remote_sheet_url"));
    }

    #[test]
    fn rejects_unknown_fields_and_zero_ceiling() {
        assert!(RaffleConfig::from_json(r#"{"unexpected": true}"#)
            .unwrap_err()
            .contains("unknown field"));
        assert!(RaffleConfig::from_json(r#"{"max_ticket": 0}"#).is_err());
    }

    #[test]
    fn rejects_zero_http_timeout() {
        let error = RaffleConfig::from_json(r#"{"http_timeout_secs": 0}"#).unwrap_err();
        assert!(error.contains("http_timeout_secs"));
    }

    #[test]
    fn payload_format_parses_lowercase() {
        let config = RaffleConfig::from_json(r#"{"payload_format": "form"}"#).unwrap();
        assert_eq!(config.payload_format, PayloadFormat::Form);
    }

    #[test]
    fn rules_contain_bounds() {
        let rules = RaffleRules::default();
        assert!(!rules.contains(0));
        assert!(rules.contains(1));
        assert!(rules.contains(300));
        assert!(!rules.contains(301));
    }
}

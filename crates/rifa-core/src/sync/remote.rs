//! Remote write sink and bulk-read source.

use std::future::Future;

use serde::Serialize;

use super::sheet::parse_remote_csv;
use crate::config::{PayloadFormat, RaffleConfig, RaffleRules};
use crate::error::{Error, Result};
use crate::models::Sale;
use crate::util::compact_text;

/// Accepts one sale per request
pub trait RemoteSink: Send + Sync + 'static {
    /// False when no write endpoint is configured; sync is then a no-op
    fn is_enabled(&self) -> bool {
        true
    }

    /// Push the current state of `sale`; `Ok` means the remote accepted it
    fn push(&self, sale: &Sale) -> impl Future<Output = Result<()>> + Send;
}

/// Returns the full remote dataset
pub trait RemoteSource: Send + Sync + 'static {
    fn is_enabled(&self) -> bool {
        true
    }

    fn fetch_all(&self) -> impl Future<Output = Result<Vec<Sale>>> + Send;
}

/// Body sent for one sale; flat strings so JSON and form encodings match
#[derive(Debug, Serialize, PartialEq, Eq)]
pub struct RemoteSalePayload {
    pub id: String,
    pub turma: String,
    pub numero: u32,
    pub nome: String,
    pub telefone: String,
    pub status: String,
    pub data: String,
    pub manual: bool,
}

impl From<&Sale> for RemoteSalePayload {
    fn from(sale: &Sale) -> Self {
        Self {
            id: sale.id.to_string(),
            turma: sale.group.clone(),
            numero: sale.number,
            nome: sale.buyer_name.clone().unwrap_or_default(),
            telefone: sale.buyer_phone.clone().unwrap_or_default(),
            status: sale.status.to_string(),
            data: sale.created_at.to_rfc3339(),
            manual: sale.manual,
        }
    }
}

/// HTTP client for a form/sheet style backend
#[derive(Clone)]
pub struct HttpRemote {
    client: reqwest::Client,
    endpoint_url: Option<String>,
    sheet_url: Option<String>,
    format: PayloadFormat,
    rules: RaffleRules,
}

impl HttpRemote {
    /// Build a client from validated configuration
    pub fn from_config(config: &RaffleConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.http_timeout())
            .build()?;
        Ok(Self {
            client,
            endpoint_url: config.remote_endpoint_url.clone(),
            sheet_url: config.remote_sheet_url.clone(),
            format: config.payload_format,
            rules: config.rules(),
        })
    }

    pub fn endpoint_url(&self) -> Option<&str> {
        self.endpoint_url.as_deref()
    }

    pub fn sheet_url(&self) -> Option<&str> {
        self.sheet_url.as_deref()
    }
}

impl RemoteSink for HttpRemote {
    fn is_enabled(&self) -> bool {
        self.endpoint_url.is_some()
    }

    fn push(&self, sale: &Sale) -> impl Future<Output = Result<()>> + Send {
        let payload = RemoteSalePayload::from(sale);
        let request = self.endpoint_url.as_ref().map(|url| {
            let builder = self.client.post(url);
            match self.format {
                PayloadFormat::Json => builder.json(&payload),
                PayloadFormat::Form => builder.form(&payload),
            }
        });

        async move {
            let Some(request) = request else {
                return Err(Error::Remote("remote endpoint is not configured".to_string()));
            };

            let response = request.send().await?;
            let status = response.status();
            if status.is_success() {
                Ok(())
            } else {
                Err(Error::Remote(format!(
                    "endpoint returned HTTP {}",
                    status.as_u16()
                )))
            }
        }
    }
}

impl RemoteSource for HttpRemote {
    fn is_enabled(&self) -> bool {
        self.sheet_url.is_some()
    }

    fn fetch_all(&self) -> impl Future<Output = Result<Vec<Sale>>> + Send {
        let request = self.sheet_url.as_ref().map(|url| {
            self.client
                .get(url)
                .header(reqwest::header::ACCEPT, "text/csv")
        });
        let rules = self.rules;

        async move {
            let Some(request) = request else {
                return Err(Error::Remote("remote sheet is not configured".to_string()));
            };

            let response = request.send().await?;
            let status = response.status();
            let body = response.text().await?;
            if !status.is_success() {
                return Err(Error::Remote(format!(
                    "sheet returned HTTP {}: {}",
                    status.as_u16(),
                    compact_text(&body)
                )));
            }
            parse_remote_csv(&body, rules)
        }
    }
}

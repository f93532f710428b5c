//! Shared sale export helpers.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::models::Sale;

const CSV_HEADER: [&str; 8] = [
    "Turma",
    "Numero",
    "Nome",
    "Telefone",
    "Status",
    "Data",
    "Sincronizado",
    "Manual",
];

/// Export output format shared by all clients.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    Csv,
    Json,
}

impl ExportFormat {
    #[must_use]
    pub const fn extension(self) -> &'static str {
        match self {
            Self::Csv => "csv",
            Self::Json => "json",
        }
    }
}

fn yes_no(value: bool) -> &'static str {
    if value {
        "sim"
    } else {
        "nao"
    }
}

/// Render sales as a spreadsheet-friendly CSV table.
pub fn render_csv_export(sales: &[Sale]) -> Result<String> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(CSV_HEADER)?;

    for sale in sales {
        let number = sale.number.to_string();
        let created_at = sale.created_at.to_rfc3339();
        writer.write_record([
            sale.group.as_str(),
            number.as_str(),
            sale.buyer_name.as_deref().unwrap_or_default(),
            sale.buyer_phone.as_deref().unwrap_or_default(),
            sale.status.as_str(),
            created_at.as_str(),
            yes_no(sale.synced),
            yes_no(sale.manual),
        ])?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|error| Error::Io(error.into_error()))?;
    String::from_utf8(bytes).map_err(|error| Error::InvalidInput(error.to_string()))
}

/// Render sales as pretty-printed JSON in their stored shape.
pub fn render_json_export(sales: &[Sale]) -> Result<String> {
    Ok(serde_json::to_string_pretty(sales)?)
}

/// Render sales based on selected export format.
pub fn render_sales_export(sales: &[Sale], format: ExportFormat) -> Result<String> {
    match format {
        ExportFormat::Csv => render_csv_export(sales),
        ExportFormat::Json => render_json_export(sales),
    }
}

/// Build a deterministic default file name for export flows.
#[must_use]
pub fn suggested_export_file_name(format: ExportFormat, timestamp_ms: i64) -> String {
    format!("rifa-export-{timestamp_ms}.{}", format.extension())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{BuyerInfo, SaleStatus};
    use chrono::{TimeZone, Utc};
    use pretty_assertions::assert_eq;

    fn sample() -> Vec<Sale> {
        let at = Utc.timestamp_millis_opt(1_714_557_600_000).unwrap();
        let buyer = BuyerInfo::new(Some("Ana, da Silva".to_string()), Some("1199".to_string()));
        let mut paid = Sale::new_at("3B", 12, BuyerInfo::default(), SaleStatus::Paid, at);
        paid.manual = true;
        paid.synced = true;
        vec![Sale::new_at("3A", 7, buyer, SaleStatus::Reserved, at), paid]
    }

    #[test]
    fn render_csv_export_quotes_fields_and_writes_header() {
        let rendered = render_csv_export(&sample()).unwrap();
        let lines: Vec<&str> = rendered.lines().collect();

        assert_eq!(
            lines,
            vec![
                "Turma,Numero,Nome,Telefone,Status,Data,Sincronizado,Manual",
                "3A,7,\"Ana, da Silva\",1199,reservado,2024-05-01T10:00:00+00:00,nao,nao",
                "3B,12,,,pago,2024-05-01T10:00:00+00:00,sim,sim",
            ]
        );
    }

    #[test]
    fn render_csv_export_of_empty_ledger_is_header_only() {
        let rendered = render_csv_export(&[]).unwrap();
        assert_eq!(
            rendered,
            "Turma,Numero,Nome,Telefone,Status,Data,Sincronizado,Manual\n"
        );
    }

    #[test]
    fn render_json_export_uses_stored_field_names() {
        let rendered = render_sales_export(&sample(), ExportFormat::Json).unwrap();
        let value: serde_json::Value = serde_json::from_str(&rendered).unwrap();

        assert_eq!(value[0]["turma"], "3A");
        assert_eq!(value[0]["nome"], "Ana, da Silva");
        assert_eq!(value[1]["status"], "pago");
        assert_eq!(value[1]["manual"], true);
    }

    #[test]
    fn suggested_export_file_name_uses_format_extension() {
        assert_eq!(
            suggested_export_file_name(ExportFormat::Json, 123),
            "rifa-export-123.json"
        );
        assert_eq!(
            suggested_export_file_name(ExportFormat::Csv, 456),
            "rifa-export-456.csv"
        );
    }
}

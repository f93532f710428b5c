//! Parsing of the remote sheet's CSV export

use std::collections::HashMap;

use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};

use crate::config::RaffleRules;
use crate::error::Result;
use crate::models::{BuyerInfo, Sale, SaleId, SaleStatus};
use crate::util::{fold_header, normalize_text_option};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum Column {
    Id,
    Group,
    Number,
    Name,
    Phone,
    Status,
    CreatedAt,
    Manual,
}

fn column_for(header: &str) -> Option<Column> {
    match fold_header(header).as_str() {
        "id" => Some(Column::Id),
        "turma" | "grupo" | "group" => Some(Column::Group),
        "numero" | "number" | "bilhete" => Some(Column::Number),
        "nome" | "comprador" | "name" => Some(Column::Name),
        "telefone" | "phone" => Some(Column::Phone),
        "status" | "situacao" => Some(Column::Status),
        "data" | "timestamp" | "carimbo de data/hora" | "created_at" => Some(Column::CreatedAt),
        "manual" => Some(Column::Manual),
        _ => None,
    }
}

/// Parse the sheet into sales.
///
/// The first row names the columns. Rows without a group or a valid ticket
/// number are skipped. A missing timestamp falls back to the Unix epoch so
/// derived ids stay the same between fetches.
pub fn parse_remote_csv(text: &str, rules: RaffleRules) -> Result<Vec<Sale>> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(text.as_bytes());

    let mut columns: HashMap<Column, usize> = HashMap::new();
    for (index, header) in reader.headers()?.iter().enumerate() {
        if let Some(column) = column_for(header) {
            columns.entry(column).or_insert(index);
        }
    }

    let mut sales = Vec::new();
    let mut skipped = 0usize;

    for (row_index, record) in reader.records().enumerate() {
        let Ok(record) = record else {
            skipped += 1;
            continue;
        };
        let field = |column: Column| -> Option<String> {
            columns
                .get(&column)
                .and_then(|index| record.get(*index))
                .and_then(|value| normalize_text_option(Some(value.to_string())))
        };

        let Some(group) = field(Column::Group) else {
            skipped += 1;
            continue;
        };
        let Some(number) = field(Column::Number)
            .and_then(|raw| raw.parse::<u32>().ok())
            .filter(|number| rules.contains(*number))
        else {
            tracing::debug!("Skipping sheet row {} without a valid number", row_index + 2);
            skipped += 1;
            continue;
        };

        let status = field(Column::Status)
            .and_then(|raw| raw.parse::<SaleStatus>().ok())
            .unwrap_or(SaleStatus::Reserved);
        let created_at = field(Column::CreatedAt)
            .and_then(|raw| parse_timestamp(&raw))
            .unwrap_or_default();
        let buyer = BuyerInfo::new(field(Column::Name), field(Column::Phone));

        let mut sale = Sale::new_at(group, number, buyer, status, created_at);
        if let Some(id) = field(Column::Id) {
            sale.id = SaleId::from(id);
        }
        sale.manual = field(Column::Manual).is_some_and(|raw| is_truthy(&raw));
        sale.from_remote = true;
        sale.synced = true;
        sales.push(sale);
    }

    if skipped > 0 {
        tracing::debug!("Skipped {skipped} malformed sheet rows");
    }
    Ok(sales)
}

/// RFC 3339, or the `dd/mm/yyyy hh:mm:ss` layout spreadsheets export
fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return Some(parsed.with_timezone(&Utc));
    }
    ["%d/%m/%Y %H:%M:%S", "%d/%m/%Y %H:%M", "%Y-%m-%d %H:%M:%S"]
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(raw, format).ok())
        .map(|naive| Utc.from_utc_datetime(&naive))
}

fn is_truthy(raw: &str) -> bool {
    matches!(
        raw.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "sim" | "yes" | "x"
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn parses_rows_and_skips_malformed_ones() {
        let text = "\
Carimbo de data/hora,Turma,Número,Nome,Telefone,Status
01/05/2024 10:00:00,3A,7,Ana,1199,pago
01/05/2024 10:05:00,3A,,Bia,,reservado
01/05/2024 10:06:00,3A,abc,Caio,,reservado
01/05/2024 10:07:00,3A,999,Duda,,reservado
01/05/2024 10:08:00,,4,Eva,,reservado
2024-05-01T11:00:00Z,3B,12,,,
";
        let sales = parse_remote_csv(text, RaffleRules::default()).unwrap();
        assert_eq!(sales.len(), 2);

        let ana = &sales[0];
        assert_eq!(ana.group, "3A");
        assert_eq!(ana.number, 7);
        assert_eq!(ana.buyer_name.as_deref(), Some("Ana"));
        assert_eq!(ana.buyer_phone.as_deref(), Some("1199"));
        assert_eq!(ana.status, SaleStatus::Paid);
        assert!(ana.from_remote);
        assert!(ana.synced);
        assert_eq!(ana.created_at.to_rfc3339(), "2024-05-01T10:00:00+00:00");

        let anonymous = &sales[1];
        assert_eq!(anonymous.group, "3B");
        assert_eq!(anonymous.status, SaleStatus::Reserved);
        assert_eq!(anonymous.buyer_name, None);
    }

    #[test]
    fn explicit_id_column_is_kept() {
        let text = "id,turma,numero,status,manual\nabc-1,3C,5,cancelado,sim\n";
        let sales = parse_remote_csv(text, RaffleRules::default()).unwrap();

        assert_eq!(sales.len(), 1);
        assert_eq!(sales[0].id.as_str(), "abc-1");
        assert_eq!(sales[0].status, SaleStatus::Cancelled);
        assert!(sales[0].manual);
    }

    #[test]
    fn missing_timestamp_gives_stable_ids() {
        let text = "turma,numero\n3A,1\n";
        let first = parse_remote_csv(text, RaffleRules::default()).unwrap();
        let second = parse_remote_csv(text, RaffleRules::default()).unwrap();

        assert_eq!(first, second);
        assert_eq!(first[0].id.as_str(), "3A-1-0");
    }

    #[test]
    fn header_only_sheet_is_empty() {
        let sales = parse_remote_csv("turma,numero\n", RaffleRules::default()).unwrap();
        assert!(sales.is_empty());
    }
}

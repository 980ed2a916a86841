//! CSV and JSON export of prefilled records.
//!
//! Used by batch runs to hand a parsed medication list to whatever keeps
//! the records.

use crate::types::{MedicationRecord, ParsedOrder};
use crate::Result;
use std::io::Write;
use std::path::Path;

/// A row in the CSV output
#[derive(Debug, serde::Serialize)]
struct CsvRow {
    id: String,
    name: String,
    dosage: String,
    frequency: String,
    route: String,
    status: String,
    start_date: String,
    quantity: Option<u32>,
    days_supply: String,
    refill_date: Option<String>,
    created_at: String,
}

impl From<&MedicationRecord> for CsvRow {
    fn from(record: &MedicationRecord) -> Self {
        CsvRow {
            id: record.id.to_string(),
            name: record.name.clone(),
            dosage: record.dosage.clone(),
            frequency: record.frequency.clone(),
            route: record.route.clone(),
            status: record.status.to_string(),
            start_date: record.start_date.to_string(),
            quantity: record.quantity,
            days_supply: record.days_supply().to_string(),
            refill_date: record.refill_date.map(|d| d.to_string()),
            created_at: record.created_at.to_rfc3339(),
        }
    }
}

const RECORD_HEADER: [&str; 11] = [
    "id",
    "name",
    "dosage",
    "frequency",
    "route",
    "status",
    "start_date",
    "quantity",
    "days_supply",
    "refill_date",
    "created_at",
];

/// Parsed fields only, for orders that were not turned into records
#[derive(Debug, serde::Serialize)]
struct OrderRow<'a> {
    name: &'a str,
    dosage: &'a str,
    frequency: &'a str,
    route: &'a str,
    quantity: Option<u32>,
}

const ORDER_HEADER: [&str; 5] = ["name", "dosage", "frequency", "route", "quantity"];

/// CSV writer that has already emitted `header`, so an empty export still
/// carries its column names
fn csv_writer<W: Write>(writer: W, header: &[&str]) -> Result<csv::Writer<W>> {
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(writer);
    writer.write_record(header)?;
    Ok(writer)
}

/// Write records as CSV with a header row, returning the number of rows
pub fn write_records_csv<W: Write>(writer: W, records: &[MedicationRecord]) -> Result<usize> {
    let mut writer = csv_writer(writer, &RECORD_HEADER)?;
    for record in records {
        writer.serialize(CsvRow::from(record))?;
    }
    writer.flush()?;
    Ok(records.len())
}

/// Write records to a CSV file, creating its directory if needed
pub fn write_records_csv_file(path: &Path, records: &[MedicationRecord]) -> Result<usize> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let file = std::fs::File::create(path)?;
    let count = write_records_csv(file, records)?;
    tracing::info!("Wrote {} records to {:?}", count, path);
    Ok(count)
}

/// Write parsed orders as CSV with a header row
pub fn write_orders_csv<W: Write>(writer: W, orders: &[ParsedOrder]) -> Result<usize> {
    let mut writer = csv_writer(writer, &ORDER_HEADER)?;
    for order in orders {
        writer.serialize(OrderRow {
            name: &order.medication.name,
            dosage: &order.medication.dosage,
            frequency: &order.medication.frequency,
            route: &order.medication.route,
            quantity: order.quantity,
        })?;
    }
    writer.flush()?;
    Ok(orders.len())
}

/// Pretty-printed JSON array of records
pub fn records_to_json(records: &[MedicationRecord]) -> Result<String> {
    Ok(serde_json::to_string_pretty(records)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_order;
    use crate::types::RefillRounding;
    use chrono::NaiveDate;
    use tempfile::TempDir;

    fn records() -> Vec<MedicationRecord> {
        let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        ["Metformin 500mg PO BID #60", "Ibuprofen 400mg q6h PRN"]
            .iter()
            .map(|text| {
                MedicationRecord::from_entry(text, start, None, RefillRounding::Floor).unwrap()
            })
            .collect()
    }

    #[test]
    fn test_write_records_csv() {
        let mut buffer = Vec::new();
        let count = write_records_csv(&mut buffer, &records()).unwrap();
        assert_eq!(count, 2);

        let text = String::from_utf8(buffer).unwrap();
        let lines: Vec<_> = text.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("id,name,dosage,frequency,route,status"));
        assert!(lines[1].contains("Metformin,500mg,BID,PO,active,2024-01-01,60,30,2024-01-31"));
        assert!(lines[2].contains("Ibuprofen,400mg,Q6H PRN,PO,prn,2024-01-01,,unknown,"));
    }

    #[test]
    fn test_write_records_csv_file_creates_directory() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("out").join("records.csv");

        let count = write_records_csv_file(&path, &records()).unwrap();
        assert_eq!(count, 2);

        let mut reader = csv::Reader::from_path(&path).unwrap();
        assert_eq!(reader.records().count(), 2);
    }

    #[test]
    fn test_empty_export_writes_header_only() {
        let mut buffer = Vec::new();
        assert_eq!(write_records_csv(&mut buffer, &[]).unwrap(), 0);
        let text = String::from_utf8(buffer).unwrap();
        assert_eq!(text, format!("{}\n", RECORD_HEADER.join(",")));

        let mut buffer = Vec::new();
        assert_eq!(write_orders_csv(&mut buffer, &[]).unwrap(), 0);
        assert_eq!(
            String::from_utf8(buffer).unwrap(),
            "name,dosage,frequency,route,quantity\n"
        );
    }

    #[test]
    fn test_header_width_matches_rows() {
        let mut buffer = Vec::new();
        write_records_csv(&mut buffer, &records()).unwrap();

        let mut reader = csv::Reader::from_reader(buffer.as_slice());
        let header_len = reader.headers().unwrap().len();
        assert_eq!(header_len, RECORD_HEADER.len());
        for row in reader.records() {
            assert_eq!(row.unwrap().len(), header_len);
        }
    }

    #[test]
    fn test_write_orders_csv() {
        let orders = vec![parse_order("Amlodipine 5mg OD #30"), parse_order("Fish oil")];
        let mut buffer = Vec::new();
        assert_eq!(write_orders_csv(&mut buffer, &orders).unwrap(), 2);

        let text = String::from_utf8(buffer).unwrap();
        assert!(text.starts_with("name,dosage,frequency,route,quantity\n"));
        assert!(text.contains("Amlodipine,5mg,OD,PO,30\n"));
        assert!(text.contains("Fish oil,,,PO,\n"));
    }

    #[test]
    fn test_records_to_json() {
        let json = records_to_json(&records()).unwrap();
        let parsed: Vec<MedicationRecord> = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.len(), 2);
        assert_eq!(parsed[0].name, "Metformin");
        assert_eq!(parsed[1].status.to_string(), "prn");
    }
}

use std::collections::HashMap;
use std::io::Cursor;
use std::path::Path;
use std::sync::{Arc, Mutex, OnceLock};

use anyhow::{bail, Context, Result};
use calamine::{open_workbook_auto_from_rs, Data, Reader};
use chrono::{NaiveDate, NaiveDateTime};
use sha2::{Digest, Sha256};

use super::model::{InputShape, NormalizedTable, Record};
use super::schema::{self, SchemaError};

// ---------------------------------------------------------------------------
// Public entry-point
// ---------------------------------------------------------------------------

/// Load and normalize a source file.  Dispatch by extension.
///
/// Supported formats:
/// * `.xlsx` / `.xlsm` / `.xls` – first worksheet of the workbook
/// * `.csv`                     – comma-separated with a header row
///
/// The file is read fully into memory first so the handle is released
/// before any parsing starts. Results are memoized on the content hash:
/// reloading an unchanged file returns the shared table.
pub fn load_file(path: &Path) -> Result<Arc<NormalizedTable>> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    let bytes = std::fs::read(path).context("reading input file")?;
    load_bytes(&bytes, &ext)
}

// Content-hash → normalized table. Normalization is a pure function of the
// file bytes, so identical content always maps to the same shared table.
static TABLE_CACHE: OnceLock<Mutex<HashMap<[u8; 32], Arc<NormalizedTable>>>> = OnceLock::new();

/// Parse and normalize in-memory file content. See [`load_file`].
pub fn load_bytes(bytes: &[u8], ext: &str) -> Result<Arc<NormalizedTable>> {
    let key: [u8; 32] = Sha256::digest(bytes).into();
    let cache = TABLE_CACHE.get_or_init(|| Mutex::new(HashMap::new()));

    {
        let guard = cache.lock().expect("table cache mutex poisoned");
        if let Some(existing) = guard.get(&key) {
            log::debug!("cache hit for {} byte input", bytes.len());
            return Ok(Arc::clone(existing));
        }
    }

    let raw = match ext {
        "xlsx" | "xlsm" | "xls" => read_spreadsheet(bytes)?,
        "csv" => read_csv(bytes)?,
        other => bail!("Unsupported file extension: .{other}"),
    };

    let table = Arc::new(normalize(raw)?);
    log::info!(
        "loaded {} records ({} raw rows, {} dropped)",
        table.len(),
        table.raw_rows,
        table.dropped_rows
    );

    let mut guard = cache.lock().expect("table cache mutex poisoned");
    guard.insert(key, Arc::clone(&table));
    Ok(table)
}

// ---------------------------------------------------------------------------
// Raw readers – both formats reduce to a header row plus string cells
// ---------------------------------------------------------------------------

/// Untyped sheet content: a header row and string cells. Cell typing
/// happens in [`normalize`], driven by the resolved schema.
#[derive(Debug, Clone, Default)]
pub struct RawTable {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

fn read_spreadsheet(bytes: &[u8]) -> Result<RawTable> {
    let mut workbook =
        open_workbook_auto_from_rs(Cursor::new(bytes.to_vec())).context("opening spreadsheet")?;

    let sheet = workbook
        .sheet_names()
        .first()
        .cloned()
        .context("spreadsheet has no sheets")?;
    let range = workbook
        .worksheet_range(&sheet)
        .with_context(|| format!("reading sheet '{sheet}'"))?;

    let mut rows = range.rows();
    let headers: Vec<String> = rows
        .next()
        .context("sheet has no header row")?
        .iter()
        .map(cell_to_string)
        .collect();
    let rows: Vec<Vec<String>> = rows
        .map(|r| r.iter().map(cell_to_string).collect())
        .collect();

    Ok(RawTable { headers, rows })
}

/// Render one spreadsheet cell as text. Dates become ISO `YYYY-MM-DD` so
/// the downstream date parser sees one canonical form; error cells and
/// blanks become the empty string (missing).
fn cell_to_string(cell: &Data) -> String {
    match cell {
        Data::String(s) => s.trim().to_string(),
        Data::Float(f) => {
            if f.fract() == 0.0 {
                format!("{}", *f as i64)
            } else {
                f.to_string()
            }
        }
        Data::Int(i) => i.to_string(),
        Data::Bool(b) => b.to_string(),
        Data::DateTime(dt) => dt
            .as_datetime()
            .map(|d| d.format("%Y-%m-%d").to_string())
            .unwrap_or_default(),
        Data::DateTimeIso(s) | Data::DurationIso(s) => s.clone(),
        Data::Empty | Data::Error(_) => String::new(),
    }
}

fn read_csv(bytes: &[u8]) -> Result<RawTable> {
    // Ragged rows are tolerated: missing cells read as absent and the
    // normalizer decides whether the row survives.
    let mut reader = csv::ReaderBuilder::new().flexible(true).from_reader(bytes);
    let headers: Vec<String> = reader
        .headers()
        .context("reading CSV headers")?
        .iter()
        .map(|h| h.to_string())
        .collect();

    let mut rows = Vec::new();
    let mut skipped = 0usize;
    for result in reader.records() {
        match result {
            Ok(record) => rows.push(record.iter().map(|c| c.to_string()).collect()),
            Err(e) => {
                log::debug!("skipping malformed CSV record: {e}");
                skipped += 1;
            }
        }
    }
    if skipped > 0 {
        log::warn!("skipped {skipped} malformed CSV record(s)");
    }

    Ok(RawTable { headers, rows })
}

// ---------------------------------------------------------------------------
// Normalization
// ---------------------------------------------------------------------------

/// Resolve the schema and turn the raw grid into a [`NormalizedTable`].
///
/// Rows missing a required field or carrying an unparsable required date
/// are dropped here, never downstream. Cell-level failures are not
/// individually surfaced; they only shrink the row count.
pub fn normalize(raw: RawTable) -> Result<NormalizedTable, SchemaError> {
    let (shape, schema) = schema::resolve(&raw.headers)?;
    let raw_rows = raw.rows.len();
    let mut records = Vec::with_capacity(raw_rows);

    match shape {
        InputShape::DateDifference => {
            let has_unit = schema.column(schema::FIELD_UNIT).is_some();
            for row in &raw.rows {
                let Some(vendor) = cell(row, schema.column(schema::FIELD_VENDOR)) else {
                    continue;
                };
                let unit = cell(row, schema.column(schema::FIELD_UNIT));
                if has_unit && unit.is_none() {
                    continue;
                }
                let Some(payment) =
                    cell(row, schema.column(schema::FIELD_PAYMENT_DATE)).and_then(|s| parse_date(&s))
                else {
                    continue;
                };
                let Some(verification) = cell(row, schema.column(schema::FIELD_VERIFICATION_DATE))
                    .and_then(|s| parse_date(&s))
                else {
                    continue;
                };

                // Whole days; negative when verification precedes payment,
                // which the caller must see, not have corrected away.
                let sla_days = (verification - payment).num_days();

                records.push(Record {
                    vendor: Some(vendor),
                    unit,
                    payment_date: Some(payment),
                    verification_date: Some(verification),
                    sla_days: Some(sla_days),
                    week_bucket: Some(week_bucket(payment)),
                    ..Record::default()
                });
            }
        }
        InputShape::PrecomputedColumns => {
            for row in &raw.rows {
                let Some(period) = cell(row, schema.column(schema::FIELD_PERIOD)) else {
                    continue;
                };
                let mut bagian = std::collections::BTreeMap::new();
                for bf in &schema::BAGIAN_FIELDS {
                    let Some(value) = cell(row, schema.column(bf.field)) else {
                        continue;
                    };
                    if let Ok(v) = value.parse::<f64>() {
                        bagian.insert(bf.label.to_string(), v);
                    }
                }
                records.push(Record {
                    period: Some(period),
                    bagian,
                    ..Record::default()
                });
            }
        }
    }

    Ok(NormalizedTable::new(shape, schema, records, raw_rows))
}

/// Non-empty trimmed cell content at the given column, if any.
fn cell(row: &[String], index: Option<usize>) -> Option<String> {
    let value = row.get(index?)?.trim();
    if value.is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}

const DATE_FORMATS: [&str; 5] = ["%Y-%m-%d", "%d/%m/%Y", "%m/%d/%Y", "%d-%m-%Y", "%Y/%m/%d"];

/// Parse a date cell. Unparsable values become `None` (missing) rather
/// than failing the load.
fn parse_date(s: &str) -> Option<NaiveDate> {
    let s = s.trim();
    // Timestamps like "2024-01-05 00:00:00": the date part is enough.
    let head = s.split_whitespace().next()?;
    for fmt in DATE_FORMATS {
        if let Ok(d) = NaiveDate::parse_from_str(head, fmt) {
            return Some(d);
        }
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S") {
        return Some(dt.date());
    }
    None
}

/// `"%Y-%U"` week label of a payment date. Zero-padded week numbers keep
/// lexical order equal to chronological order within the format.
fn week_bucket(date: NaiveDate) -> String {
    date.format("%Y-%U").to_string()
}

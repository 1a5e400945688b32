use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result};

use super::model::{InputShape, NormalizedTable, Record};
use super::schema;

// ---------------------------------------------------------------------------
// Column layout shared by the data table and the CSV export
// ---------------------------------------------------------------------------

/// Header row of the displayed/exported column subset: the resolved
/// source headers in a fixed logical display order (vendor, unit, dates
/// or period, bagian) plus the derived-column names.
pub fn header_row(table: &NormalizedTable) -> Vec<String> {
    let mut header = Vec::new();
    match table.shape {
        InputShape::DateDifference => {
            for field in [
                schema::FIELD_VENDOR,
                schema::FIELD_UNIT,
                schema::FIELD_PAYMENT_DATE,
                schema::FIELD_VERIFICATION_DATE,
            ] {
                if let Some(name) = table.schema.header(field) {
                    header.push(name.to_string());
                }
            }
            header.push("SLA (hari)".to_string());
            header.push("Minggu".to_string());
        }
        InputShape::PrecomputedColumns => {
            if let Some(name) = table.schema.header(schema::FIELD_PERIOD) {
                header.push(name.to_string());
            }
            for bf in &schema::BAGIAN_FIELDS {
                if let Some(name) = table.schema.header(bf.field) {
                    header.push(name.to_string());
                }
            }
        }
    }
    header
}

/// One record rendered as text cells, aligned with [`header_row`].
/// Missing values render as empty cells.
pub fn row_values(table: &NormalizedTable, rec: &Record) -> Vec<String> {
    let mut row = Vec::new();
    match table.shape {
        InputShape::DateDifference => {
            row.push(rec.vendor.clone().unwrap_or_default());
            if table.schema.column(schema::FIELD_UNIT).is_some() {
                row.push(rec.unit.clone().unwrap_or_default());
            }
            row.push(format_date(rec.payment_date));
            row.push(format_date(rec.verification_date));
            row.push(rec.sla_days.map(|d| d.to_string()).unwrap_or_default());
            row.push(rec.week_bucket.clone().unwrap_or_default());
        }
        InputShape::PrecomputedColumns => {
            row.push(rec.period.clone().unwrap_or_default());
            for bf in &schema::BAGIAN_FIELDS {
                if table.schema.column(bf.field).is_none() {
                    continue;
                }
                row.push(
                    rec.bagian
                        .get(bf.label)
                        .map(|v| format_number(*v))
                        .unwrap_or_default(),
                );
            }
        }
    }
    row
}

fn format_date(date: Option<chrono::NaiveDate>) -> String {
    date.map(|d| d.format("%Y-%m-%d").to_string())
        .unwrap_or_default()
}

fn format_number(v: f64) -> String {
    if v.fract() == 0.0 {
        format!("{}", v as i64)
    } else {
        v.to_string()
    }
}

// ---------------------------------------------------------------------------
// CSV export
// ---------------------------------------------------------------------------

/// Serialize the filtered view as UTF-8 CSV: one header row, one row per
/// filtered record.
pub fn write_csv<W: Write>(table: &NormalizedTable, indices: &[usize], writer: W) -> Result<()> {
    let mut wtr = csv::Writer::from_writer(writer);
    wtr.write_record(header_row(table))
        .context("writing CSV header")?;
    for &i in indices {
        wtr.write_record(row_values(table, &table.records[i]))
            .with_context(|| format!("writing CSV row {i}"))?;
    }
    wtr.flush().context("flushing CSV output")?;
    Ok(())
}

/// [`write_csv`] into a file at `path`.
pub fn write_csv_file(table: &NormalizedTable, indices: &[usize], path: &Path) -> Result<()> {
    let file = std::fs::File::create(path)
        .with_context(|| format!("creating {}", path.display()))?;
    write_csv(table, indices, file)
}

/// [`write_csv`] into an in-memory string.
pub fn to_csv_string(table: &NormalizedTable, indices: &[usize]) -> Result<String> {
    let mut buf = Vec::new();
    write_csv(table, indices, &mut buf)?;
    String::from_utf8(buf).context("CSV output was not UTF-8")
}

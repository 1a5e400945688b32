use std::collections::{BTreeMap, BTreeSet};

use chrono::NaiveDate;

use super::schema::{self, ResolvedSchema};

// ---------------------------------------------------------------------------
// InputShape – which of the two source layouts was detected
// ---------------------------------------------------------------------------

/// The two spreadsheet layouts the dashboard understands.
///
/// Decided once at load time; every downstream stage dispatches on the
/// table's shape instead of re-inspecting columns per row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputShape {
    /// Payment and verification date columns; `sla_days` is derived and the
    /// period filter is a date range over the payment date.
    DateDifference,
    /// Discrete period label plus one numeric SLA column per bagian
    /// category; no date arithmetic is performed.
    PrecomputedColumns,
}

// ---------------------------------------------------------------------------
// Record – one normalized row
// ---------------------------------------------------------------------------

/// One normalized row of the source sheet.
///
/// Fields that do not apply to the active [`InputShape`] stay `None`/empty.
#[derive(Debug, Clone, Default)]
pub struct Record {
    pub vendor: Option<String>,
    pub unit: Option<String>,
    /// Discrete period label (`PrecomputedColumns` shape).
    pub period: Option<String>,
    pub payment_date: Option<NaiveDate>,
    pub verification_date: Option<NaiveDate>,
    /// Whole days between payment and verification. Negative values are
    /// preserved as-is: they signal an inverted data entry and must stay
    /// visible, not be clamped away.
    pub sla_days: Option<i64>,
    /// `"%Y-%U"` label of the payment date. Zero-padded so lexical order
    /// equals chronological order.
    pub week_bucket: Option<String>,
    /// Bagian label → SLA days (`PrecomputedColumns` shape). Cells that
    /// failed numeric parsing are simply absent.
    pub bagian: BTreeMap<String, f64>,
}

// ---------------------------------------------------------------------------
// NormalizedTable – the complete loaded dataset
// ---------------------------------------------------------------------------

/// The full normalized dataset. Immutable after construction; shared
/// read-only by every viewer of the same source file.
#[derive(Debug, Clone)]
pub struct NormalizedTable {
    pub shape: InputShape,
    /// Logical field → source column mapping, resolved once at load.
    pub schema: ResolvedSchema,
    pub records: Vec<Record>,
    /// Row count of the source sheet, header excluded.
    pub raw_rows: usize,
    /// Rows excluded for missing required fields or unparsable dates.
    pub dropped_rows: usize,
    /// Distinct values per filterable dimension, used to seed the default
    /// (everything-selected) filter criteria.
    pub vendors: BTreeSet<String>,
    pub units: BTreeSet<String>,
    pub periods: BTreeSet<String>,
    /// Min/max payment date observed (`DateDifference` shape).
    pub date_span: Option<(NaiveDate, NaiveDate)>,
}

impl NormalizedTable {
    /// Build the distinct-value indices from the normalized records.
    pub fn new(
        shape: InputShape,
        schema: ResolvedSchema,
        records: Vec<Record>,
        raw_rows: usize,
    ) -> Self {
        let dropped_rows = raw_rows.saturating_sub(records.len());

        let mut vendors = BTreeSet::new();
        let mut units = BTreeSet::new();
        let mut periods = BTreeSet::new();
        let mut date_span: Option<(NaiveDate, NaiveDate)> = None;

        for rec in &records {
            if let Some(v) = &rec.vendor {
                vendors.insert(v.clone());
            }
            if let Some(u) = &rec.unit {
                units.insert(u.clone());
            }
            if let Some(p) = &rec.period {
                periods.insert(p.clone());
            }
            if let Some(d) = rec.payment_date {
                date_span = Some(match date_span {
                    Some((lo, hi)) => (lo.min(d), hi.max(d)),
                    None => (d, d),
                });
            }
        }

        NormalizedTable {
            shape,
            schema,
            records,
            raw_rows,
            dropped_rows,
            vendors,
            units,
            periods,
            date_span,
        }
    }

    /// Number of normalized records.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the table holds no records.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Labels of the bagian columns the schema actually resolved, in
    /// canonical order.
    pub fn bagian_labels(&self) -> Vec<String> {
        schema::BAGIAN_FIELDS
            .iter()
            .filter(|bf| self.schema.column(bf.field).is_some())
            .map(|bf| bf.label.to_string())
            .collect()
    }
}

use std::collections::BTreeSet;

use chrono::NaiveDate;

use super::model::{InputShape, NormalizedTable, Record};

// ---------------------------------------------------------------------------
// FilterCriteria – user-driven selection state
// ---------------------------------------------------------------------------

/// The active filter selections. An empty selection set means "nothing
/// matches", not "match all"; the defaults built by [`FilterCriteria::all_of`]
/// select every value observed in the table.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterCriteria {
    pub vendors: BTreeSet<String>,
    pub units: BTreeSet<String>,
    pub periods: BTreeSet<String>,
    /// Inclusive payment-date range (`DateDifference` shape).
    pub date_range: Option<(NaiveDate, NaiveDate)>,
    /// Selected bagian categories (`PrecomputedColumns` shape). These pick
    /// which aggregate columns are included; rows carry all categories at
    /// once, so this is not a row predicate.
    pub bagian: BTreeSet<String>,
}

impl FilterCriteria {
    /// Default selection state: the full distinct-value set per dimension
    /// and the full observed date span.
    pub fn all_of(table: &NormalizedTable) -> Self {
        FilterCriteria {
            vendors: table.vendors.clone(),
            units: table.units.clone(),
            periods: table.periods.clone(),
            date_range: table.date_span,
            bagian: table.bagian_labels().into_iter().collect(),
        }
    }
}

// ---------------------------------------------------------------------------
// Application
// ---------------------------------------------------------------------------

/// Return indices of records passing the criteria, in table order.
///
/// Pure and total: criteria referencing values absent from the table simply
/// match nothing, and dimensions the table does not carry impose no
/// constraint.
pub fn apply(table: &NormalizedTable, criteria: &FilterCriteria) -> Vec<usize> {
    table
        .records
        .iter()
        .enumerate()
        .filter(|(_, rec)| matches(table, criteria, rec))
        .map(|(i, _)| i)
        .collect()
}

fn matches(table: &NormalizedTable, criteria: &FilterCriteria, rec: &Record) -> bool {
    match table.shape {
        InputShape::DateDifference => {
            if let Some((start, end)) = criteria.date_range {
                match rec.payment_date {
                    Some(d) if d >= start && d <= end => {}
                    _ => return false,
                }
            }
            match &rec.vendor {
                Some(v) if criteria.vendors.contains(v) => {}
                _ => return false,
            }
            // Only a constraint when the table has a unit dimension.
            if !table.units.is_empty() {
                match &rec.unit {
                    Some(u) if criteria.units.contains(u) => {}
                    _ => return false,
                }
            }
            true
        }
        InputShape::PrecomputedColumns => {
            // Bagian selection filters aggregate columns, not rows.
            matches!(&rec.period, Some(p) if criteria.periods.contains(p))
        }
    }
}

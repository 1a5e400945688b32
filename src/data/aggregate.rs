use std::collections::{BTreeMap, BTreeSet};

use super::model::{InputShape, NormalizedTable};
use super::schema;

// ---------------------------------------------------------------------------
// Results
// ---------------------------------------------------------------------------

/// Mean SLA and row count for one group or category.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GroupStat {
    /// `None` iff `count == 0`: an explicit "no data" state, never NaN.
    pub mean: Option<f64>,
    pub count: usize,
}

/// Ordered mapping category label → statistic. Ephemeral: recomputed on
/// every filter change and discarded after rendering.
pub type AggregateResult = BTreeMap<String, GroupStat>;

/// Mean/min/max of SLA days over the whole filtered view.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OverallStats {
    pub mean: f64,
    pub min: f64,
    pub max: f64,
}

/// Row dimension for single-dimension grouping.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dimension {
    Vendor,
    Unit,
}

// ---------------------------------------------------------------------------
// Aggregations
// ---------------------------------------------------------------------------

/// Group the filtered view by vendor or unit and compute the mean
/// `sla_days` per group. Groups absent from the view are absent from the
/// result ("no data"), never reported as zero.
pub fn by_dimension(
    table: &NormalizedTable,
    indices: &[usize],
    dimension: Dimension,
) -> AggregateResult {
    let mut sums: BTreeMap<String, (f64, usize)> = BTreeMap::new();
    for &i in indices {
        let rec = &table.records[i];
        let key = match dimension {
            Dimension::Vendor => rec.vendor.as_ref(),
            Dimension::Unit => rec.unit.as_ref(),
        };
        let (Some(key), Some(sla)) = (key, rec.sla_days) else {
            continue;
        };
        let entry = sums.entry(key.clone()).or_insert((0.0, 0));
        entry.0 += sla as f64;
        entry.1 += 1;
    }
    finish(sums)
}

/// Mean `sla_days` per `week_bucket`. The bucket format is string-sortable
/// chronologically, so the `BTreeMap` ordering is already the trend order.
pub fn weekly_trend(table: &NormalizedTable, indices: &[usize]) -> AggregateResult {
    let mut sums: BTreeMap<String, (f64, usize)> = BTreeMap::new();
    for &i in indices {
        let rec = &table.records[i];
        let (Some(bucket), Some(sla)) = (rec.week_bucket.as_ref(), rec.sla_days) else {
            continue;
        };
        let entry = sums.entry(bucket.clone()).or_insert((0.0, 0));
        entry.0 += sla as f64;
        entry.1 += 1;
    }
    finish(sums)
}

/// Independent mean per selected bagian column, ignoring rows whose cell
/// is missing in that specific column. Not a group-by: every selected
/// category gets an entry, possibly "no data".
pub fn bagian_means(
    table: &NormalizedTable,
    indices: &[usize],
    selected: &BTreeSet<String>,
) -> AggregateResult {
    let mut out = AggregateResult::new();
    for bf in &schema::BAGIAN_FIELDS {
        if table.schema.column(bf.field).is_none() || !selected.contains(bf.label) {
            continue;
        }
        let mut sum = 0.0;
        let mut count = 0usize;
        for &i in indices {
            if let Some(v) = table.records[i].bagian.get(bf.label) {
                sum += v;
                count += 1;
            }
        }
        out.insert(
            bf.label.to_string(),
            GroupStat {
                mean: (count > 0).then(|| sum / count as f64),
                count,
            },
        );
    }
    out
}

/// Overall mean/min/max over the filtered view; `None` when it is empty.
///
/// For the precomputed shape every cell of the selected bagian columns is
/// pooled, so the headline metrics stay meaningful when a row carries
/// several parallel SLA numbers.
pub fn overall(
    table: &NormalizedTable,
    indices: &[usize],
    selected_bagian: &BTreeSet<String>,
) -> Option<OverallStats> {
    let mut mean_acc = 0.0;
    let mut count = 0usize;
    let mut min = f64::INFINITY;
    let mut max = f64::NEG_INFINITY;

    let mut push = |v: f64| {
        mean_acc += v;
        count += 1;
        min = min.min(v);
        max = max.max(v);
    };

    for &i in indices {
        let rec = &table.records[i];
        match table.shape {
            InputShape::DateDifference => {
                if let Some(sla) = rec.sla_days {
                    push(sla as f64);
                }
            }
            InputShape::PrecomputedColumns => {
                for (label, v) in &rec.bagian {
                    if selected_bagian.contains(label) {
                        push(*v);
                    }
                }
            }
        }
    }

    (count > 0).then(|| OverallStats {
        mean: mean_acc / count as f64,
        min,
        max,
    })
}

fn finish(sums: BTreeMap<String, (f64, usize)>) -> AggregateResult {
    sums.into_iter()
        .map(|(key, (sum, count))| {
            (
                key,
                GroupStat {
                    mean: Some(sum / count as f64),
                    count,
                },
            )
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::filter::{self, FilterCriteria};
    use crate::data::loader::{normalize, RawTable};

    fn table_from(headers: &[&str], rows: &[&[&str]]) -> NormalizedTable {
        normalize(RawTable {
            headers: headers.iter().map(|s| s.to_string()).collect(),
            rows: rows
                .iter()
                .map(|r| r.iter().map(|c| c.to_string()).collect())
                .collect(),
        })
        .unwrap()
    }

    fn sample_rows() -> NormalizedTable {
        table_from(
            &["Tanggal Pembayaran", "Tanggal Verifikasi", "Vendor", "Unit"],
            &[
                &["2024-01-01", "2024-01-05", "VendorA", "Unit X"],
                &["2024-01-02", "2024-01-10", "VendorA", "Unit Y"],
                &["2024-01-03", "2024-01-04", "VendorB", "Unit X"],
            ],
        )
    }

    #[test]
    fn per_vendor_means_match_hand_computation() {
        let table = sample_rows();
        let indices: Vec<usize> = (0..table.len()).collect();
        let by_vendor = by_dimension(&table, &indices, Dimension::Vendor);

        assert_eq!(by_vendor["VendorA"].mean, Some(6.0));
        assert_eq!(by_vendor["VendorA"].count, 2);
        assert_eq!(by_vendor["VendorB"].mean, Some(1.0));
        assert_eq!(by_vendor["VendorB"].count, 1);
    }

    #[test]
    fn overall_stats_match_hand_computation() {
        let table = sample_rows();
        let indices: Vec<usize> = (0..table.len()).collect();
        let stats = overall(&table, &indices, &BTreeSet::new()).unwrap();

        assert!((stats.mean - 13.0 / 3.0).abs() < 1e-9);
        assert_eq!(stats.min, 1.0);
        assert_eq!(stats.max, 8.0);
    }

    #[test]
    fn filtered_out_groups_are_absent_not_zero() {
        let table = sample_rows();
        let mut criteria = FilterCriteria::all_of(&table);
        criteria.vendors.remove("VendorB");
        let indices = filter::apply(&table, &criteria);

        let by_vendor = by_dimension(&table, &indices, Dimension::Vendor);
        assert!(by_vendor.contains_key("VendorA"));
        assert!(!by_vendor.contains_key("VendorB"));
    }

    #[test]
    fn negative_sla_participates_in_the_mean() {
        let table = table_from(
            &["Tanggal Pembayaran", "Tanggal Verifikasi", "Vendor"],
            &[
                &["2024-03-10", "2024-03-08", "VendorA"],
                &["2024-03-01", "2024-03-05", "VendorA"],
            ],
        );
        let indices: Vec<usize> = (0..table.len()).collect();
        let by_vendor = by_dimension(&table, &indices, Dimension::Vendor);
        // (-2 + 4) / 2
        assert_eq!(by_vendor["VendorA"].mean, Some(1.0));

        let stats = overall(&table, &indices, &BTreeSet::new()).unwrap();
        assert_eq!(stats.min, -2.0);
    }

    #[test]
    fn empty_view_yields_no_data() {
        let table = sample_rows();
        assert!(overall(&table, &[], &BTreeSet::new()).is_none());
        assert!(by_dimension(&table, &[], Dimension::Vendor).is_empty());
        assert!(weekly_trend(&table, &[]).is_empty());
    }

    #[test]
    fn weekly_trend_is_ordered_chronologically() {
        let table = table_from(
            &["Tanggal Pembayaran", "Tanggal Verifikasi", "Vendor"],
            &[
                &["2024-03-20", "2024-03-22", "VendorA"],
                &["2024-01-01", "2024-01-05", "VendorA"],
                &["2023-12-28", "2023-12-30", "VendorA"],
            ],
        );
        let indices: Vec<usize> = (0..table.len()).collect();
        let trend = weekly_trend(&table, &indices);

        let buckets: Vec<&String> = trend.keys().collect();
        let mut sorted = buckets.clone();
        sorted.sort();
        assert_eq!(buckets, sorted);
        assert!(buckets.first().unwrap().starts_with("2023"));
    }

    #[test]
    fn bagian_means_are_independent_per_column() {
        let table = table_from(
            &["Periode", "Vendor", "Fungsional", "Keuangan"],
            &[
                &["Jan", "3", "2", ""],
                &["Feb", "5", "x", "7"],
            ],
        );
        let indices: Vec<usize> = (0..table.len()).collect();
        let selected: BTreeSet<String> = table.bagian_labels().into_iter().collect();
        let means = bagian_means(&table, &indices, &selected);

        assert_eq!(means["Vendor"].mean, Some(4.0));
        assert_eq!(means["Fungsional"].mean, Some(2.0));
        assert_eq!(means["Fungsional"].count, 1);
        assert_eq!(means["Keuangan"].mean, Some(7.0));
    }

    #[test]
    fn deselected_bagian_column_is_excluded() {
        let table = table_from(
            &["Periode", "Vendor", "Fungsional"],
            &[&["Jan", "3", "2"]],
        );
        let indices: Vec<usize> = (0..table.len()).collect();
        let selected: BTreeSet<String> = ["Vendor".to_string()].into_iter().collect();

        let means = bagian_means(&table, &indices, &selected);
        assert!(means.contains_key("Vendor"));
        assert!(!means.contains_key("Fungsional"));

        // Overall pools only the selected column.
        let stats = overall(&table, &indices, &selected).unwrap();
        assert_eq!(stats.mean, 3.0);
    }

    #[test]
    fn selected_but_empty_bagian_reports_no_data() {
        let table = table_from(&["Periode", "Vendor", "Keuangan"], &[&["Jan", "3", "x"]]);
        let indices: Vec<usize> = (0..table.len()).collect();
        let selected: BTreeSet<String> = table.bagian_labels().into_iter().collect();

        let means = bagian_means(&table, &indices, &selected);
        assert_eq!(means["Keuangan"].mean, None);
        assert_eq!(means["Keuangan"].count, 0);
    }
}

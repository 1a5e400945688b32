//! End-to-end pipeline tests: file on disk → loader → filter → aggregate →
//! CSV export → reparse.

use std::collections::BTreeSet;
use std::io::Write;

use sla_dash::data::aggregate::{self, Dimension};
use sla_dash::data::filter::{self, FilterCriteria};
use sla_dash::data::loader;
use sla_dash::data::model::InputShape;
use sla_dash::data::export;
use sla_dash::sample;

fn write_temp_csv(content: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::Builder::new()
        .suffix(".csv")
        .tempfile()
        .expect("creating temp file");
    file.write_all(content.as_bytes()).expect("writing temp file");
    file.flush().expect("flushing temp file");
    file
}

#[test]
fn date_shape_file_flows_through_the_whole_pipeline() {
    let file = write_temp_csv(
        "Tanggal Pembayaran,Tanggal Verifikasi,Vendor,Unit\n\
         2024-01-01,2024-01-05,VendorA,Unit X\n\
         2024-01-02,2024-01-10,VendorA,Unit Y\n\
         2024-01-03,2024-01-04,VendorB,Unit X\n\
         bad date,2024-01-04,VendorB,Unit X\n",
    );

    let table = loader::load_file(file.path()).expect("loading");
    assert_eq!(table.shape, InputShape::DateDifference);
    assert_eq!(table.raw_rows, 4);
    assert_eq!(table.len(), 3);

    // Default criteria keep everything.
    let criteria = FilterCriteria::all_of(&table);
    let indices = filter::apply(&table, &criteria);
    assert_eq!(indices.len(), table.len());

    // Narrow to Unit X and check the aggregates follow.
    let mut narrowed = criteria.clone();
    narrowed.units.remove("Unit Y");
    let indices = filter::apply(&table, &narrowed);
    assert_eq!(indices.len(), 2);

    let by_vendor = aggregate::by_dimension(&table, &indices, Dimension::Vendor);
    assert_eq!(by_vendor["VendorA"].mean, Some(4.0));
    assert_eq!(by_vendor["VendorB"].mean, Some(1.0));

    let stats = aggregate::overall(&table, &indices, &BTreeSet::new()).expect("stats");
    assert_eq!(stats.min, 1.0);
    assert_eq!(stats.max, 4.0);

    // Export the filtered view and reparse it.
    let csv_text = export::to_csv_string(&table, &indices).expect("export");
    let mut reader = csv::Reader::from_reader(csv_text.as_bytes());
    let rows: Vec<csv::StringRecord> = reader.records().map(|r| r.unwrap()).collect();
    assert_eq!(rows.len(), indices.len());
    assert!(rows.iter().all(|r| &r[1] == "Unit X"));
}

#[test]
fn precomputed_sheet_loads_and_aggregates() {
    let file = write_temp_csv(
        "Periode,Vendor,Fungsional,Keuangan,Perbendaharaan\n\
         Januari 2024,3.5,2,4,1.5\n\
         Februari 2024,4.5,3,5,2.5\n",
    );

    let table = loader::load_file(file.path()).expect("loading");
    assert_eq!(table.shape, InputShape::PrecomputedColumns);
    assert_eq!(table.bagian_labels().len(), 4);

    let criteria = FilterCriteria::all_of(&table);
    let indices = filter::apply(&table, &criteria);
    let means = aggregate::bagian_means(&table, &indices, &criteria.bagian);
    assert_eq!(means["Vendor"].mean, Some(4.0));
    assert_eq!(means["Fungsional"].mean, Some(2.5));

    // Overall pools every selected bagian cell.
    let stats = aggregate::overall(&table, &indices, &criteria.bagian).expect("stats");
    assert_eq!(stats.min, 1.5);
    assert_eq!(stats.max, 5.0);
}

#[test]
fn malformed_file_reports_the_missing_fields() {
    let file = write_temp_csv("Nomor,Keterangan\n1,foo\n");
    let err = loader::load_file(file.path()).unwrap_err();
    let msg = err.to_string();
    assert!(msg.contains("could not resolve required column"), "{msg}");
    assert!(msg.contains("payment_date"), "{msg}");
}

#[test]
fn generated_sample_data_loads_cleanly() {
    let mut buf = Vec::new();
    sample::write_records(&mut buf, 200, 42).expect("generating");

    let table = loader::load_bytes(&buf, "csv").expect("loading");
    assert_eq!(table.shape, InputShape::DateDifference);
    // Every generated row carries valid dates, a vendor and a unit, so
    // nothing is dropped at load.
    assert_eq!(table.raw_rows, 200);
    assert_eq!(table.len(), 200);
    assert_eq!(table.dropped_rows, 0);
    assert_eq!(table.vendors.len(), 5);
    assert_eq!(table.units.len(), 4);

    let criteria = FilterCriteria::all_of(&table);
    let indices = filter::apply(&table, &criteria);
    assert!(aggregate::overall(&table, &indices, &BTreeSet::new()).is_some());
}

#[test]
fn reloading_identical_content_returns_the_shared_table() {
    let content = "Tanggal Pembayaran,Tanggal Verifikasi,Vendor\n\
                   2024-05-01,2024-05-06,PT Shared\n";
    let a = write_temp_csv(content);
    let b = write_temp_csv(content);

    let first = loader::load_file(a.path()).expect("loading");
    let second = loader::load_file(b.path()).expect("loading");
    assert!(std::sync::Arc::ptr_eq(&first, &second));
}

use std::collections::BTreeMap;

use thiserror::Error;

use super::model::InputShape;

// ---------------------------------------------------------------------------
// Logical fields and their raw-header matchers
// ---------------------------------------------------------------------------

pub const FIELD_VENDOR: &str = "vendor";
pub const FIELD_UNIT: &str = "unit";
pub const FIELD_PERIOD: &str = "period";
pub const FIELD_PAYMENT_DATE: &str = "payment_date";
pub const FIELD_VERIFICATION_DATE: &str = "verification_date";

/// One fixed bagian category: a logical field plus the label shown in
/// charts and used as the key in `Record::bagian`.
pub struct BagianField {
    pub field: &'static str,
    pub label: &'static str,
}

/// The fixed bagian categories, in canonical display order.
pub const BAGIAN_FIELDS: [BagianField; 4] = [
    BagianField { field: "sla_vendor", label: "Vendor" },
    BagianField { field: "sla_fungsional", label: "Fungsional" },
    BagianField { field: "sla_keuangan", label: "Keuangan" },
    BagianField { field: "sla_perbendaharaan", label: "Perbendaharaan" },
];

/// Matcher for one logical field: exact aliases tried first, then
/// case-insensitive substring fallback. Both lists are pre-normalized
/// (lowercase, trimmed).
struct FieldSpec {
    field: &'static str,
    aliases: &'static [&'static str],
    substrings: &'static [&'static str],
}

const VENDOR_SPEC: FieldSpec = FieldSpec {
    field: FIELD_VENDOR,
    aliases: &["vendor", "nama vendor"],
    substrings: &["vendor"],
};
const UNIT_SPEC: FieldSpec = FieldSpec {
    field: FIELD_UNIT,
    aliases: &["unit", "unit kerja", "bagian"],
    substrings: &["unit"],
};
const PERIOD_SPEC: FieldSpec = FieldSpec {
    field: FIELD_PERIOD,
    aliases: &["periode", "period", "bulan"],
    substrings: &["periode"],
};
const PAYMENT_DATE_SPEC: FieldSpec = FieldSpec {
    field: FIELD_PAYMENT_DATE,
    aliases: &["tanggal pembayaran", "tgl pembayaran", "payment date"],
    substrings: &["pembayaran", "payment"],
};
const VERIFICATION_DATE_SPEC: FieldSpec = FieldSpec {
    field: FIELD_VERIFICATION_DATE,
    aliases: &["tanggal verifikasi", "tgl verifikasi", "verification date"],
    substrings: &["verifikasi", "verification"],
};

const BAGIAN_SPECS: [FieldSpec; 4] = [
    FieldSpec {
        field: "sla_vendor",
        aliases: &["vendor", "sla vendor"],
        substrings: &["vendor"],
    },
    FieldSpec {
        field: "sla_fungsional",
        aliases: &["fungsional", "sla fungsional"],
        substrings: &["fungsional"],
    },
    FieldSpec {
        field: "sla_keuangan",
        aliases: &["keuangan", "sla keuangan"],
        substrings: &["keuangan"],
    },
    FieldSpec {
        field: "sla_perbendaharaan",
        aliases: &["perbendaharaan", "sla perbendaharaan"],
        substrings: &["perbendaharaan"],
    },
];

// ---------------------------------------------------------------------------
// Resolution result
// ---------------------------------------------------------------------------

/// A source column matched to a logical field.
#[derive(Debug, Clone)]
pub struct ResolvedColumn {
    /// Zero-based column index in the source sheet.
    pub index: usize,
    /// Trimmed source header, kept verbatim for display and export.
    pub header: String,
}

/// Fixed mapping logical field → source column, produced once at load and
/// consumed by every downstream stage. Never re-resolved per row.
#[derive(Debug, Clone, Default)]
pub struct ResolvedSchema {
    mapping: BTreeMap<&'static str, ResolvedColumn>,
}

impl ResolvedSchema {
    pub fn get(&self, field: &str) -> Option<&ResolvedColumn> {
        self.mapping.get(field)
    }

    /// Source column index for a logical field, if it resolved.
    pub fn column(&self, field: &str) -> Option<usize> {
        self.mapping.get(field).map(|c| c.index)
    }

    /// Source header for a logical field, if it resolved.
    pub fn header(&self, field: &str) -> Option<&str> {
        self.mapping.get(field).map(|c| c.header.as_str())
    }

    fn insert(&mut self, field: &'static str, index: usize, header: &str) {
        self.mapping.insert(
            field,
            ResolvedColumn {
                index,
                header: header.trim().to_string(),
            },
        );
    }
}

/// Required column(s) could not be resolved after alias and substring
/// matching. Fatal to the load stage.
#[derive(Debug, Clone, Error)]
#[error("could not resolve required column(s): {}", .fields.join(", "))]
pub struct SchemaError {
    /// Logical field names that stayed unresolved.
    pub fields: Vec<String>,
}

// ---------------------------------------------------------------------------
// Resolution
// ---------------------------------------------------------------------------

/// Trim and lowercase a raw header for matching.
fn normalize_header(raw: &str) -> String {
    raw.trim().to_lowercase()
}

/// Find the column for one logical field. Exact alias match wins over
/// substring match; among several candidates the first in file-column
/// order wins and the choice is logged.
fn resolve_field(normalized: &[String], spec: &FieldSpec) -> Option<usize> {
    let exact: Vec<usize> = normalized
        .iter()
        .enumerate()
        .filter(|(_, h)| spec.aliases.contains(&h.as_str()))
        .map(|(i, _)| i)
        .collect();

    let candidates = if exact.is_empty() {
        normalized
            .iter()
            .enumerate()
            .filter(|(_, h)| spec.substrings.iter().any(|s| h.contains(s)))
            .map(|(i, _)| i)
            .collect()
    } else {
        exact
    };

    if candidates.len() > 1 {
        log::warn!(
            "field '{}' matches {} columns, using the first in file order (column {})",
            spec.field,
            candidates.len(),
            candidates[0]
        );
    }
    candidates.first().copied()
}

/// Resolve the raw headers into an [`InputShape`] and a fixed schema.
///
/// Both date columns present ⇒ `DateDifference`; otherwise a period column
/// plus at least one bagian column ⇒ `PrecomputedColumns`; otherwise a
/// [`SchemaError`] naming what is missing.
pub fn resolve(headers: &[String]) -> Result<(InputShape, ResolvedSchema), SchemaError> {
    let normalized: Vec<String> = headers.iter().map(|h| normalize_header(h)).collect();
    let mut schema = ResolvedSchema::default();

    let payment = resolve_field(&normalized, &PAYMENT_DATE_SPEC);
    let verification = resolve_field(&normalized, &VERIFICATION_DATE_SPEC);

    if let (Some(pay), Some(ver)) = (payment, verification) {
        schema.insert(FIELD_PAYMENT_DATE, pay, &headers[pay]);
        schema.insert(FIELD_VERIFICATION_DATE, ver, &headers[ver]);

        match resolve_field(&normalized, &VENDOR_SPEC) {
            Some(idx) => schema.insert(FIELD_VENDOR, idx, &headers[idx]),
            None => {
                return Err(SchemaError {
                    fields: vec![FIELD_VENDOR.to_string()],
                })
            }
        }
        // Unit is a filter dimension only when the sheet carries it.
        if let Some(idx) = resolve_field(&normalized, &UNIT_SPEC) {
            schema.insert(FIELD_UNIT, idx, &headers[idx]);
        }
        return Ok((InputShape::DateDifference, schema));
    }

    let period = resolve_field(&normalized, &PERIOD_SPEC);
    let bagian: Vec<(&'static str, usize)> = BAGIAN_SPECS
        .iter()
        .filter_map(|spec| resolve_field(&normalized, spec).map(|idx| (spec.field, idx)))
        .collect();

    if let (Some(per), false) = (period, bagian.is_empty()) {
        schema.insert(FIELD_PERIOD, per, &headers[per]);
        for (field, idx) in bagian {
            schema.insert(field, idx, &headers[idx]);
        }
        return Ok((InputShape::PrecomputedColumns, schema));
    }

    // Neither shape resolved: name everything still missing so the user
    // sees which logical fields the sheet failed to supply.
    let mut fields = Vec::new();
    if payment.is_none() {
        fields.push(FIELD_PAYMENT_DATE.to_string());
    }
    if verification.is_none() {
        fields.push(FIELD_VERIFICATION_DATE.to_string());
    }
    if period.is_none() {
        fields.push(FIELD_PERIOD.to_string());
    }
    if bagian.is_empty() {
        fields.push("bagian sla columns".to_string());
    }
    Err(SchemaError { fields })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn headers(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn resolves_date_difference_shape() {
        let (shape, schema) = resolve(&headers(&[
            "Tanggal Pembayaran",
            "Tanggal Verifikasi",
            "Vendor",
            "Unit",
        ]))
        .unwrap();
        assert_eq!(shape, InputShape::DateDifference);
        assert_eq!(schema.column(FIELD_PAYMENT_DATE), Some(0));
        assert_eq!(schema.column(FIELD_VERIFICATION_DATE), Some(1));
        assert_eq!(schema.column(FIELD_VENDOR), Some(2));
        assert_eq!(schema.column(FIELD_UNIT), Some(3));
        assert_eq!(schema.header(FIELD_VENDOR), Some("Vendor"));
    }

    #[test]
    fn resolves_despite_casing_and_whitespace() {
        let (shape, schema) = resolve(&headers(&[
            "  TANGGAL PEMBAYARAN ",
            "tanggal verifikasi",
            " vendor",
        ]))
        .unwrap();
        assert_eq!(shape, InputShape::DateDifference);
        assert_eq!(schema.column(FIELD_VENDOR), Some(2));
        // Display header keeps the source casing, trimmed.
        assert_eq!(schema.header(FIELD_PAYMENT_DATE), Some("TANGGAL PEMBAYARAN"));
    }

    #[test]
    fn substring_fallback_matches_periode_variants() {
        let (shape, schema) = resolve(&headers(&[
            "Periode Laporan",
            "Vendor",
            "Fungsional",
            "Keuangan",
            "Perbendaharaan",
        ]))
        .unwrap();
        assert_eq!(shape, InputShape::PrecomputedColumns);
        assert_eq!(schema.column(FIELD_PERIOD), Some(0));
        assert_eq!(schema.column("sla_fungsional"), Some(2));
        assert_eq!(schema.column("sla_perbendaharaan"), Some(4));
    }

    #[test]
    fn exact_alias_wins_over_substring() {
        // "Unit Pembayaran" contains the payment substring, but the exact
        // alias column must win.
        let (_, schema) = resolve(&headers(&[
            "Unit Pembayaran",
            "Tanggal Pembayaran",
            "Tanggal Verifikasi",
            "Vendor",
        ]))
        .unwrap();
        assert_eq!(schema.column(FIELD_PAYMENT_DATE), Some(1));
    }

    #[test]
    fn ambiguous_match_takes_first_in_file_order() {
        let (_, schema) = resolve(&headers(&[
            "Tanggal Pembayaran",
            "Tanggal Verifikasi",
            "Vendor Utama",
            "Vendor Cadangan",
        ]))
        .unwrap();
        assert_eq!(schema.column(FIELD_VENDOR), Some(2));
    }

    #[test]
    fn missing_columns_are_named() {
        let err = resolve(&headers(&["Nomor", "Keterangan"])).unwrap_err();
        assert!(err.fields.contains(&FIELD_PAYMENT_DATE.to_string()));
        assert!(err.fields.contains(&FIELD_PERIOD.to_string()));
        let msg = err.to_string();
        assert!(msg.contains("payment_date"));
    }

    #[test]
    fn date_shape_without_vendor_fails() {
        let err = resolve(&headers(&["Tanggal Pembayaran", "Tanggal Verifikasi"])).unwrap_err();
        assert_eq!(err.fields, vec![FIELD_VENDOR.to_string()]);
    }
}

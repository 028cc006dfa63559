//! Substring filtering over loaded records.

use crate::models::Record;
use crate::normalize::Normalization;

/// Keeps records with at least one field whose normalized text contains the
/// normalized `term`.
///
/// The term and every field value go through the same `strategy`. A term
/// that normalizes to the empty string returns `records` unchanged.
pub fn filter_records(records: Vec<Record>, term: &str, strategy: Normalization) -> Vec<Record> {
    let needle = strategy.apply(term);
    if needle.is_empty() {
        return records;
    }
    records
        .into_iter()
        .filter(|record| record_matches(record, &needle, strategy))
        .collect()
}

/// Applies `terms` left to right; each pass narrows the previous result.
///
/// Returns the survivors along with the record count after each pass.
pub fn apply_filters<S: AsRef<str>>(
    records: Vec<Record>,
    terms: &[S],
    strategy: Normalization,
) -> (Vec<Record>, Vec<usize>) {
    let mut counts = Vec::with_capacity(terms.len());
    let mut current = records;
    for term in terms {
        current = filter_records(current, term.as_ref(), strategy);
        counts.push(current.len());
    }
    (current, counts)
}

/// True when any field of `record` contains the already-normalized `needle`.
pub fn record_matches(record: &Record, needle: &str, strategy: Normalization) -> bool {
    record
        .values()
        .any(|value| strategy.apply_value(value).contains(needle))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn rec(value: serde_json::Value) -> Record {
        value.as_object().cloned().unwrap()
    }

    fn fruit() -> Vec<Record> {
        vec![rec(json!({"name": "Táo xanh"})), rec(json!({"name": "Cam"}))]
    }

    fn stores() -> Vec<Record> {
        vec![
            rec(json!({"store": "Cửa Hàng Kim Khí Kim Phương (Phù Cát)", "month": "Tháng 5", "kpi": 92})),
            rec(json!({"store": "Cửa Hàng Kim Khí Kim Phương (Phù Cát)", "month": "Tháng 6", "kpi": 88})),
            rec(json!({"store": "Đại lý Hoà Bình", "month": "Tháng 5", "kpi": 75})),
        ]
    }

    #[test]
    fn test_diacritic_folding_matches_unaccented_term() {
        let out = filter_records(fruit(), "tao", Normalization::DiacriticFolding);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0]["name"], "Táo xanh");
    }

    #[test]
    fn test_whitespace_only_does_not_fold() {
        let out = filter_records(fruit(), "tao", Normalization::WhitespaceOnly);
        assert!(out.is_empty());
        let out = filter_records(fruit(), "Táo X", Normalization::WhitespaceOnly);
        assert_eq!(out.len(), 1);
    }

    #[test]
    fn test_empty_term_returns_input_unchanged() {
        let input = stores();
        let out = filter_records(input.clone(), "", Normalization::DiacriticFolding);
        assert_eq!(out, input);
        let out = filter_records(input.clone(), "  ", Normalization::WhitespaceOnly);
        assert_eq!(out.len(), input.len());
    }

    #[test]
    fn test_numbers_match_by_decimal_form() {
        let out = filter_records(stores(), "92", Normalization::DiacriticFolding);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0]["kpi"], 92);
    }

    #[test]
    fn test_filtering_is_idempotent() {
        for term in ["thang5", "phu cat", "hoa", "zzz"] {
            let once = filter_records(stores(), term, Normalization::DiacriticFolding);
            let twice = filter_records(once.clone(), term, Normalization::DiacriticFolding);
            assert_eq!(once, twice, "term {}", term);
        }
    }

    #[test]
    fn test_apply_filters_is_order_invariant() {
        let terms = ["thang5", "cuahangkimkhikimphuongphucat"];
        let (ab, counts_ab) = apply_filters(stores(), &terms, Normalization::DiacriticFolding);
        let reversed = [terms[1], terms[0]];
        let (ba, counts_ba) = apply_filters(stores(), &reversed, Normalization::DiacriticFolding);
        assert_eq!(ab, ba);
        assert_eq!(ab.len(), 1);
        assert_eq!(ab[0]["kpi"], 92);
        assert_eq!(counts_ab, vec![2, 1]);
        assert_eq!(counts_ba, vec![2, 1]);
    }

    #[test]
    fn test_apply_no_filters() {
        let (out, counts) = apply_filters::<&str>(stores(), &[], Normalization::DiacriticFolding);
        assert_eq!(out.len(), 3);
        assert!(counts.is_empty());
    }

    #[test]
    fn test_nested_values_are_searched() {
        let records = vec![rec(json!({"meta": {"region": "Bình Định"}})), rec(json!({"meta": null}))];
        let out = filter_records(records, "binh dinh", Normalization::DiacriticFolding);
        assert_eq!(out.len(), 1);
    }
}

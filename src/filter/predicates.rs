//! Pure predicate functions for filtering records.
//!
//! Each predicate checks one field against one setting of a
//! [`FilterPredicateSet`](super::FilterPredicateSet). A disabled setting
//! always passes. An enabled setting fails a record that lacks the field.

use chrono::{NaiveDate, NaiveDateTime, NaiveTime, TimeDelta};

/// Sentinel that disables an equality predicate.
pub const ALL: &str = "all";

/// Whether an equality setting is active.
#[inline]
pub fn is_enabled(setting: &str) -> bool {
    !setting.is_empty() && setting != ALL
}

/// Exact equality against an optional record field.
#[inline]
pub fn matches_equality(setting: &str, value: Option<&str>) -> bool {
    !is_enabled(setting) || value == Some(setting)
}

/// Case-insensitive substring search over searchable fields.
///
/// `needle` must already be lowercased; an empty needle passes.
pub fn matches_search<'a>(needle: &str, fields: impl IntoIterator<Item = Option<&'a str>>) -> bool {
    needle.is_empty()
        || fields
            .into_iter()
            .flatten()
            .any(|field| field.to_lowercase().contains(needle))
}

/// Start of the given day.
pub fn start_of_day(date: NaiveDate) -> NaiveDateTime {
    date.and_time(NaiveTime::MIN)
}

/// Last representable millisecond of the given day (23:59:59.999).
pub fn end_of_day(date: NaiveDate) -> NaiveDateTime {
    start_of_day(date) + TimeDelta::milliseconds(86_399_999)
}

/// Inclusive range check; either bound may be open.
pub fn matches_date_range(
    from: Option<NaiveDateTime>,
    to: Option<NaiveDateTime>,
    value: Option<NaiveDateTime>,
) -> bool {
    if from.is_none() && to.is_none() {
        return true;
    }
    let Some(value) = value else {
        return false;
    };
    from.is_none_or(|from| value >= from) && to.is_none_or(|to| value <= to)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_all_and_empty_disable_equality() {
        assert!(matches_equality("all", Some("FAILURE")));
        assert!(matches_equality("", None));
        assert!(matches_equality("FAILURE", Some("FAILURE")));
        assert!(!matches_equality("FAILURE", Some("SUCCESS")));
        assert!(!matches_equality("FAILURE", None));
    }

    #[test]
    fn test_equality_is_case_sensitive() {
        assert!(!matches_equality("failure", Some("FAILURE")));
    }

    #[test]
    fn test_search_case_insensitive_across_fields() {
        assert!(matches_search("rent", [Some("T-100"), Some("Rent Roll Upload")]));
        assert!(matches_search("t-1", [Some("T-100"), None]));
        assert!(!matches_search("ledger", [Some("T-100"), Some("Rent Roll")]));
        assert!(matches_search("", [None, None]));
    }

    #[test]
    fn test_end_of_day_is_last_millisecond() {
        let end = end_of_day(date(2024, 3, 31));
        assert_eq!(end.to_string(), "2024-03-31 23:59:59.999");
    }

    #[test]
    fn test_same_day_upper_bound_includes_whole_day() {
        let day = date(2024, 3, 31);
        let late = day.and_hms_opt(23, 59, 59).unwrap();
        let next = date(2024, 4, 1).and_hms_opt(0, 0, 0).unwrap();
        assert!(matches_date_range(Some(start_of_day(day)), Some(end_of_day(day)), Some(late)));
        assert!(!matches_date_range(None, Some(end_of_day(day)), Some(next)));
    }

    #[test]
    fn test_lower_bound_inclusive() {
        let day = date(2024, 1, 1);
        assert!(matches_date_range(Some(start_of_day(day)), None, Some(start_of_day(day))));
        let before = start_of_day(day) - TimeDelta::milliseconds(1);
        assert!(!matches_date_range(Some(start_of_day(day)), None, Some(before)));
    }

    #[test]
    fn test_enabled_range_rejects_undated_record() {
        assert!(!matches_date_range(Some(start_of_day(date(2024, 1, 1))), None, None));
        assert!(matches_date_range(None, None, None));
    }
}

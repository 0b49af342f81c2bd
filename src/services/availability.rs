use std::collections::BTreeSet;

use chrono::NaiveDate;

/// `false` iff `candidate` is one of the blocked calendar dates.
pub fn is_available(candidate: NaiveDate, blocked: &BTreeSet<NaiveDate>) -> bool {
    !blocked.contains(&candidate)
}

/// An absent date always passes. On conflict the offending date is returned
/// so callers can name it.
pub fn check_availability(
    candidate: Option<NaiveDate>,
    blocked: &BTreeSet<NaiveDate>,
) -> Result<(), NaiveDate> {
    match candidate {
        Some(date) if !is_available(date, blocked) => Err(date),
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn blocked(dates: &[&str]) -> BTreeSet<NaiveDate> {
        dates.iter().map(|d| date(d)).collect()
    }

    #[test]
    fn test_every_blocked_date_is_unavailable() {
        let set = blocked(&["2025-12-24", "2025-12-25", "2026-01-01"]);
        for d in &set {
            assert!(!is_available(*d, &set), "{d} should be unavailable");
        }
    }

    #[test]
    fn test_unblocked_dates_are_available() {
        let set = blocked(&["2025-12-25"]);
        assert!(is_available(date("2025-12-26"), &set));
        assert!(is_available(date("2024-12-25"), &set));
        assert!(is_available(date("2025-12-25"), &BTreeSet::new()));
    }

    #[test]
    fn test_absent_date_always_passes() {
        let set = blocked(&["2025-12-25", "2025-12-31"]);
        assert_eq!(check_availability(None, &set), Ok(()));
    }

    #[test]
    fn test_conflict_names_the_date() {
        let set = blocked(&["2025-12-25"]);
        assert_eq!(
            check_availability(Some(date("2025-12-25")), &set),
            Err(date("2025-12-25"))
        );
        assert_eq!(check_availability(Some(date("2025-12-26")), &set), Ok(()));
    }
}

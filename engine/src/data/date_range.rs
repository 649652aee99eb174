// Resolution of relative/absolute date inputs into a concrete (from, to) window.
use chrono::{DateTime, Days, Utc};
use shared::models::DateRange;
use shared::utils::format_date;

use crate::error::{EngineError, Result};

pub const DEFAULT_DAYS_FROM_NOW: u32 = 30;

/// Turns `days_from_now` / `from_date` / `to_date` into a `DateRange`.
///
/// Precedence, first match wins:
/// 1. nothing given: a window of `default_days` ending today;
/// 2. `days_from_now` given: a window of that many days ending today, any
///    explicit bounds are ignored. `Some(0)` counts as given and yields
///    `(today, today)`;
/// 3. `to_date` without `from_date`: `InvalidRange`;
/// 4. `from_date` without `to_date`: open-ended up to today;
/// 5. both bounds: returned unchanged (no ordering check).
///
/// "Today" is the UTC date of the injected `now`.
#[derive(Debug, Clone, Copy)]
pub struct DateRangeResolver {
    default_days: u32,
}

impl DateRangeResolver {
    pub fn new(default_days: u32) -> Self {
        Self { default_days }
    }

    pub fn default_days(&self) -> u32 {
        self.default_days
    }

    pub fn resolve(
        &self,
        days_from_now: Option<u32>,
        from_date: Option<&str>,
        to_date: Option<&str>,
    ) -> Result<DateRange> {
        self.resolve_at(Utc::now(), days_from_now, from_date, to_date)
    }

    pub fn resolve_at(
        &self,
        now: DateTime<Utc>,
        days_from_now: Option<u32>,
        from_date: Option<&str>,
        to_date: Option<&str>,
    ) -> Result<DateRange> {
        // Blank strings count as absent.
        let from_date = from_date.filter(|s| !s.trim().is_empty());
        let to_date = to_date.filter(|s| !s.trim().is_empty());

        let days = match (days_from_now, from_date, to_date) {
            (None, None, None) => Some(self.default_days),
            (days, _, _) => days,
        };

        let today = now.date_naive();

        if let Some(days) = days {
            if from_date.is_some() || to_date.is_some() {
                tracing::debug!(days, ?from_date, ?to_date, "Relative window overrides explicit date bounds");
            }
            let start = today.checked_sub_days(Days::new(u64::from(days))).ok_or_else(|| {
                EngineError::InvalidRange(format!("{} days before {} is out of range", days, format_date(today)))
            })?;
            return Ok(DateRange::new(format_date(start), format_date(today)));
        }

        match (from_date, to_date) {
            (None, Some(to)) => Err(EngineError::InvalidRange(format!(
                "to_date '{}' given without from_date; a lower bound is required",
                to
            ))),
            (Some(from), None) => Ok(DateRange::new(from, format_date(today))),
            (Some(from), Some(to)) => Ok(DateRange::new(from, to)),
            // Unreachable: all-absent input was defaulted above.
            (None, None) => Err(EngineError::InvalidRange("no date bounds given".to_string())),
        }
    }
}

impl Default for DateRangeResolver {
    fn default() -> Self {
        Self::new(DEFAULT_DAYS_FROM_NOW)
    }
}

/// Resolves against the wall clock with the default 30 day window.
pub fn resolve_date_range(
    days_from_now: Option<u32>,
    from_date: Option<&str>,
    to_date: Option<&str>,
) -> Result<DateRange> {
    DateRangeResolver::default().resolve(days_from_now, from_date, to_date)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 10, 15, 9, 30, 0).unwrap()
    }

    #[test]
    fn test_defaults_to_thirty_days() {
        let range = DateRangeResolver::default().resolve_at(now(), None, None, None).unwrap();
        assert_eq!(range.as_tuple(), ("15/09/2026", "15/10/2026"));
    }

    #[test]
    fn test_days_from_now() {
        let range = DateRangeResolver::default().resolve_at(now(), Some(6), None, None).unwrap();
        assert_eq!(range.as_tuple(), ("09/10/2026", "15/10/2026"));
    }

    #[test]
    fn test_days_from_now_overrides_explicit_bounds() {
        let range = DateRangeResolver::default()
            .resolve_at(now(), Some(6), Some("01/01/2020"), Some("01/02/2020"))
            .unwrap();
        assert_eq!(range.as_tuple(), ("09/10/2026", "15/10/2026"));
    }

    #[test]
    fn test_zero_days_is_today_only() {
        let range = DateRangeResolver::default()
            .resolve_at(now(), Some(0), Some("01/09/2020"), None)
            .unwrap();
        assert_eq!(range.as_tuple(), ("15/10/2026", "15/10/2026"));
    }

    #[test]
    fn test_from_date_only_runs_to_today() {
        let range = DateRangeResolver::default()
            .resolve_at(now(), None, Some("01/09/2020"), None)
            .unwrap();
        assert_eq!(range.as_tuple(), ("01/09/2020", "15/10/2026"));
    }

    #[test]
    fn test_to_date_only_is_invalid() {
        let result = DateRangeResolver::default().resolve_at(now(), None, None, Some("01/09/2020"));
        assert!(matches!(result, Err(EngineError::InvalidRange(_))));
    }

    #[test]
    fn test_explicit_bounds_pass_through_unordered() {
        let range = DateRangeResolver::default()
            .resolve_at(now(), None, Some("01/09/2021"), Some("01/09/2020"))
            .unwrap();
        assert_eq!(range.as_tuple(), ("01/09/2021", "01/09/2020"));
    }

    #[test]
    fn test_custom_default_window() {
        let range = DateRangeResolver::new(10).resolve_at(now(), None, None, None).unwrap();
        assert_eq!(range.as_tuple(), ("05/10/2026", "15/10/2026"));
    }

    #[test]
    fn test_blank_strings_count_as_absent() {
        let range = DateRangeResolver::default().resolve_at(now(), None, Some(""), Some(" ")).unwrap();
        assert_eq!(range.as_tuple(), ("15/09/2026", "15/10/2026"));
    }

    #[test]
    fn test_wall_clock_resolution_ends_today() {
        let range = resolve_date_range(None, None, None).unwrap();
        assert_eq!(range.as_tuple().1, format_date(Utc::now().date_naive()));
    }
}

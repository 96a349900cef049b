use crate::error::RangeError;
use chrono::{Days, NaiveDate};
use std::fmt;

/// Widest span the NeoWs feed accepts in a single request.
pub const MAX_SPAN_DAYS: i64 = 7;

/// Inclusive calendar date range for one feed request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    start: NaiveDate,
    end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self, RangeError> {
        if end < start {
            return Err(RangeError::Reversed { start, end });
        }
        let days = (end - start).num_days();
        if days > MAX_SPAN_DAYS {
            return Err(RangeError::TooWide { days, max: MAX_SPAN_DAYS });
        }
        Ok(Self { start, end })
    }

    /// Seven calendar days starting at `start` (start + 6).
    pub fn week_from(start: NaiveDate) -> Self {
        let end = start.checked_add_days(Days::new(6)).unwrap_or(start);
        Self { start, end }
    }

    /// Parse two `YYYY-MM-DD` strings and validate the span.
    pub fn parse(start: &str, end: &str) -> Result<Self, RangeError> {
        Self::new(parse_iso(start)?, parse_iso(end)?)
    }

    pub fn start(&self) -> NaiveDate {
        self.start
    }

    pub fn end(&self) -> NaiveDate {
        self.end
    }

    /// Number of calendar days covered, both ends included.
    pub fn day_count(&self) -> i64 {
        (self.end() - self.start()).num_days() + 1
    }

    pub fn start_iso(&self) -> String {
        self.start.format("%Y-%m-%d").to_string()
    }

    pub fn end_iso(&self) -> String {
        self.end.format("%Y-%m-%d").to_string()
    }
}

impl fmt::Display for DateRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} to {}", self.start_iso(), self.end_iso())
    }
}

fn parse_iso(s: &str) -> Result<NaiveDate, RangeError> {
    NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d").map_err(|_| RangeError::InvalidDate(s.trim().to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_seven_day_span_is_accepted() {
        let range = DateRange::new(date(2025, 1, 1), date(2025, 1, 7)).unwrap();
        assert_eq!(range.start_iso(), "2025-01-01");
        assert_eq!(range.end_iso(), "2025-01-07");
        assert_eq!(range.day_count(), 7);
        assert_eq!(DateRange::week_from(date(2025, 1, 1)), range);
    }

    #[test]
    fn test_reversed_and_wide_ranges_are_rejected() {
        assert!(matches!(
            DateRange::new(date(2025, 1, 7), date(2025, 1, 1)),
            Err(RangeError::Reversed { .. })
        ));
        assert!(matches!(
            DateRange::new(date(2025, 1, 1), date(2025, 1, 20)),
            Err(RangeError::TooWide { days: 19, .. })
        ));
    }

    #[test]
    fn test_week_from_crosses_month_boundary() {
        let range = DateRange::week_from(date(2025, 1, 28));
        assert_eq!(range.end(), date(2025, 2, 3));
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(DateRange::parse("2025-01-01", "2025-01-03").is_ok());
        assert!(matches!(
            DateRange::parse("01/01/2025", "2025-01-03"),
            Err(RangeError::InvalidDate(_))
        ));
    }
}

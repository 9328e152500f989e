use super::error::FormatError;
use chrono::{Datelike, Months, NaiveDate};
use std::fmt;
use std::str::FromStr;

const MONTH_FIELD: &str = "UTCDate";

/// A calendar month written as `YYYY.MM`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MonthLabel {
    year: i32,
    month: u32,
}

impl MonthLabel {
    pub fn new(year: i32, month: u32) -> Option<Self> {
        NaiveDate::from_ymd_opt(year, month, 1).map(Self::from_first_day)
    }

    fn from_first_day(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
        }
    }

    fn first_day(self) -> NaiveDate {
        // Constructed only from valid dates.
        NaiveDate::from_ymd_opt(self.year, self.month, 1).unwrap_or_default()
    }

    /// Parses the `YYYY.MM` prefix of a PGN date such as `2021.03.14`.
    pub fn from_date_prefix(raw: &str) -> Result<Self, FormatError> {
        let s = raw.trim();
        let Some(prefix) = s.get(..7) else {
            return Err(FormatError::new(MONTH_FIELD, s, "shorter than YYYY.MM"));
        };
        prefix
            .parse()
            .map_err(|e: FormatError| FormatError::new(MONTH_FIELD, s, e.reason))
    }

    pub fn prev(self) -> Self {
        self.first_day()
            .checked_sub_months(Months::new(1))
            .map(Self::from_first_day)
            .unwrap_or(self)
    }

    pub fn next(self) -> Self {
        self.first_day()
            .checked_add_months(Months::new(1))
            .map(Self::from_first_day)
            .unwrap_or(self)
    }
}

impl FromStr for MonthLabel {
    type Err = FormatError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = |reason: String| FormatError::new(MONTH_FIELD, s, reason);

        let Some((year, month)) = s.split_once('.') else {
            return Err(invalid("expected YYYY.MM".to_string()));
        };
        if year.len() != 4 || month.len() != 2 {
            return Err(invalid("expected YYYY.MM".to_string()));
        }

        let year = year
            .parse::<i32>()
            .map_err(|e| invalid(format!("year: {e}")))?;
        let month = month
            .parse::<u32>()
            .map_err(|e| invalid(format!("month: {e}")))?;

        Self::new(year, month).ok_or_else(|| invalid("month out of range".to_string()))
    }
}

impl fmt::Display for MonthLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}.{:02}", self.year, self.month)
    }
}

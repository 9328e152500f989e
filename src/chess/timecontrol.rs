use super::error::FormatError;
use std::fmt;
use std::str::FromStr;

const TIME_CONTROL_FIELD: &str = "TimeControl";
const UNTIMED_SENTINEL: &str = "-";

/// A `start+increment` time control in seconds, or the untimed sentinel `-`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TimeControlSpec {
    pub untimed: bool,
    pub start_seconds: u32,
    pub increment_seconds: u32,
}

impl TimeControlSpec {
    pub const UNTIMED: Self = Self {
        untimed: true,
        start_seconds: 0,
        increment_seconds: 0,
    };

    pub fn timed(start_seconds: u32, increment_seconds: u32) -> Self {
        Self {
            untimed: false,
            start_seconds,
            increment_seconds,
        }
    }

    pub fn parse(raw: &str) -> Result<Self, FormatError> {
        let s = raw.trim();
        if s == UNTIMED_SENTINEL {
            return Ok(Self::UNTIMED);
        }

        let Some((start, increment)) = s.split_once('+') else {
            return Err(FormatError::new(
                TIME_CONTROL_FIELD,
                s,
                "missing '+' separator",
            ));
        };

        let start_seconds = start.parse::<u32>().map_err(|e| {
            FormatError::new(TIME_CONTROL_FIELD, s, format!("start: {e}"))
        })?;
        let increment_seconds = increment.parse::<u32>().map_err(|e| {
            FormatError::new(TIME_CONTROL_FIELD, s, format!("increment: {e}"))
        })?;

        Ok(Self::timed(start_seconds, increment_seconds))
    }
}

impl FromStr for TimeControlSpec {
    type Err = FormatError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for TimeControlSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.untimed {
            f.write_str(UNTIMED_SENTINEL)
        } else {
            write!(f, "{}+{}", self.start_seconds, self.increment_seconds)
        }
    }
}

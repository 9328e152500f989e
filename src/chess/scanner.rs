//! Line-oriented scanner pairing each movetext line with the latest `TimeControl` and
//! `UTCDate` tags.

use super::error::FormatError;
use super::month::MonthLabel;
use super::timecontrol::TimeControlSpec;
use super::types::GameRecord;
use std::sync::LazyLock;

static TAG_LINE_RE: LazyLock<regex::Regex> = LazyLock::new(|| {
    regex::Regex::new(r#"^\[\s*([A-Za-z0-9_]+)\s+"(.*)"\s*\]$"#).expect("valid tag line regex")
});

const TIME_CONTROL_TAG: &str = "TimeControl";
const UTC_DATE_TAG: &str = "UTCDate";

const BYTE_ORDER_MARK: char = '\u{feff}';

#[derive(Debug, Default)]
struct TagState {
    time_control: Option<String>,
    utc_date: Option<String>,
    /// Set when a known tag line of the current game failed to parse.
    poisoned: bool,
}

impl TagState {
    fn slot(&mut self, key: &str) -> Option<&mut Option<String>> {
        match key {
            TIME_CONTROL_TAG => Some(&mut self.time_control),
            UTC_DATE_TAG => Some(&mut self.utc_date),
            _ => None,
        }
    }

    fn set_known_tag(&mut self, key: &str, value: &str) {
        if let Some(slot) = self.slot(key) {
            *slot = Some(value.to_string());
        }
    }

    /// Forgets the tag value and drops the game's movetext line.
    fn poison(&mut self, key: &str) {
        if let Some(slot) = self.slot(key) {
            *slot = None;
        }
        self.poisoned = true;
    }
}

/// Returns the `TimeControl`/`UTCDate` field name when `trimmed` opens one of those tags.
fn known_tag_field(trimmed: &str) -> Option<&'static str> {
    let name = trimmed
        .strip_prefix('[')?
        .trim_start()
        .split(|c: char| c.is_whitespace() || c == '"' || c == ']')
        .next()
        .unwrap_or_default();

    match name {
        TIME_CONTROL_TAG => Some(TIME_CONTROL_TAG),
        UTC_DATE_TAG => Some(UTC_DATE_TAG),
        _ => None,
    }
}

/// Scanner state for one input stream. Tag values persist across games until a later
/// tag of the same kind replaces them.
///
/// A malformed `TimeControl` or `UTCDate` tag line clears that tag and discards the
/// next movetext line, so the broken game is never counted under the previous tags.
#[derive(Debug, Default)]
pub struct RecordScanner {
    tags: TagState,
    line_number: usize,
}

impl RecordScanner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of lines fed so far.
    pub fn line_number(&self) -> usize {
        self.line_number
    }

    /// Consumes one physical line; returns a record when the line is movetext.
    pub fn feed(&mut self, line: &str) -> Result<Option<GameRecord>, FormatError> {
        self.line_number += 1;
        let mut line = line.trim_end_matches(['\r', '\n']);
        if self.line_number == 1 {
            line = line.strip_prefix(BYTE_ORDER_MARK).unwrap_or(line);
        }

        if line.trim().is_empty() {
            return Ok(None);
        }

        if line.starts_with('[') {
            self.read_tag(line)
                .map_err(|e| e.at_line(self.line_number))?;
            return Ok(None);
        }

        if self.tags.poisoned {
            self.tags.poisoned = false;
            return Ok(None);
        }

        self.emit(line)
            .map(Some)
            .map_err(|e| e.at_line(self.line_number))
    }

    /// Like [`RecordScanner::feed`] for raw bytes. Movetext is decoded lossily; a known
    /// tag line that is not valid UTF-8 is an error quoting the original bytes.
    pub fn feed_bytes(&mut self, raw: &[u8]) -> Result<Option<GameRecord>, FormatError> {
        match std::str::from_utf8(raw) {
            Ok(line) => self.feed(line),
            Err(_) => self.feed_invalid_utf8(raw),
        }
    }

    fn feed_invalid_utf8(&mut self, raw: &[u8]) -> Result<Option<GameRecord>, FormatError> {
        let lossy = String::from_utf8_lossy(raw);
        let Some(field) = known_tag_field(lossy.trim_start_matches(BYTE_ORDER_MARK).trim())
        else {
            return self.feed(&lossy);
        };

        self.line_number += 1;
        self.tags.poison(field);
        Err(FormatError::new(
            field,
            &raw.trim_ascii().escape_ascii().to_string(),
            "tag line is not valid UTF-8",
        )
        .at_line(self.line_number))
    }

    fn read_tag(&mut self, line: &str) -> Result<(), FormatError> {
        let trimmed = line.trim();
        if let Some(caps) = TAG_LINE_RE.captures(trimmed) {
            self.tags.set_known_tag(&caps[1], &caps[2]);
            return Ok(());
        }

        match known_tag_field(trimmed) {
            Some(field) => {
                self.tags.poison(field);
                Err(FormatError::new(field, trimmed, "malformed tag line"))
            }
            None => Ok(()),
        }
    }

    fn emit(&self, movetext: &str) -> Result<GameRecord, FormatError> {
        let Some(time_control) = self.tags.time_control.as_deref() else {
            return Err(FormatError::new(
                TIME_CONTROL_TAG,
                "",
                "movetext before any TimeControl tag",
            ));
        };
        let Some(utc_date) = self.tags.utc_date.as_deref() else {
            return Err(FormatError::new(
                UTC_DATE_TAG,
                "",
                "movetext before any UTCDate tag",
            ));
        };

        Ok(GameRecord {
            time_control: TimeControlSpec::parse(time_control)?,
            month: MonthLabel::from_date_prefix(utc_date)?,
            movetext: movetext.to_string(),
            line_number: self.line_number,
        })
    }
}

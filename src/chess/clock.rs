//! `[%clk h:mm:ss]` annotations embedded in movetext comments.

use super::error::FormatError;

const CLOCK_MARKER: &str = "%clk";

/// Converts an `h:mm:ss` remaining-clock value into whole seconds.
pub fn clock_to_seconds(raw: &str) -> Result<u32, FormatError> {
    let s = raw.trim();
    let mut fields = s.split(':');

    let (Some(h), Some(m), Some(sec), None) =
        (fields.next(), fields.next(), fields.next(), fields.next())
    else {
        return Err(FormatError::new(
            CLOCK_MARKER,
            s,
            "expected three ':'-separated fields",
        ));
    };

    let parse_field = |field: &str| {
        field
            .parse::<u32>()
            .map_err(|e| FormatError::new(CLOCK_MARKER, s, format!("{e}")))
    };

    let hours = parse_field(h)?;
    let minutes = parse_field(m)?;
    let seconds = parse_field(sec)?;

    hours
        .checked_mul(3600)
        .and_then(|v| v.checked_add(minutes.checked_mul(60)?))
        .and_then(|v| v.checked_add(seconds))
        .ok_or_else(|| FormatError::new(CLOCK_MARKER, s, "clock value out of range"))
}

/// Byte offsets of every `%clk` marker, in text order.
pub fn annotation_offsets(movetext: &str) -> impl Iterator<Item = usize> + '_ {
    movetext.match_indices(CLOCK_MARKER).map(|(pos, _)| pos)
}

/// Reads the clock value of the marker starting at `pos`, up to the closing `]`.
pub fn read_annotation_at(movetext: &str, pos: usize) -> Result<u32, FormatError> {
    let rest = &movetext[pos + CLOCK_MARKER.len()..];
    let Some(end) = rest.find(']') else {
        let snippet: String = rest.trim().chars().take(16).collect();
        return Err(FormatError::new(
            CLOCK_MARKER,
            &snippet,
            "missing closing bracket",
        ));
    };

    clock_to_seconds(&rest[..end])
}

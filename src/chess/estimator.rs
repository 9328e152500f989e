//! Wall-clock time spent on one game, reconstructed from the time control and the final
//! `%clk` annotations.
//!
//! Each player's clock starts at `start` and gains `increment` per move, so the time both
//! players actually used is `2*start + increment*(white_moves + black_moves)` minus the
//! two clocks left at the end.

use super::clock::{annotation_offsets, read_annotation_at};
use super::error::FormatError;
use super::timecontrol::TimeControlSpec;
use serde_json::json;

const MOVETEXT_FIELD: &str = "movetext";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct GameTimeEstimate {
    pub seconds_used: u64,
    pub white_moves: u32,
    pub black_moves: u32,
    pub budget_seconds: u64,
    pub remaining_seconds: u64,
    pub untimed: bool,
    /// Black never moved, so there is nothing meaningful to estimate.
    pub short_game: bool,
}

impl GameTimeEstimate {
    fn untimed() -> Self {
        Self {
            untimed: true,
            ..Self::default()
        }
    }

    fn short_game(white_moves: u32, black_moves: u32) -> Self {
        Self {
            white_moves,
            black_moves,
            short_game: true,
            ..Self::default()
        }
    }

    pub fn hours_used(&self) -> f64 {
        self.seconds_used as f64 / 3600.0
    }

    pub fn to_json(&self) -> String {
        json!({
            "untimed": self.untimed,
            "short_game": self.short_game,
            "white_moves": self.white_moves,
            "black_moves": self.black_moves,
            "budget_seconds": self.budget_seconds,
            "remaining_seconds": self.remaining_seconds,
            "seconds_used": self.seconds_used,
            "hours_used": self.hours_used(),
        })
        .to_string()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct MoveMarker {
    number: u32,
    /// Byte offset just past the marker's dot.
    end: usize,
}

/// Finds the last full-move marker (`12.` or `12.Nf3`).
///
/// Black continuation markers (`12...`) and decimals inside comments (`%eval 0.25`) are
/// not full-move markers.
fn last_full_move_marker(movetext: &str) -> Option<MoveMarker> {
    let bytes = movetext.as_bytes();
    let mut found = None;
    let mut i = 0;

    while i < bytes.len() {
        let at_token_start = i == 0 || bytes[i - 1].is_ascii_whitespace();
        if !at_token_start || !bytes[i].is_ascii_digit() {
            i += 1;
            continue;
        }

        let digits_end = i + bytes[i..].iter().take_while(|b| b.is_ascii_digit()).count();
        let dots = bytes[digits_end..]
            .iter()
            .take_while(|&&b| b == b'.')
            .count();
        let end = digits_end + dots;
        let followed_by_digit = bytes.get(end).is_some_and(u8::is_ascii_digit);

        if dots == 1
            && !followed_by_digit
            && let Ok(number) = movetext[i..digits_end].parse::<u32>()
        {
            found = Some(MoveMarker { number, end });
        }

        i = end;
    }

    found
}

fn snippet(movetext: &str) -> String {
    movetext.chars().take(32).collect()
}

pub fn estimate_game_time(
    spec: &TimeControlSpec,
    movetext: &str,
) -> Result<GameTimeEstimate, FormatError> {
    if spec.untimed {
        return Ok(GameTimeEstimate::untimed());
    }

    let offsets: Vec<usize> = annotation_offsets(movetext).collect();

    let Some(marker) = last_full_move_marker(movetext) else {
        if offsets.is_empty() {
            // Zero-move game, e.g. movetext holding only a result token.
            return Ok(GameTimeEstimate::short_game(0, 0));
        }
        return Err(FormatError::new(
            MOVETEXT_FIELD,
            &snippet(movetext),
            "clock annotations without a move number",
        ));
    };

    let clocks_after_marker = offsets.iter().filter(|&&pos| pos >= marker.end).count();
    let white_moves = marker.number;
    let black_moves = if clocks_after_marker >= 2 {
        white_moves
    } else {
        white_moves.saturating_sub(1)
    };

    if black_moves == 0 {
        return Ok(GameTimeEstimate::short_game(white_moves, black_moves));
    }

    let budget_seconds = 2 * u64::from(spec.start_seconds)
        + u64::from(spec.increment_seconds) * (u64::from(white_moves) + u64::from(black_moves));

    let remaining_seconds = offsets
        .iter()
        .rev()
        .take(2)
        .map(|&pos| read_annotation_at(movetext, pos).map(u64::from))
        .sum::<Result<u64, FormatError>>()?;

    Ok(GameTimeEstimate {
        seconds_used: budget_seconds.saturating_sub(remaining_seconds),
        white_moves,
        black_moves,
        budget_seconds,
        remaining_seconds,
        untimed: false,
        short_game: false,
    })
}

pub fn seconds_used(spec: &TimeControlSpec, movetext: &str) -> Result<u64, FormatError> {
    estimate_game_time(spec, movetext).map(|estimate| estimate.seconds_used)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn blitz() -> TimeControlSpec {
        TimeControlSpec::timed(180, 2)
    }

    #[test]
    fn test_untimed_returns_zero_regardless_of_movetext() {
        let spec = TimeControlSpec::UNTIMED;
        assert_eq!(seconds_used(&spec, "1. e4 { [%clk 0:00:01] } e5").unwrap(), 0);
        assert_eq!(seconds_used(&spec, "garbage [%clk broken").unwrap(), 0);
        assert!(estimate_game_time(&spec, "").unwrap().untimed);
    }

    #[test]
    fn test_completed_pair_uses_both_final_clocks() {
        let movetext = "1. e4 { [%clk 0:03:00] } e5 { [%clk 0:03:00] } \
            9. Bc4 { [%clk 0:02:40] } Nf6 { [%clk 0:02:50] } \
            10. Qxf7# { [%clk 0:02:30] } Kxf7 { [%clk 0:02:45] } 1-0";

        let estimate = estimate_game_time(&blitz(), movetext).unwrap();
        assert_eq!(estimate.white_moves, 10);
        assert_eq!(estimate.black_moves, 10);
        assert_eq!(estimate.budget_seconds, 400);
        assert_eq!(estimate.remaining_seconds, 315);
        assert_eq!(estimate.seconds_used, 85);
        assert!((estimate.hours_used() - 85.0 / 3600.0).abs() < 1e-12);
    }

    #[test]
    fn test_black_continuation_markers_are_not_full_moves() {
        let movetext = "1. e4 { [%clk 0:03:00] } 1... e5 { [%clk 0:03:00] } \
            10. Qh5 { [%clk 0:02:30] } 10... Nc6 { [%clk 0:02:45] } 1-0";

        let estimate = estimate_game_time(&blitz(), movetext).unwrap();
        assert_eq!(estimate.white_moves, 10);
        assert_eq!(estimate.black_moves, 10);
        assert_eq!(estimate.seconds_used, 85);
    }

    #[test]
    fn test_game_ending_on_white_move() {
        let movetext = "1. e4 { [%clk 0:03:00] } e5 { [%clk 0:02:58] } \
            2. Qh5 { [%clk 0:02:50] } 1-0";

        let estimate = estimate_game_time(&blitz(), movetext).unwrap();
        assert_eq!(estimate.white_moves, 2);
        assert_eq!(estimate.black_moves, 1);
        // 2*180 + 2*3 = 366; final clocks 170 (white) + 178 (black)
        assert_eq!(estimate.budget_seconds, 366);
        assert_eq!(estimate.remaining_seconds, 348);
        assert_eq!(estimate.seconds_used, 18);
    }

    #[test]
    fn test_eval_decimals_are_not_move_numbers() {
        let movetext = "1. e4 { [%eval 0.17] [%clk 0:03:00] } e5 { [%eval 0.25] [%clk 0:02:58] } \
            2. Nf3 { [%eval 0.3] [%clk 0:02:55] } Nc6 { [%eval 0.31] [%clk 0:02:50] }";

        let estimate = estimate_game_time(&blitz(), movetext).unwrap();
        assert_eq!(estimate.white_moves, 2);
        assert_eq!(estimate.black_moves, 2);
    }

    #[test]
    fn test_compact_markers_without_space() {
        let movetext = "1.e4 { [%clk 0:01:00] } e5 { [%clk 0:01:00] } 2.Qh5 { [%clk 0:00:58] }";
        let estimate = estimate_game_time(&TimeControlSpec::timed(60, 0), movetext).unwrap();
        assert_eq!(estimate.white_moves, 2);
        assert_eq!(estimate.black_moves, 1);
        assert_eq!(estimate.seconds_used, 120 - 118);
    }

    #[test]
    fn test_single_white_move_is_short_game() {
        let movetext = "1. e4 { [%clk 0:03:00] } 1-0";
        let estimate = estimate_game_time(&blitz(), movetext).unwrap();
        assert!(estimate.short_game);
        assert_eq!(estimate.black_moves, 0);
        assert_eq!(estimate.seconds_used, 0);
    }

    #[test]
    fn test_zero_move_game_is_short_game() {
        let estimate = estimate_game_time(&blitz(), "0-1").unwrap();
        assert!(estimate.short_game);
        assert_eq!(estimate.seconds_used, 0);
    }

    #[test]
    fn test_missing_annotations_count_as_zero_remaining() {
        let movetext = "1. e4 e5 2. Nf3 Nc6 3. Bb5 1/2-1/2";
        let estimate = estimate_game_time(&blitz(), movetext).unwrap();
        assert_eq!(estimate.white_moves, 3);
        assert_eq!(estimate.black_moves, 2);
        assert_eq!(estimate.remaining_seconds, 0);
        assert_eq!(estimate.seconds_used, 2 * 180 + 2 * 5);
    }

    #[test]
    fn test_negative_estimate_is_clamped() {
        let movetext = "1. e4 { [%clk 0:10:00] } e5 { [%clk 0:10:00] }";
        let estimate = estimate_game_time(&TimeControlSpec::timed(60, 0), movetext).unwrap();
        assert_eq!(estimate.budget_seconds, 120);
        assert_eq!(estimate.seconds_used, 0);
    }

    #[test]
    fn test_malformed_final_clock_is_an_error() {
        let movetext = "1. e4 { [%clk 0:03:00] } e5 { [%clk 0:0x:00] }";
        let err = seconds_used(&blitz(), movetext).unwrap_err();
        assert_eq!(err.field, "%clk");
    }

    #[test]
    fn test_clocks_without_move_number_is_an_error() {
        let err = seconds_used(&blitz(), "{ [%clk 0:03:00] }").unwrap_err();
        assert_eq!(err.field, "movetext");
    }

    #[test]
    fn test_last_full_move_marker_positions() {
        assert_eq!(last_full_move_marker("1-0"), None);
        assert_eq!(last_full_move_marker("12... Nf6"), None);

        let marker = last_full_move_marker("1. e4 e5 12. Nf3").unwrap();
        assert_eq!(marker.number, 12);
        assert_eq!(marker.end, "1. e4 e5 12.".len());
    }

    #[test]
    fn test_json_breakdown() {
        let movetext = "1. e4 { [%clk 0:03:00] } e5 { [%clk 0:02:58] } 2. Qh5 { [%clk 0:02:50] }";
        let json = estimate_game_time(&blitz(), movetext).unwrap().to_json();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["seconds_used"], 18);
        assert_eq!(value["white_moves"], 2);
        assert_eq!(value["black_moves"], 1);
        assert_eq!(value["untimed"], false);
        assert_eq!(value["short_game"], false);
    }
}

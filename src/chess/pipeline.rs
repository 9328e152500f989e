use super::aggregator::MonthSeries;
use super::error::{ErrorAccumulator, FormatError, PipelineError};
use super::estimator::estimate_game_time;
use super::scanner::RecordScanner;
use std::io::BufRead;

/// What to do with a record whose tags or clocks are malformed.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum ErrorPolicy {
    #[default]
    Abort,
    Skip,
}

impl ErrorPolicy {
    pub fn parse(raw: &str) -> Result<Self, Box<dyn std::error::Error>> {
        let normalized = raw.trim();
        if normalized.eq_ignore_ascii_case("abort") {
            Ok(Self::Abort)
        } else if normalized.eq_ignore_ascii_case("skip") {
            Ok(Self::Skip)
        } else {
            Err(format!(
                "Invalid on_error value '{}'. Supported values: 'abort', 'skip' or NULL/omitted.",
                normalized
            )
            .into())
        }
    }
}

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct StreamSummary {
    pub lines: usize,
    pub games: u64,
    pub skipped: u64,
}

impl StreamSummary {
    pub fn merge(&mut self, other: StreamSummary) {
        self.lines += other.lines;
        self.games += other.games;
        self.skipped += other.skipped;
    }
}

/// Feeds every line of `input` through scanner, estimator and `series`.
///
/// Each line is fully processed before the next is read. On an I/O error the series
/// keeps everything up to the last complete line.
pub fn aggregate_stream<R: BufRead>(
    mut input: R,
    source: &str,
    series: &mut MonthSeries,
    policy: ErrorPolicy,
    skipped: &mut ErrorAccumulator,
) -> Result<StreamSummary, PipelineError> {
    let mut scanner = RecordScanner::new();
    let mut summary = StreamSummary::default();
    let mut buf = Vec::with_capacity(1024);

    loop {
        buf.clear();
        match input.read_until(b'\n', &mut buf) {
            Ok(0) => break,
            Ok(_) => {}
            Err(error) => {
                return Err(PipelineError::Io {
                    source: source.to_string(),
                    line: scanner.line_number(),
                    error,
                });
            }
        }

        summary.lines += 1;

        match process_line(&mut scanner, &buf, series) {
            Ok(false) => {}
            Ok(true) => summary.games += 1,
            Err(error) => match policy {
                ErrorPolicy::Abort => {
                    return Err(PipelineError::Format {
                        source: source.to_string(),
                        error,
                    });
                }
                ErrorPolicy::Skip => {
                    skipped.push(&format!("file='{}'; {}", source, error));
                    summary.skipped += 1;
                }
            },
        }
    }

    Ok(summary)
}

/// Returns whether the line completed a game.
fn process_line(
    scanner: &mut RecordScanner,
    line: &[u8],
    series: &mut MonthSeries,
) -> Result<bool, FormatError> {
    let Some(record) = scanner.feed_bytes(line)? else {
        return Ok(false);
    };

    let estimate = estimate_game_time(&record.time_control, &record.movetext)
        .map_err(|e| e.at_line(record.line_number))?;
    series.ingest(record.month, estimate.hours_used());
    Ok(true)
}

/// One-shot form of [`aggregate_stream`] for a single input.
#[cfg(test)]
pub fn summarize_pgn<R: BufRead>(
    input: R,
    policy: ErrorPolicy,
) -> Result<super::aggregator::MonthlyTotals, PipelineError> {
    let mut series = MonthSeries::new();
    let mut skipped = ErrorAccumulator::default();
    aggregate_stream(input, "<input>", &mut series, policy, &mut skipped)?;
    Ok(series.finish())
}

use super::{
    aggregator::{MonthSeries, MonthlyTotals},
    duckdb_impl::bind_info_ffi::get_named_parameter_varchar,
    error::{ErrorAccumulator, PipelineError},
    log,
    pipeline::{ErrorPolicy, StreamSummary, aggregate_stream},
};
use duckdb::{
    core::{DataChunkHandle, Inserter, LogicalTypeHandle, LogicalTypeId},
    vtab::{BindInfo, InitInfo, TableFunctionInfo, VTab},
};
use std::ffi::CString;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use zstd::stream::read::Decoder as ZstdDecoder;

#[repr(C)]
pub struct ReadPgnHoursBindData {
    paths: Vec<PathBuf>,
    compression: CompressionMode,
    on_error: ErrorPolicy,
}

#[repr(C)]
pub struct ReadPgnHoursInitData {
    state: Mutex<SharedState>,
}

/// Rows are computed in one pass on the first `func` call, then handed out per chunk.
#[derive(Default)]
struct SharedState {
    rows: Option<Vec<HoursRow>>,
    next_row: usize,
}

pub struct ReadPgnHoursVTab;

type PgnInput = Box<dyn Read + Send>;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum CompressionMode {
    Plain,
    Zstd,
}

const PATH_PATTERN_PARAM_INDEX: u64 = 0;
const ROWS_PER_CHUNK: usize = 2048;
const READ_PGN_HOURS_COLUMN_COUNT: usize = 5;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum ReadPgnHoursColumn {
    Month = 0,
    Hours = 1,
    Games = 2,
    GapFiller = 3,
    CumulativeHours = 4,
}

impl ReadPgnHoursColumn {
    const fn index(self) -> usize {
        self as usize
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum ReadPgnHoursLogicalType {
    Varchar,
    Double,
    UBigint,
    Boolean,
}

impl ReadPgnHoursLogicalType {
    fn to_handle(self) -> LogicalTypeHandle {
        match self {
            Self::Varchar => LogicalTypeHandle::from(LogicalTypeId::Varchar),
            Self::Double => LogicalTypeHandle::from(LogicalTypeId::Double),
            Self::UBigint => LogicalTypeHandle::from(LogicalTypeId::UBigint),
            Self::Boolean => LogicalTypeHandle::from(LogicalTypeId::Boolean),
        }
    }
}

struct ReadPgnHoursColumnDef {
    name: &'static str,
    logical_type: ReadPgnHoursLogicalType,
}

const READ_PGN_HOURS_COLUMNS: [ReadPgnHoursColumnDef; READ_PGN_HOURS_COLUMN_COUNT] = [
    ReadPgnHoursColumnDef {
        name: "month",
        logical_type: ReadPgnHoursLogicalType::Varchar,
    },
    ReadPgnHoursColumnDef {
        name: "hours",
        logical_type: ReadPgnHoursLogicalType::Double,
    },
    ReadPgnHoursColumnDef {
        name: "games",
        logical_type: ReadPgnHoursLogicalType::UBigint,
    },
    ReadPgnHoursColumnDef {
        name: "gap_filler",
        logical_type: ReadPgnHoursLogicalType::Boolean,
    },
    ReadPgnHoursColumnDef {
        name: "cumulative_hours",
        logical_type: ReadPgnHoursLogicalType::Double,
    },
];

impl CompressionMode {
    fn parse(raw: &str) -> Result<Self, Box<dyn std::error::Error>> {
        let normalized = raw.trim();
        if normalized.eq_ignore_ascii_case("zstd") {
            Ok(Self::Zstd)
        } else {
            Err(format!(
                "Invalid compression value '{}'. Supported values: 'zstd' or NULL/omitted.",
                normalized
            )
            .into())
        }
    }
}

fn resolve_compression_mode(
    bind: &BindInfo,
) -> Result<CompressionMode, Box<dyn std::error::Error>> {
    match get_named_parameter_varchar(bind, "compression")?.into_value() {
        None => Ok(CompressionMode::Plain),
        Some(raw) => CompressionMode::parse(&raw),
    }
}

fn resolve_error_policy(bind: &BindInfo) -> Result<ErrorPolicy, Box<dyn std::error::Error>> {
    match get_named_parameter_varchar(bind, "on_error")?.into_value() {
        None => Ok(ErrorPolicy::default()),
        Some(raw) => ErrorPolicy::parse(&raw),
    }
}

fn open_input_stream(path: &Path, compression: CompressionMode) -> Result<PgnInput, String> {
    let file =
        File::open(path).map_err(|e| format!("Failed to open file '{}': {}", path.display(), e))?;

    match compression {
        CompressionMode::Plain => Ok(Box::new(file)),
        CompressionMode::Zstd => ZstdDecoder::new(file)
            .map(|decoder| Box::new(decoder) as PgnInput)
            .map_err(|e| {
                format!(
                    "Failed to initialize zstd decoder for '{}': {}",
                    path.display(),
                    e
                )
            }),
    }
}

#[derive(Debug, Clone, PartialEq)]
struct HoursRow {
    month: String,
    hours: f64,
    games: u64,
    gap_filler: bool,
    cumulative_hours: f64,
}

fn rows_from_totals(totals: &MonthlyTotals) -> Vec<HoursRow> {
    totals
        .buckets
        .iter()
        .zip(totals.cumulative_hours())
        .map(|(bucket, cumulative_hours)| HoursRow {
            month: bucket.month.to_string(),
            hours: bucket.hours,
            games: bucket.games,
            gap_filler: bucket.gap_filler,
            cumulative_hours,
        })
        .collect()
}

/// Streams every input file, in path order, into one month series.
fn compute_totals(
    bind_data: &ReadPgnHoursBindData,
) -> Result<MonthlyTotals, Box<dyn std::error::Error>> {
    let mut series = MonthSeries::new();
    let mut skipped = ErrorAccumulator::default();
    let mut summary = StreamSummary::default();
    let mut files_read = 0usize;

    for path in &bind_data.paths {
        let input = match open_input_stream(path, bind_data.compression) {
            Ok(input) => input,
            Err(err_msg) => {
                if bind_data.paths.len() == 1 {
                    return Err(err_msg.into());
                }

                log::warn(&err_msg);
                continue;
            }
        };
        files_read += 1;

        let source = path.display().to_string();
        match aggregate_stream(
            BufReader::new(input),
            &source,
            &mut series,
            bind_data.on_error,
            &mut skipped,
        ) {
            Ok(file_summary) => summary.merge(file_summary),
            Err(err @ PipelineError::Io { .. }) if bind_data.on_error == ErrorPolicy::Skip => {
                log::warn(format!("{}; keeping games read so far", err));
            }
            Err(err) => {
                log::error(err.to_string());
                return Err(err.into());
            }
        }
    }

    if let Some(messages) = skipped.take() {
        log::warn(format!(
            "read_pgn_hours skipped {} record(s): {}",
            summary.skipped, messages
        ));
    }

    let totals = series.finish();
    log::info(format!(
        "read_pgn_hours: files={}; games={}; skipped={}; months={}; total_hours={:.2}",
        files_read,
        totals.games(),
        summary.skipped,
        totals.buckets.len(),
        totals.total_hours
    ));

    Ok(totals)
}

struct ChunkWriter<'a> {
    output: &'a mut DataChunkHandle,
    row_count: usize,
}

impl<'a> ChunkWriter<'a> {
    fn new(output: &'a mut DataChunkHandle) -> Self {
        Self {
            output,
            row_count: 0,
        }
    }

    fn is_full(&self) -> bool {
        self.row_count >= ROWS_PER_CHUNK
    }

    fn write_row(&mut self, row: &HoursRow) -> Result<(), Box<dyn std::error::Error>> {
        let row_idx = self.row_count;

        let month_vec = self.output.flat_vector(ReadPgnHoursColumn::Month.index());
        month_vec.insert(row_idx, CString::new(row.month.as_str())?);

        let mut hours_vec = self.output.flat_vector(ReadPgnHoursColumn::Hours.index());
        hours_vec.as_mut_slice::<f64>()[row_idx] = row.hours;

        let mut games_vec = self.output.flat_vector(ReadPgnHoursColumn::Games.index());
        games_vec.as_mut_slice::<u64>()[row_idx] = row.games;

        let mut filler_vec = self
            .output
            .flat_vector(ReadPgnHoursColumn::GapFiller.index());
        filler_vec.as_mut_slice::<bool>()[row_idx] = row.gap_filler;

        let mut cumulative_vec = self
            .output
            .flat_vector(ReadPgnHoursColumn::CumulativeHours.index());
        cumulative_vec.as_mut_slice::<f64>()[row_idx] = row.cumulative_hours;

        self.row_count += 1;
        Ok(())
    }

    fn set_output_len(&mut self) {
        self.output.set_len(self.row_count);
    }
}

impl VTab for ReadPgnHoursVTab {
    type InitData = ReadPgnHoursInitData;
    type BindData = ReadPgnHoursBindData;

    fn bind(bind: &BindInfo) -> Result<Self::BindData, Box<dyn std::error::Error>> {
        let pattern = bind.get_parameter(PATH_PATTERN_PARAM_INDEX).to_string();
        let compression = resolve_compression_mode(bind)?;
        let on_error = resolve_error_policy(bind)?;

        let paths: Vec<PathBuf> = if pattern.contains('*') || pattern.contains('?') {
            glob::glob(&pattern)?
                .filter_map(|entry| entry.ok())
                .collect()
        } else {
            vec![PathBuf::from(pattern)]
        };

        for column in READ_PGN_HOURS_COLUMNS.iter() {
            bind.add_result_column(column.name, column.logical_type.to_handle());
        }

        Ok(ReadPgnHoursBindData {
            paths,
            compression,
            on_error,
        })
    }

    fn init(_: &InitInfo) -> Result<Self::InitData, Box<dyn std::error::Error>> {
        Ok(ReadPgnHoursInitData {
            state: Mutex::new(SharedState::default()),
        })
    }

    fn func(
        func: &TableFunctionInfo<Self>,
        output: &mut DataChunkHandle,
    ) -> Result<(), Box<dyn std::error::Error>> {
        let init_data = func.get_init_data();
        let bind_data = func.get_bind_data();
        let mut state = init_data
            .state
            .lock()
            .map_err(|_| "read_pgn_hours state lock poisoned")?;

        if state.rows.is_none() {
            let totals = compute_totals(bind_data)?;
            state.rows = Some(rows_from_totals(&totals));
        }

        let SharedState { rows, next_row } = &mut *state;
        let rows = rows.as_deref().unwrap_or_default();
        let mut chunk_writer = ChunkWriter::new(output);

        while !chunk_writer.is_full() && *next_row < rows.len() {
            chunk_writer.write_row(&rows[*next_row])?;
            *next_row += 1;
        }

        chunk_writer.set_output_len();
        Ok(())
    }

    fn parameters() -> Option<Vec<LogicalTypeHandle>> {
        Some(vec![
            LogicalTypeHandle::from(LogicalTypeId::Varchar), // path pattern (required)
        ])
    }

    fn named_parameters() -> Option<Vec<(String, LogicalTypeHandle)>> {
        Some(vec![
            (
                "compression".to_string(),
                LogicalTypeHandle::from(LogicalTypeId::Varchar),
            ),
            (
                "on_error".to_string(),
                LogicalTypeHandle::from(LogicalTypeId::Varchar),
            ),
        ])
    }
}

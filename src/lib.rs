mod chess;

use chess::reader::ReadPgnHoursVTab;
use chess::scalars::{
    ChessClockSecondsScalar, ChessNextMonthScalar, ChessPrevMonthScalar, ChessTimeUsedJsonScalar,
    ChessTimeUsedScalar,
};
use duckdb::{Connection, Result};
use duckdb_ext_macros::duckdb_extension;
use std::error::Error;

#[duckdb_extension(name = "chess_hours", api_version = "v1.0.0")]
pub unsafe fn extension_entrypoint(con: Connection) -> Result<(), Box<dyn Error>> {
    // Table functions
    con.register_table_function::<ReadPgnHoursVTab>("read_pgn_hours")?;

    // Scalar functions
    con.register_scalar_function::<ChessClockSecondsScalar>("chess_clock_seconds")?;
    con.register_scalar_function::<ChessTimeUsedScalar>("chess_time_used")?;
    con.register_scalar_function::<ChessTimeUsedJsonScalar>("chess_time_used_json")?;
    con.register_scalar_function::<ChessPrevMonthScalar>("chess_prev_month")?;
    con.register_scalar_function::<ChessNextMonthScalar>("chess_next_month")?;

    Ok(())
}

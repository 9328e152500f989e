use duckdb::{
    Result,
    core::{DataChunkHandle, LogicalTypeHandle, LogicalTypeId},
    vscalar::{ScalarFunctionSignature, VScalar},
    vtab::arrow::WritableVector,
};
use std::error::Error;

use super::clock::clock_to_seconds;
use super::duckdb_impl::scalar::{
    VarcharOutput, invoke_binary_varchar_varchar_to_i64_nullable,
    invoke_binary_varchar_varchar_to_varchar, invoke_unary_varchar_to_u64_nullable,
    invoke_unary_varchar_to_varchar,
};
use super::estimator::{estimate_game_time, seconds_used};
use super::month::MonthLabel;
use super::timecontrol::TimeControlSpec;

fn varchar() -> LogicalTypeHandle {
    LogicalTypeHandle::from(LogicalTypeId::Varchar)
}

pub struct ChessClockSecondsScalar;

impl VScalar for ChessClockSecondsScalar {
    type State = ();

    unsafe fn invoke(
        _state: &Self::State,
        input: &mut DataChunkHandle,
        output: &mut dyn WritableVector,
    ) -> Result<(), Box<dyn Error>> {
        invoke_unary_varchar_to_u64_nullable(input, output, clock_seconds)
    }

    fn signatures() -> Vec<ScalarFunctionSignature> {
        vec![ScalarFunctionSignature::exact(
            vec![varchar()],
            LogicalTypeHandle::from(LogicalTypeId::UBigint),
        )]
    }
}

fn clock_seconds(raw: &str) -> Option<u64> {
    clock_to_seconds(raw.trim()).ok().map(u64::from)
}

pub struct ChessTimeUsedScalar;

impl VScalar for ChessTimeUsedScalar {
    type State = ();

    unsafe fn invoke(
        _state: &Self::State,
        input: &mut DataChunkHandle,
        output: &mut dyn WritableVector,
    ) -> Result<(), Box<dyn Error>> {
        invoke_binary_varchar_varchar_to_i64_nullable(input, output, time_used)
    }

    fn signatures() -> Vec<ScalarFunctionSignature> {
        vec![ScalarFunctionSignature::exact(
            vec![varchar(), varchar()],
            LogicalTypeHandle::from(LogicalTypeId::Bigint),
        )]
    }
}

fn time_used(time_control: &str, movetext: &str) -> Option<i64> {
    let spec = TimeControlSpec::parse(time_control).ok()?;
    let seconds = seconds_used(&spec, movetext).ok()?;
    i64::try_from(seconds).ok()
}

pub struct ChessTimeUsedJsonScalar;

impl VScalar for ChessTimeUsedJsonScalar {
    type State = ();

    unsafe fn invoke(
        _state: &Self::State,
        input: &mut DataChunkHandle,
        output: &mut dyn WritableVector,
    ) -> Result<(), Box<dyn Error>> {
        invoke_binary_varchar_varchar_to_varchar(input, output, |time_control, movetext| {
            VarcharOutput::Value(time_used_json(time_control, movetext))
        })
    }

    fn signatures() -> Vec<ScalarFunctionSignature> {
        vec![ScalarFunctionSignature::exact(
            vec![varchar(), varchar()],
            varchar(),
        )]
    }
}

fn time_used_json(time_control: &str, movetext: &str) -> String {
    let estimate = TimeControlSpec::parse(time_control)
        .and_then(|spec| estimate_game_time(&spec, movetext));

    match estimate {
        Ok(estimate) => estimate.to_json(),
        Err(e) => serde_json::json!({ "error": e.to_string() }).to_string(),
    }
}

pub struct ChessPrevMonthScalar;

impl VScalar for ChessPrevMonthScalar {
    type State = ();

    unsafe fn invoke(
        _state: &Self::State,
        input: &mut DataChunkHandle,
        output: &mut dyn WritableVector,
    ) -> Result<(), Box<dyn Error>> {
        invoke_unary_varchar_to_varchar(input, output, |raw| {
            shift_month(raw, MonthLabel::prev).into()
        })
    }

    fn signatures() -> Vec<ScalarFunctionSignature> {
        vec![ScalarFunctionSignature::exact(vec![varchar()], varchar())]
    }
}

pub struct ChessNextMonthScalar;

impl VScalar for ChessNextMonthScalar {
    type State = ();

    unsafe fn invoke(
        _state: &Self::State,
        input: &mut DataChunkHandle,
        output: &mut dyn WritableVector,
    ) -> Result<(), Box<dyn Error>> {
        invoke_unary_varchar_to_varchar(input, output, |raw| {
            shift_month(raw, MonthLabel::next).into()
        })
    }

    fn signatures() -> Vec<ScalarFunctionSignature> {
        vec![ScalarFunctionSignature::exact(vec![varchar()], varchar())]
    }
}

fn shift_month(raw: &str, step: fn(MonthLabel) -> MonthLabel) -> Option<String> {
    raw.trim()
        .parse::<MonthLabel>()
        .ok()
        .map(|label| step(label).to_string())
}

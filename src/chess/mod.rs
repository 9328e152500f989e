mod aggregator;
mod clock;
mod duckdb_impl;
mod error;
mod estimator;
mod log;
mod month;
mod pipeline;
mod scanner;
mod timecontrol;
mod types;

pub mod reader;
pub mod scalars;

//! Bundled sample signal set.

use crate::adapters::csv_adapter::parse_signals;
use crate::domain::error::RankfolioError;
use crate::domain::signal::SignalRow;

pub const SAMPLE_SIGNALS_CSV: &str = include_str!("../../data/sample_signals.csv");

pub fn sample_signals() -> Result<Vec<SignalRow>, RankfolioError> {
    parse_signals(SAMPLE_SIGNALS_CSV.as_bytes())
}

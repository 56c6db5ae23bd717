//! Tabular rendering of simulation output.

use crate::domain::paper::{DailyStep, PaperResult};
use crate::domain::signal::DATE_FORMAT;

pub const METRIC_HEADER: [&str; 2] = ["metric", "value"];
pub const CURVE_HEADER: [&str; 5] = ["date", "holdings", "day_return", "equity", "drawdown"];

/// The six `metric,value` rows of a result file, in file order.
pub fn metric_rows(result: &PaperResult) -> Vec<(&'static str, String)> {
    vec![
        ("start_equity", format!("{:.8}", result.start_equity)),
        ("end_equity", format!("{:.8}", result.end_equity)),
        ("total_return", format!("{:.8}", result.total_return)),
        ("cagr", format!("{:.8}", result.cagr)),
        ("max_drawdown", format!("{:.8}", result.max_drawdown)),
        ("trades", result.trades.to_string()),
    ]
}

pub fn curve_row(step: &DailyStep) -> [String; 5] {
    [
        step.date.format(DATE_FORMAT).to_string(),
        step.holdings.to_string(),
        format!("{:.8}", step.day_return),
        format!("{:.8}", step.equity),
        format!("{:.8}", step.drawdown),
    ]
}

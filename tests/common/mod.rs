#![allow(dead_code)]

use chrono::NaiveDate;
use rankfolio::domain::price::{PriceRow, PriceTable};
use rankfolio::domain::risk::RiskLimits;
pub use rankfolio::domain::signal::SignalRow;
use std::io::Write;

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

pub fn signal(day: &str, symbol: &str, score: f64) -> SignalRow {
    SignalRow::new(
        NaiveDate::parse_from_str(day, "%Y-%m-%d").unwrap(),
        symbol,
        score,
    )
}

pub fn price(day: &str, symbol: &str, close: f64) -> PriceRow {
    PriceRow::new(
        NaiveDate::parse_from_str(day, "%Y-%m-%d").unwrap(),
        symbol,
        close,
    )
}

pub fn limits(max_positions: usize, min_score: f64, weight: f64, turnover: f64) -> RiskLimits {
    RiskLimits::new(max_positions, min_score, weight, turnover).unwrap()
}

/// Two-name scenario: AAPL leads on the first day, MSFT on the second.
pub fn scenario_signals() -> Vec<SignalRow> {
    vec![
        signal("2025-01-02", "AAPL", 0.9),
        signal("2025-01-02", "MSFT", 0.7),
        signal("2025-01-03", "AAPL", 0.2),
        signal("2025-01-03", "MSFT", 0.8),
    ]
}

pub fn scenario_prices() -> PriceTable {
    PriceTable::from_rows(vec![
        price("2025-01-02", "AAPL", 100.0),
        price("2025-01-02", "MSFT", 200.0),
        price("2025-01-03", "AAPL", 101.0),
        price("2025-01-03", "MSFT", 202.0),
        price("2025-01-06", "AAPL", 102.0),
        price("2025-01-06", "MSFT", 204.0),
    ])
    .unwrap()
}

pub const SCENARIO_SIGNALS_CSV: &str = "date,symbol,score\n\
    2025-01-02,AAPL,0.9\n\
    2025-01-02,MSFT,0.7\n\
    2025-01-03,AAPL,0.2\n\
    2025-01-03,MSFT,0.8\n";

pub const SCENARIO_PRICES_CSV: &str = "date,symbol,close\n\
    2025-01-02,AAPL,100\n\
    2025-01-02,MSFT,200\n\
    2025-01-03,AAPL,101\n\
    2025-01-03,MSFT,202\n\
    2025-01-06,AAPL,102\n\
    2025-01-06,MSFT,204\n";

pub fn write_temp(content: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file.flush().unwrap();
    file
}

//! CSV file adapter for signals, prices and reports.

use crate::domain::error::RankfolioError;
use crate::domain::paper::{DailyStep, PaperResult};
use crate::domain::price::{PriceRow, PriceTable};
use crate::domain::report::{curve_row, metric_rows, CURVE_HEADER, METRIC_HEADER};
use crate::domain::signal::{SignalRow, DATE_FORMAT, SCORE_PRECISION};
use crate::ports::price_port::PricePort;
use crate::ports::report_port::ReportPort;
use crate::ports::signal_port::SignalPort;
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use std::fs;
use std::io::{Read, Write};
use std::path::Path;

const SIGNAL_SOURCE: &str = "signal file";
const PRICE_SOURCE: &str = "price file";

#[derive(Debug, Clone, Copy, Default)]
pub struct CsvAdapter;

impl CsvAdapter {
    pub fn new() -> Self {
        Self
    }
}

/// Position of each required column in the header, in `required` order.
fn column_positions(
    headers: &csv::StringRecord,
    required: &[&str],
    source_name: &str,
) -> Result<Vec<usize>, RankfolioError> {
    required
        .iter()
        .map(|name| {
            headers
                .iter()
                .position(|h| h.trim().eq_ignore_ascii_case(name))
                .ok_or_else(|| {
                    RankfolioError::malformed(
                        source_name,
                        format!("must contain columns: {}", required.join(",")),
                    )
                })
        })
        .collect()
}

fn field<'r>(record: &'r csv::StringRecord, index: usize) -> &'r str {
    record.get(index).map(str::trim).unwrap_or("")
}

fn line_of(record: &csv::StringRecord) -> u64 {
    record.position().map(|p| p.line()).unwrap_or(0)
}

pub fn parse_signal_date(value: &str) -> Result<NaiveDate, chrono::ParseError> {
    NaiveDate::parse_from_str(value, DATE_FORMAT)
}

/// Price dates may carry a time part; only the calendar day is kept.
pub fn parse_price_date(value: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(value, DATE_FORMAT)
        .ok()
        .or_else(|| {
            NaiveDateTime::parse_from_str(value, "%Y-%m-%d %H:%M:%S")
                .ok()
                .map(|dt| dt.date())
        })
        .or_else(|| DateTime::parse_from_rfc3339(value).ok().map(|dt| dt.date_naive()))
}

pub fn parse_signals<R: Read>(reader: R) -> Result<Vec<SignalRow>, RankfolioError> {
    let mut rdr = csv::Reader::from_reader(reader);
    let headers = rdr
        .headers()
        .map_err(|e| RankfolioError::malformed(SIGNAL_SOURCE, e.to_string()))?
        .clone();
    let cols = column_positions(&headers, &["date", "symbol", "score"], SIGNAL_SOURCE)?;

    let mut rows = Vec::new();
    for result in rdr.records() {
        let record =
            result.map_err(|e| RankfolioError::malformed(SIGNAL_SOURCE, e.to_string()))?;
        let line = line_of(&record);

        let date_str = field(&record, cols[0]);
        let signal_date = parse_signal_date(date_str).map_err(|_| {
            RankfolioError::malformed(
                SIGNAL_SOURCE,
                format!("line {}: invalid date '{}' (expected YYYY-MM-DD)", line, date_str),
            )
        })?;

        let symbol = field(&record, cols[1]).to_uppercase();
        if symbol.is_empty() {
            return Err(RankfolioError::malformed(
                SIGNAL_SOURCE,
                format!("line {}: empty symbol", line),
            ));
        }

        let score_str = field(&record, cols[2]);
        let score: f64 = score_str.parse().map_err(|_| {
            RankfolioError::malformed(
                SIGNAL_SOURCE,
                format!("line {}: invalid score '{}'", line, score_str),
            )
        })?;

        rows.push(SignalRow {
            signal_date,
            symbol,
            score,
        });
    }

    if rows.is_empty() {
        return Err(RankfolioError::EmptyInput {
            source_name: SIGNAL_SOURCE.to_string(),
        });
    }
    Ok(rows)
}

pub fn write_signals_to<W: Write>(writer: W, rows: &[SignalRow]) -> Result<(), RankfolioError> {
    let mut wtr = csv::Writer::from_writer(writer);
    wtr.write_record(["date", "symbol", "score"])
        .map_err(csv_io_error)?;
    for row in rows {
        wtr.write_record([
            row.signal_date.format(DATE_FORMAT).to_string(),
            row.symbol.clone(),
            format!("{:.*}", SCORE_PRECISION, row.score),
        ])
        .map_err(csv_io_error)?;
    }
    wtr.flush()?;
    Ok(())
}

/// Rows whose close is blank or not a number are dropped.
pub fn parse_prices<R: Read>(reader: R) -> Result<PriceTable, RankfolioError> {
    let mut rdr = csv::Reader::from_reader(reader);
    let headers = rdr
        .headers()
        .map_err(|e| RankfolioError::malformed(PRICE_SOURCE, e.to_string()))?
        .clone();
    let cols = column_positions(&headers, &["date", "symbol", "close"], PRICE_SOURCE)?;

    let mut table = PriceTable::new();
    let mut dropped = 0usize;
    for result in rdr.records() {
        let record = result.map_err(|e| RankfolioError::malformed(PRICE_SOURCE, e.to_string()))?;
        let line = line_of(&record);

        let date_str = field(&record, cols[0]);
        let date = parse_price_date(date_str).ok_or_else(|| {
            RankfolioError::malformed(
                PRICE_SOURCE,
                format!("line {}: invalid date '{}'", line, date_str),
            )
        })?;

        let symbol = field(&record, cols[1]).to_uppercase();
        if symbol.is_empty() {
            return Err(RankfolioError::malformed(
                PRICE_SOURCE,
                format!("line {}: empty symbol", line),
            ));
        }

        let close = match field(&record, cols[2]).parse::<f64>() {
            Ok(v) if !v.is_nan() => v,
            _ => {
                dropped += 1;
                continue;
            }
        };

        table.insert(PriceRow {
            date,
            symbol,
            close,
        })?;
    }

    if dropped > 0 {
        tracing::debug!(dropped, "dropped price rows without a usable close");
    }
    if table.is_empty() {
        return Err(RankfolioError::EmptyInput {
            source_name: PRICE_SOURCE.to_string(),
        });
    }
    Ok(table)
}

fn csv_io_error(e: csv::Error) -> RankfolioError {
    RankfolioError::Io(std::io::Error::other(e))
}

fn create_parent(path: &Path) -> Result<(), RankfolioError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    Ok(())
}

/// Render fully in memory, then write once, so a failure leaves no partial file.
fn write_file(path: &Path, content: &[u8]) -> Result<(), RankfolioError> {
    create_parent(path)?;
    fs::write(path, content)?;
    Ok(())
}

impl SignalPort for CsvAdapter {
    fn read_signals(&self, path: &Path) -> Result<Vec<SignalRow>, RankfolioError> {
        let file = fs::File::open(path).map_err(|e| {
            RankfolioError::Io(std::io::Error::new(
                e.kind(),
                format!("failed to read {}: {}", path.display(), e),
            ))
        })?;
        parse_signals(file)
    }

    fn write_signals(&self, path: &Path, rows: &[SignalRow]) -> Result<(), RankfolioError> {
        let mut buf = Vec::new();
        write_signals_to(&mut buf, rows)?;
        write_file(path, &buf)
    }
}

impl PricePort for CsvAdapter {
    fn read_prices(&self, path: &Path) -> Result<PriceTable, RankfolioError> {
        let file = fs::File::open(path).map_err(|e| {
            RankfolioError::Io(std::io::Error::new(
                e.kind(),
                format!("failed to read {}: {}", path.display(), e),
            ))
        })?;
        parse_prices(file)
    }
}

impl ReportPort for CsvAdapter {
    fn save_result(&self, path: &Path, result: &PaperResult) -> Result<(), RankfolioError> {
        let mut wtr = csv::Writer::from_writer(Vec::new());
        wtr.write_record(METRIC_HEADER).map_err(csv_io_error)?;
        for (metric, value) in metric_rows(result) {
            wtr.write_record([metric, value.as_str()])
                .map_err(csv_io_error)?;
        }
        let buf = wtr.into_inner().map_err(|e| e.into_error())?;
        write_file(path, &buf)
    }

    fn save_curve(&self, path: &Path, steps: &[DailyStep]) -> Result<(), RankfolioError> {
        let mut wtr = csv::Writer::from_writer(Vec::new());
        wtr.write_record(CURVE_HEADER).map_err(csv_io_error)?;
        for step in steps {
            wtr.write_record(curve_row(step)).map_err(csv_io_error)?;
        }
        let buf = wtr.into_inner().map_err(|e| e.into_error())?;
        write_file(path, &buf)
    }
}

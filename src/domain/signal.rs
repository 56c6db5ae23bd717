//! Signal rows and the per-day score index.
//!
//! A signal stream is a flat list of `(date, symbol, score)` rows produced by an
//! external generator. The simulator never scans it directly; it asks the
//! [`SignalIndex`] for one day's [`DailyScoreMap`] at a time.

use chrono::NaiveDate;
use std::collections::{BTreeMap, BTreeSet, HashMap};

pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Fractional digits used when a score is written to text.
pub const SCORE_PRECISION: usize = 10;

#[derive(Debug, Clone, PartialEq)]
pub struct SignalRow {
    pub signal_date: NaiveDate,
    pub symbol: String,
    pub score: f64,
}

impl SignalRow {
    pub fn new(signal_date: NaiveDate, symbol: impl Into<String>, score: f64) -> Self {
        Self {
            signal_date,
            symbol: symbol.into(),
            score,
        }
    }
}

/// Scores for a single day. Iterates in ascending symbol order.
pub type DailyScoreMap = BTreeMap<String, f64>;

pub type SignalIndex = BTreeMap<NaiveDate, DailyScoreMap>;

/// Group rows by day. A repeated `(date, symbol)` keeps the later row's score.
pub fn index_by_day<'a, I>(rows: I) -> SignalIndex
where
    I: IntoIterator<Item = &'a SignalRow>,
{
    let mut by_day = SignalIndex::new();
    for row in rows {
        by_day
            .entry(row.signal_date)
            .or_default()
            .insert(row.symbol.clone(), row.score);
    }
    by_day
}

/// Every `(date, symbol)` key that occurs more than once, in key order.
pub fn find_duplicates(rows: &[SignalRow]) -> Vec<(NaiveDate, String)> {
    let mut counts: HashMap<(NaiveDate, &str), usize> = HashMap::new();
    for row in rows {
        *counts.entry((row.signal_date, row.symbol.as_str())).or_insert(0) += 1;
    }
    let mut dups: Vec<(NaiveDate, String)> = counts
        .into_iter()
        .filter(|(_, n)| *n > 1)
        .map(|((date, symbol), _)| (date, symbol.to_string()))
        .collect();
    dups.sort();
    dups
}

/// Shape of a signal file, as reported by `validate`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignalSummary {
    pub rows: usize,
    pub dates: usize,
    pub symbols: usize,
    pub duplicates: usize,
}

impl SignalSummary {
    pub fn from_rows(rows: &[SignalRow]) -> Self {
        let dates: BTreeSet<NaiveDate> = rows.iter().map(|r| r.signal_date).collect();
        let symbols: BTreeSet<&str> = rows.iter().map(|r| r.symbol.as_str()).collect();
        Self {
            rows: rows.len(),
            dates: dates.len(),
            symbols: symbols.len(),
            duplicates: find_duplicates(rows).len(),
        }
    }

    pub fn is_clean(&self) -> bool {
        self.rows > 0 && self.duplicates == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn sample_rows() -> Vec<SignalRow> {
        vec![
            SignalRow::new(d(2025, 1, 2), "AAPL", 0.92),
            SignalRow::new(d(2025, 1, 2), "MSFT", 0.77),
            SignalRow::new(d(2025, 1, 3), "AAPL", 0.50),
        ]
    }

    #[test]
    fn index_groups_rows_by_day() {
        let indexed = index_by_day(&sample_rows());

        assert_eq!(
            indexed.keys().copied().collect::<Vec<_>>(),
            vec![d(2025, 1, 2), d(2025, 1, 3)]
        );
        assert_eq!(indexed[&d(2025, 1, 2)]["AAPL"], 0.92);
        assert_eq!(indexed[&d(2025, 1, 2)]["MSFT"], 0.77);
        assert_eq!(indexed[&d(2025, 1, 3)]["AAPL"], 0.50);
        assert!(!indexed[&d(2025, 1, 3)].contains_key("MSFT"));
    }

    #[test]
    fn index_keeps_last_duplicate() {
        let rows = vec![
            SignalRow::new(d(2025, 1, 2), "AAPL", 0.1),
            SignalRow::new(d(2025, 1, 2), "AAPL", 0.9),
        ];
        let indexed = index_by_day(&rows);
        assert_eq!(indexed[&d(2025, 1, 2)].len(), 1);
        assert_eq!(indexed[&d(2025, 1, 2)]["AAPL"], 0.9);
    }

    #[test]
    fn index_of_nothing_is_empty() {
        assert!(index_by_day(&Vec::<SignalRow>::new()).is_empty());
    }

    #[test]
    fn duplicates_are_reported_once_per_key() {
        let mut rows = sample_rows();
        rows.push(SignalRow::new(d(2025, 1, 2), "AAPL", 0.3));
        rows.push(SignalRow::new(d(2025, 1, 2), "AAPL", 0.4));

        let dups = find_duplicates(&rows);
        assert_eq!(dups, vec![(d(2025, 1, 2), "AAPL".to_string())]);
    }

    #[test]
    fn summary_counts() {
        let summary = SignalSummary::from_rows(&sample_rows());
        assert_eq!(
            summary,
            SignalSummary {
                rows: 3,
                dates: 2,
                symbols: 2,
                duplicates: 0,
            }
        );
        assert!(summary.is_clean());
        assert!(!SignalSummary::from_rows(&[]).is_clean());
    }
}

//! Day-indexed close price table.

use crate::domain::error::RankfolioError;
use chrono::NaiveDate;
use std::collections::{BTreeMap, BTreeSet, HashMap};

#[derive(Debug, Clone, PartialEq)]
pub struct PriceRow {
    pub date: NaiveDate,
    pub symbol: String,
    pub close: f64,
}

impl PriceRow {
    pub fn new(date: NaiveDate, symbol: impl Into<String>, close: f64) -> Self {
        Self {
            date,
            symbol: symbol.into(),
            close,
        }
    }
}

/// Close prices keyed by trading day, then symbol.
///
/// Only point lookups are needed by the simulator, so this is a two-level map
/// rather than a general table. Days iterate in calendar order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PriceTable {
    closes: BTreeMap<NaiveDate, HashMap<String, f64>>,
}

impl PriceTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a table, rejecting a second close for the same `(date, symbol)`.
    pub fn from_rows<I>(rows: I) -> Result<Self, RankfolioError>
    where
        I: IntoIterator<Item = PriceRow>,
    {
        let mut table = Self::new();
        for row in rows {
            table.insert(row)?;
        }
        Ok(table)
    }

    pub fn insert(&mut self, row: PriceRow) -> Result<(), RankfolioError> {
        let day = self.closes.entry(row.date).or_default();
        if day.contains_key(&row.symbol) {
            return Err(RankfolioError::DuplicatePrice {
                date: row.date.to_string(),
                symbol: row.symbol,
            });
        }
        day.insert(row.symbol, row.close);
        Ok(())
    }

    pub fn trading_days(&self) -> Vec<NaiveDate> {
        self.closes.keys().copied().collect()
    }

    pub fn day_count(&self) -> usize {
        self.closes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.closes.is_empty()
    }

    pub fn close(&self, day: NaiveDate, symbol: &str) -> Option<f64> {
        self.closes.get(&day).and_then(|m| m.get(symbol)).copied()
    }

    /// Close on `day` only if it is finite and strictly positive.
    pub fn usable_close(&self, day: NaiveDate, symbol: &str) -> Option<f64> {
        self.close(day, symbol).filter(|p| p.is_finite() && *p > 0.0)
    }

    pub fn symbols(&self) -> BTreeSet<String> {
        self.closes
            .values()
            .flat_map(|m| m.keys().cloned())
            .collect()
    }
}

//! Day-by-day paper simulation.
//!
//! Walks the price table's trading days in order. On each day the risk
//! selector picks targets from that day's scores; the weights are then applied
//! to the close-to-close move into the next trading day. Nothing is charged
//! for trading and unallocated weight earns zero.

use crate::domain::error::RankfolioError;
use crate::domain::price::PriceTable;
use crate::domain::risk::{select_targets, Holdings, RiskLimits, TargetWeights};
use crate::domain::signal::{index_by_day, DailyScoreMap, SignalRow};
use chrono::NaiveDate;

pub const TRADING_DAYS_PER_YEAR: f64 = 252.0;
pub const MIN_TRADING_DAYS: usize = 2;
pub const START_EQUITY: f64 = 1.0;

/// Summary metrics of one simulation run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PaperResult {
    pub start_equity: f64,
    pub end_equity: f64,
    pub total_return: f64,
    pub cagr: f64,
    pub max_drawdown: f64,
    /// Number of days on which the held symbol set changed.
    pub trades: usize,
}

/// State after one simulated day, dated by the day the targets were chosen.
#[derive(Debug, Clone, PartialEq)]
pub struct DailyStep {
    pub date: NaiveDate,
    pub holdings: usize,
    pub day_return: f64,
    pub equity: f64,
    pub drawdown: f64,
    pub max_drawdown: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PaperRun {
    pub result: PaperResult,
    pub steps: Vec<DailyStep>,
}

/// Weighted close-to-close return for `targets` between two trading days.
///
/// A symbol without a finite positive close on both days contributes nothing,
/// and its weight is left in cash.
pub fn day_return(
    targets: &TargetWeights,
    prices: &PriceTable,
    day: NaiveDate,
    next_day: NaiveDate,
) -> f64 {
    targets
        .iter()
        .filter_map(|(symbol, weight)| {
            let p0 = prices.usable_close(day, symbol)?;
            let p1 = prices.usable_close(next_day, symbol)?;
            Some(weight * (p1 / p0 - 1.0))
        })
        .sum()
}

/// Annualized growth over `periods` trading days; -1.0 after a total loss.
pub fn cagr(end_equity: f64, periods: usize) -> f64 {
    if end_equity <= 0.0 {
        return -1.0;
    }
    let periods = periods.max(1) as f64;
    end_equity.powf(TRADING_DAYS_PER_YEAR / periods) - 1.0
}

/// Running equity, peak and drawdown for the walk.
#[derive(Debug, Clone)]
struct Ledger {
    equity: f64,
    peak: f64,
    max_drawdown: f64,
    trades: usize,
    holdings: Holdings,
}

impl Ledger {
    fn new() -> Self {
        Self {
            equity: START_EQUITY,
            peak: START_EQUITY,
            max_drawdown: 0.0,
            trades: 0,
            holdings: Holdings::new(),
        }
    }

    fn rebalance(&mut self, targets: &TargetWeights) {
        let next: Holdings = targets.keys().cloned().collect();
        if next != self.holdings {
            self.trades += 1;
            self.holdings = next;
        }
    }

    /// Compound one day's return and return the drawdown from peak.
    fn compound(&mut self, day_return: f64) -> f64 {
        self.equity = (self.equity * (1.0 + day_return)).max(0.0);
        self.peak = self.peak.max(self.equity);
        let drawdown = if self.peak > 0.0 {
            (self.peak - self.equity) / self.peak
        } else {
            0.0
        };
        self.max_drawdown = self.max_drawdown.max(drawdown);
        drawdown
    }
}

/// Run the simulation and keep the per-day trace.
pub fn simulate(
    signal_rows: &[SignalRow],
    prices: &PriceTable,
    limits: &RiskLimits,
) -> Result<PaperRun, RankfolioError> {
    let days = prices.trading_days();
    if days.len() < MIN_TRADING_DAYS {
        return Err(RankfolioError::InsufficientData {
            days: days.len(),
            minimum: MIN_TRADING_DAYS,
        });
    }

    let by_day = index_by_day(signal_rows);
    let no_scores = DailyScoreMap::new();
    let mut ledger = Ledger::new();
    let mut steps = Vec::with_capacity(days.len() - 1);

    for pair in days.windows(2) {
        let (day, next_day) = (pair[0], pair[1]);
        let scores = by_day.get(&day).unwrap_or(&no_scores);

        let targets = select_targets(scores, &ledger.holdings, limits);
        ledger.rebalance(&targets);

        let ret = if targets.is_empty() {
            0.0
        } else {
            day_return(&targets, prices, day, next_day)
        };
        let drawdown = ledger.compound(ret);

        tracing::debug!(
            %day,
            holdings = targets.len(),
            day_return = ret,
            equity = ledger.equity,
            "simulated day"
        );

        steps.push(DailyStep {
            date: day,
            holdings: targets.len(),
            day_return: ret,
            equity: ledger.equity,
            drawdown,
            max_drawdown: ledger.max_drawdown,
        });
    }

    let end_equity = ledger.equity;
    let result = PaperResult {
        start_equity: START_EQUITY,
        end_equity,
        total_return: end_equity - START_EQUITY,
        cagr: cagr(end_equity, steps.len()),
        max_drawdown: ledger.max_drawdown,
        trades: ledger.trades,
    };

    tracing::info!(
        days = steps.len(),
        end_equity,
        trades = result.trades,
        "paper simulation finished"
    );

    Ok(PaperRun { result, steps })
}

/// Run the simulation and return only the summary.
pub fn run(
    signal_rows: &[SignalRow],
    prices: &PriceTable,
    limits: &RiskLimits,
) -> Result<PaperResult, RankfolioError> {
    simulate(signal_rows, prices, limits).map(|r| r.result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::price::PriceRow;
    use approx::assert_relative_eq;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn weights(pairs: &[(&str, f64)]) -> TargetWeights {
        pairs.iter().map(|(s, w)| (s.to_string(), *w)).collect()
    }

    fn two_day_table(rows: &[(&str, f64, f64)]) -> PriceTable {
        let mut out = Vec::new();
        for (symbol, p0, p1) in rows {
            out.push(PriceRow::new(d(2025, 1, 2), *symbol, *p0));
            out.push(PriceRow::new(d(2025, 1, 3), *symbol, *p1));
        }
        PriceTable::from_rows(out).unwrap()
    }

    #[test]
    fn day_return_weights_each_symbol() {
        let prices = two_day_table(&[("AAPL", 100.0, 110.0), ("MSFT", 200.0, 190.0)]);
        let r = day_return(
            &weights(&[("AAPL", 0.5), ("MSFT", 0.5)]),
            &prices,
            d(2025, 1, 2),
            d(2025, 1, 3),
        );
        assert_relative_eq!(r, 0.5 * 0.10 + 0.5 * -0.05);
    }

    #[test]
    fn day_return_skips_unusable_prices() {
        let prices = two_day_table(&[
            ("AAPL", 100.0, 110.0),
            ("ZERO", 0.0, 10.0),
            ("NEG", 10.0, -1.0),
            ("NAN", f64::NAN, 10.0),
        ]);
        let r = day_return(
            &weights(&[("AAPL", 0.25), ("ZERO", 0.25), ("NEG", 0.25), ("NAN", 0.25), ("GONE", 0.25)]),
            &prices,
            d(2025, 1, 2),
            d(2025, 1, 3),
        );
        assert_relative_eq!(r, 0.25 * 0.10);
    }

    #[test]
    fn cagr_annualizes_and_flags_total_loss() {
        assert_relative_eq!(cagr(1.0, 10), 0.0);
        assert_relative_eq!(cagr(1.01, 252), 0.01, epsilon = 1e-12);
        assert_relative_eq!(cagr(1.01, 126), 1.01f64.powi(2) - 1.0, epsilon = 1e-12);
        assert_eq!(cagr(0.0, 10), -1.0);
    }

    #[test]
    fn ledger_counts_only_set_changes() {
        let mut ledger = Ledger::new();
        ledger.rebalance(&weights(&[("AAPL", 1.0)]));
        ledger.rebalance(&weights(&[("AAPL", 0.5)]));
        assert_eq!(ledger.trades, 1);
        ledger.rebalance(&weights(&[("AAPL", 0.5), ("MSFT", 0.5)]));
        ledger.rebalance(&TargetWeights::new());
        assert_eq!(ledger.trades, 3);
        assert!(ledger.holdings.is_empty());
    }

    #[test]
    fn ledger_tracks_drawdown_from_peak() {
        let mut ledger = Ledger::new();
        ledger.compound(0.10);
        let dd = ledger.compound(-0.5);
        assert_relative_eq!(dd, 0.5);
        ledger.compound(0.5);
        assert_relative_eq!(ledger.max_drawdown, 0.5);
        assert_relative_eq!(ledger.equity, 1.1 * 0.5 * 1.5);
    }

    #[test]
    fn one_trading_day_is_insufficient() {
        let prices =
            PriceTable::from_rows(vec![PriceRow::new(d(2025, 1, 2), "AAPL", 100.0)]).unwrap();
        let err = run(&[], &prices, &RiskLimits::default()).unwrap_err();
        assert!(matches!(
            err,
            RankfolioError::InsufficientData { days: 1, minimum: 2 }
        ));
    }

    #[test]
    fn no_signals_stays_in_cash() {
        let prices = two_day_table(&[("AAPL", 100.0, 150.0)]);
        let run = simulate(&[], &prices, &RiskLimits::default()).unwrap();
        assert_eq!(run.result.end_equity, 1.0);
        assert_eq!(run.result.trades, 0);
        assert_eq!(run.result.cagr, 0.0);
        assert_eq!(run.steps.len(), 1);
        assert_eq!(run.steps[0].holdings, 0);
    }
}

//! Risk-limited target selection.
//!
//! [`select_targets`] turns one day's scores into an equal-weight target
//! allocation subject to the portfolio limits in [`RiskLimits`]. It is a pure
//! function: identical inputs always produce identical weights.

use crate::domain::error::RankfolioError;
use crate::domain::signal::DailyScoreMap;
use std::collections::{BTreeMap, BTreeSet};

pub const DEFAULT_MAX_POSITIONS: usize = 3;
pub const DEFAULT_MIN_SCORE: f64 = f64::NEG_INFINITY;
pub const DEFAULT_MAX_WEIGHT_PER_SYMBOL: f64 = 0.5;
pub const DEFAULT_MAX_DAILY_TURNOVER: f64 = 1.0;

/// Symbols currently held.
pub type Holdings = BTreeSet<String>;

/// Symbol to portfolio weight. Weights sum to at most 1.0; the rest is cash.
pub type TargetWeights = BTreeMap<String, f64>;

/// Portfolio-level limits applied each day. Immutable once built.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RiskLimits {
    max_positions: usize,
    min_score: f64,
    max_weight_per_symbol: f64,
    max_daily_turnover: f64,
}

impl RiskLimits {
    pub fn new(
        max_positions: usize,
        min_score: f64,
        max_weight_per_symbol: f64,
        max_daily_turnover: f64,
    ) -> Result<Self, RankfolioError> {
        if max_positions == 0 {
            return Err(invalid("max_positions", "max_positions must be positive"));
        }
        if min_score.is_nan() {
            return Err(invalid("min_score", "min_score must be a number"));
        }
        if max_weight_per_symbol.is_nan()
            || max_weight_per_symbol <= 0.0
            || max_weight_per_symbol > 1.0
        {
            return Err(invalid(
                "max_weight_per_symbol",
                "max_weight_per_symbol must be in (0, 1]",
            ));
        }
        if max_daily_turnover.is_nan() || max_daily_turnover < 0.0 {
            return Err(invalid(
                "max_daily_turnover",
                "max_daily_turnover must be non-negative",
            ));
        }
        Ok(Self {
            max_positions,
            min_score,
            max_weight_per_symbol,
            max_daily_turnover,
        })
    }

    pub fn max_positions(&self) -> usize {
        self.max_positions
    }

    pub fn min_score(&self) -> f64 {
        self.min_score
    }

    pub fn max_weight_per_symbol(&self) -> f64 {
        self.max_weight_per_symbol
    }

    pub fn max_daily_turnover(&self) -> f64 {
        self.max_daily_turnover
    }
}

impl Default for RiskLimits {
    fn default() -> Self {
        Self {
            max_positions: DEFAULT_MAX_POSITIONS,
            min_score: DEFAULT_MIN_SCORE,
            max_weight_per_symbol: DEFAULT_MAX_WEIGHT_PER_SYMBOL,
            max_daily_turnover: DEFAULT_MAX_DAILY_TURNOVER,
        }
    }
}

fn invalid(key: &str, reason: &str) -> RankfolioError {
    RankfolioError::ConfigInvalid {
        section: "risk".to_string(),
        key: key.to_string(),
        reason: reason.to_string(),
    }
}

/// Entries plus exits, normalized by the number of names currently held.
///
/// Can exceed 1.0 when most holdings are replaced.
pub fn turnover_ratio(current: &Holdings, target: &Holdings) -> f64 {
    if current.is_empty() {
        return if target.is_empty() { 0.0 } else { 1.0 };
    }
    let entries = target.difference(current).count();
    let exits = current.difference(target).count();
    (entries + exits) as f64 / current.len() as f64
}

/// Compute the day's target weights.
///
/// Ranking is a stable descending sort on score over the map's ascending
/// symbol order, so tied scores resolve alphabetically. NaN scores never pass
/// the score floor. A day with no eligible score is fully in cash, even if
/// names are currently held.
///
/// When the turnover limit is breached and no candidate is already held, the
/// whole current set is kept. Those names may sit below `min_score`, lack a
/// score that day, or number more than `max_positions`.
pub fn select_targets(
    day_scores: &DailyScoreMap,
    current_holdings: &Holdings,
    limits: &RiskLimits,
) -> TargetWeights {
    let mut ranked: Vec<(&str, f64)> = day_scores
        .iter()
        .filter(|(_, score)| **score >= limits.min_score)
        .map(|(symbol, score)| (symbol.as_str(), *score))
        .collect();

    if ranked.is_empty() {
        return TargetWeights::new();
    }

    ranked.sort_by(|a, b| b.1.total_cmp(&a.1));
    ranked.truncate(limits.max_positions);

    let mut targets: Holdings = ranked.iter().map(|(s, _)| s.to_string()).collect();

    if !current_holdings.is_empty() && limits.max_daily_turnover.is_finite() {
        let turnover = turnover_ratio(current_holdings, &targets);
        if turnover > limits.max_daily_turnover {
            let overlap: Holdings = targets.intersection(current_holdings).cloned().collect();
            tracing::debug!(
                turnover,
                limit = limits.max_daily_turnover,
                kept = overlap.len(),
                "turnover limit exceeded"
            );
            targets = if overlap.is_empty() {
                current_holdings.clone()
            } else {
                overlap
            };
        }
    }

    if targets.is_empty() {
        return TargetWeights::new();
    }

    let weight = (1.0 / targets.len() as f64).min(limits.max_weight_per_symbol);
    targets.into_iter().map(|s| (s, weight)).collect()
}

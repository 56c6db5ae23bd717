//! Risk configuration validation.
//!
//! The `[risk]` section accepts exactly the four [`RiskLimits`] fields. Any
//! other key is rejected rather than ignored, and every present value must
//! parse. Values given on the command line take precedence over the file.

use crate::domain::error::RankfolioError;
use crate::domain::risk::{
    RiskLimits, DEFAULT_MAX_DAILY_TURNOVER, DEFAULT_MAX_POSITIONS, DEFAULT_MAX_WEIGHT_PER_SYMBOL,
    DEFAULT_MIN_SCORE,
};
use crate::ports::config_port::ConfigPort;
use std::str::FromStr;

pub const RISK_SECTION: &str = "risk";

pub const RISK_KEYS: [&str; 4] = [
    "max_positions",
    "min_score",
    "max_weight_per_symbol",
    "max_daily_turnover",
];

/// Limits supplied directly by the caller, each overriding the file value.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct RiskOverrides {
    pub max_positions: Option<usize>,
    pub min_score: Option<f64>,
    pub max_weight_per_symbol: Option<f64>,
    pub max_daily_turnover: Option<f64>,
}

pub fn validate_risk_config(config: &dyn ConfigPort) -> Result<(), RankfolioError> {
    for key in config.keys(RISK_SECTION) {
        if !RISK_KEYS.contains(&key.as_str()) {
            return Err(RankfolioError::ConfigUnknownKey {
                section: RISK_SECTION.to_string(),
                key,
            });
        }
    }
    build_risk_limits(config, &RiskOverrides::default()).map(|_| ())
}

pub fn build_risk_limits(
    config: &dyn ConfigPort,
    overrides: &RiskOverrides,
) -> Result<RiskLimits, RankfolioError> {
    let max_positions = match overrides.max_positions {
        Some(v) => v,
        None => parse_key(config, "max_positions")?.unwrap_or(DEFAULT_MAX_POSITIONS),
    };
    let min_score = match overrides.min_score {
        Some(v) => v,
        None => parse_key(config, "min_score")?.unwrap_or(DEFAULT_MIN_SCORE),
    };
    let max_weight_per_symbol = match overrides.max_weight_per_symbol {
        Some(v) => v,
        None => parse_key(config, "max_weight_per_symbol")?
            .unwrap_or(DEFAULT_MAX_WEIGHT_PER_SYMBOL),
    };
    let max_daily_turnover = match overrides.max_daily_turnover {
        Some(v) => v,
        None => parse_key(config, "max_daily_turnover")?.unwrap_or(DEFAULT_MAX_DAILY_TURNOVER),
    };

    RiskLimits::new(
        max_positions,
        min_score,
        max_weight_per_symbol,
        max_daily_turnover,
    )
}

fn parse_key<T: FromStr>(config: &dyn ConfigPort, key: &str) -> Result<Option<T>, RankfolioError> {
    match config.get_string(RISK_SECTION, key) {
        None => Ok(None),
        Some(raw) => raw
            .parse::<T>()
            .map(Some)
            .map_err(|_| RankfolioError::ConfigInvalid {
                section: RISK_SECTION.to_string(),
                key: key.to_string(),
                reason: format!("cannot parse '{}'", raw),
            }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::file_config_adapter::FileConfigAdapter;

    fn config(content: &str) -> FileConfigAdapter {
        FileConfigAdapter::from_string(content).unwrap()
    }

    #[test]
    fn full_section_builds_limits() {
        let c = config(
            "[risk]\nmax_positions = 2\nmin_score = 0.65\nmax_weight_per_symbol = 0.4\nmax_daily_turnover = 0.5\n",
        );
        validate_risk_config(&c).unwrap();
        let limits = build_risk_limits(&c, &RiskOverrides::default()).unwrap();
        assert_eq!(limits, RiskLimits::new(2, 0.65, 0.4, 0.5).unwrap());
    }

    #[test]
    fn missing_section_uses_defaults() {
        let c = FileConfigAdapter::empty();
        validate_risk_config(&c).unwrap();
        let limits = build_risk_limits(&c, &RiskOverrides::default()).unwrap();
        assert_eq!(limits, RiskLimits::default());
    }

    #[test]
    fn overrides_win_over_file() {
        let c = config("[risk]\nmax_positions = 2\nmin_score = 0.1\n");
        let overrides = RiskOverrides {
            max_positions: Some(7),
            max_daily_turnover: Some(f64::INFINITY),
            ..RiskOverrides::default()
        };
        let limits = build_risk_limits(&c, &overrides).unwrap();
        assert_eq!(limits.max_positions(), 7);
        assert_eq!(limits.min_score(), 0.1);
        assert_eq!(limits.max_daily_turnover(), f64::INFINITY);
    }

    #[test]
    fn unknown_key_is_rejected() {
        let c = config("[risk]\nmax_positions = 2\nmax_leverage = 3\n");
        let err = validate_risk_config(&c).unwrap_err();
        assert!(matches!(
            err,
            RankfolioError::ConfigUnknownKey { ref key, .. } if key == "max_leverage"
        ));
    }

    #[test]
    fn unparseable_value_is_invalid() {
        let c = config("[risk]\nmax_positions = three\n");
        let err = validate_risk_config(&c).unwrap_err();
        assert!(matches!(
            err,
            RankfolioError::ConfigInvalid { ref key, .. } if key == "max_positions"
        ));
    }

    #[test]
    fn out_of_range_value_is_invalid() {
        let c = config("[risk]\nmax_weight_per_symbol = 1.5\n");
        let err = validate_risk_config(&c).unwrap_err();
        assert!(matches!(
            err,
            RankfolioError::ConfigInvalid { ref key, .. } if key == "max_weight_per_symbol"
        ));
    }

    #[test]
    fn infinite_values_parse() {
        let c = config("[risk]\nmin_score = -inf\nmax_daily_turnover = inf\n");
        let limits = build_risk_limits(&c, &RiskOverrides::default()).unwrap();
        assert_eq!(limits.min_score(), f64::NEG_INFINITY);
        assert_eq!(limits.max_daily_turnover(), f64::INFINITY);
    }
}

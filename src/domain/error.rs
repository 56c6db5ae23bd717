//! Domain error types.

/// Top-level error type for rankfolio.
#[derive(Debug, thiserror::Error)]
pub enum RankfolioError {
    #[error("malformed {source_name}: {reason}")]
    MalformedInput { source_name: String, reason: String },

    #[error("{source_name} contains no rows")]
    EmptyInput { source_name: String },

    #[error("insufficient data: have {days} trading days, need at least {minimum}")]
    InsufficientData { days: usize, minimum: usize },

    #[error("{count} duplicate (date,symbol) signal rows detected")]
    DuplicateSignals { count: usize },

    #[error("duplicate close for {symbol} on {date}")]
    DuplicatePrice { date: String, symbol: String },

    #[error("config parse error in {file}: {reason}")]
    ConfigParse { file: String, reason: String },

    #[error("invalid config value [{section}] {key}: {reason}")]
    ConfigInvalid {
        section: String,
        key: String,
        reason: String,
    },

    #[error("unknown config key [{section}] {key}")]
    ConfigUnknownKey { section: String, key: String },

    #[error("pipeline timed out after {timeout:?}")]
    PipelineTimeout { timeout: std::time::Duration },

    #[error("pipeline failed: {reason}")]
    PipelineFailed { reason: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl RankfolioError {
    pub(crate) fn malformed(source_name: impl Into<String>, reason: impl Into<String>) -> Self {
        RankfolioError::MalformedInput {
            source_name: source_name.into(),
            reason: reason.into(),
        }
    }
}

impl From<&RankfolioError> for std::process::ExitCode {
    fn from(err: &RankfolioError) -> Self {
        let code: u8 = match err {
            RankfolioError::Io(_) => 1,
            RankfolioError::ConfigParse { .. }
            | RankfolioError::ConfigInvalid { .. }
            | RankfolioError::ConfigUnknownKey { .. } => 2,
            RankfolioError::MalformedInput { .. }
            | RankfolioError::EmptyInput { .. }
            | RankfolioError::DuplicateSignals { .. }
            | RankfolioError::DuplicatePrice { .. } => 3,
            RankfolioError::InsufficientData { .. } => 4,
            RankfolioError::PipelineTimeout { .. } | RankfolioError::PipelineFailed { .. } => 5,
        };
        std::process::ExitCode::from(code)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_name_the_violated_precondition() {
        let err = RankfolioError::InsufficientData {
            days: 1,
            minimum: 2,
        };
        assert_eq!(
            err.to_string(),
            "insufficient data: have 1 trading days, need at least 2"
        );

        let err = RankfolioError::malformed("signal file", "missing column score");
        assert_eq!(err.to_string(), "malformed signal file: missing column score");
    }

    #[test]
    fn unknown_key_message() {
        let err = RankfolioError::ConfigUnknownKey {
            section: "risk".into(),
            key: "max_leverage".into(),
        };
        assert_eq!(err.to_string(), "unknown config key [risk] max_leverage");
    }

    #[test]
    fn timeout_message_keeps_sub_second_precision() {
        let err = RankfolioError::PipelineTimeout {
            timeout: std::time::Duration::from_millis(250),
        };
        assert_eq!(err.to_string(), "pipeline timed out after 250ms");

        let err = RankfolioError::PipelineTimeout {
            timeout: std::time::Duration::from_secs(30),
        };
        assert_eq!(err.to_string(), "pipeline timed out after 30s");
    }
}

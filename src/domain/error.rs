//! Domain error types.

/// Top-level error type for dualsignal.
#[derive(Debug, thiserror::Error)]
pub enum SignalError {
    #[error("insufficient data for {code}: have {bars} bars, need {minimum}")]
    InsufficientData {
        code: String,
        bars: usize,
        minimum: usize,
    },

    #[error("division by zero computing {what}")]
    DivisionByZero { what: String },

    #[error("data retrieval failed for {code}: {reason}")]
    DataRetrieval { code: String, reason: String },

    #[error("no data for {code}")]
    NoData { code: String },

    #[error("invalid price history for {code}: {reason}")]
    InvalidPriceHistory { code: String, reason: String },

    #[error("config parse error in {file}: {reason}")]
    ConfigParse { file: String, reason: String },

    #[error("missing config key [{section}] {key}")]
    ConfigMissing { section: String, key: String },

    #[error("invalid config value [{section}] {key}: {reason}")]
    ConfigInvalid {
        section: String,
        key: String,
        reason: String,
    },

    #[error("cache error: {reason}")]
    Cache { reason: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl SignalError {
    /// Attach an instrument code to an error raised by a code-agnostic calculation.
    pub fn for_code(self, code: &str) -> Self {
        match self {
            SignalError::InsufficientData { bars, minimum, .. } => SignalError::InsufficientData {
                code: code.to_string(),
                bars,
                minimum,
            },
            other => other,
        }
    }
}

impl From<&SignalError> for std::process::ExitCode {
    fn from(err: &SignalError) -> Self {
        let code: u8 = match err {
            SignalError::Io(_) | SignalError::Cache { .. } => 1,
            SignalError::ConfigParse { .. }
            | SignalError::ConfigMissing { .. }
            | SignalError::ConfigInvalid { .. } => 2,
            SignalError::DataRetrieval { .. }
            | SignalError::NoData { .. }
            | SignalError::InvalidPriceHistory { .. } => 3,
            SignalError::InsufficientData { .. } | SignalError::DivisionByZero { .. } => 5,
        };
        std::process::ExitCode::from(code)
    }
}

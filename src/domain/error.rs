//! Domain error types.

/// Top-level error type for barprep.
///
/// Per-row numeric problems (warm-up gaps, a single missing value) are never
/// errors; they travel through the tables as `None` and are resolved by the
/// cleaner. Everything here is fatal for the run.
#[derive(Debug, thiserror::Error)]
pub enum PrepError {
    #[error("data unavailable for {symbol}: {reason}")]
    DataUnavailable { symbol: String, reason: String },

    #[error("missing column {column} for {symbol}")]
    MissingColumn { symbol: String, column: String },

    #[error("invalid bar series for {symbol}: {reason}")]
    InvalidSeries { symbol: String, reason: String },

    #[error("split configuration error: {reason}")]
    SplitConfiguration { reason: String },

    #[error("schema mismatch after {stage}: expected column {column}")]
    SchemaMismatch { stage: String, column: String },

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

    #[error("bar source error: {reason}")]
    Source { reason: String },

    #[error("storage error: {reason}")]
    Storage { reason: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl PrepError {
    pub(crate) fn unavailable(symbol: &str, reason: impl Into<String>) -> Self {
        PrepError::DataUnavailable {
            symbol: symbol.to_string(),
            reason: reason.into(),
        }
    }

    pub(crate) fn split(reason: impl Into<String>) -> Self {
        PrepError::SplitConfiguration {
            reason: reason.into(),
        }
    }

    pub(crate) fn invalid_config(section: &str, key: &str, reason: impl Into<String>) -> Self {
        PrepError::ConfigInvalid {
            section: section.to_string(),
            key: key.to_string(),
            reason: reason.into(),
        }
    }
}

impl From<&PrepError> for std::process::ExitCode {
    fn from(err: &PrepError) -> Self {
        let code: u8 = match err {
            PrepError::Io(_) => 1,
            PrepError::ConfigParse { .. }
            | PrepError::ConfigMissing { .. }
            | PrepError::ConfigInvalid { .. } => 2,
            PrepError::DataUnavailable { .. }
            | PrepError::MissingColumn { .. }
            | PrepError::Source { .. } => 3,
            PrepError::InvalidSeries { .. } | PrepError::SchemaMismatch { .. } => 4,
            PrepError::SplitConfiguration { .. } => 5,
            PrepError::Storage { .. } => 6,
        };
        std::process::ExitCode::from(code)
    }
}

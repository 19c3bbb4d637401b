//! Domain error types.

use crate::domain::indicator::IndicatorKey;

/// Top-level error type for stratsim.
///
/// Every variant is raised before a fold starts; the per-bar step itself
/// cannot fail.
#[derive(Debug, thiserror::Error)]
pub enum StratsimError {
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

    #[error("unknown strategy '{name}'")]
    UnknownStrategy { name: String },

    #[error("data error: {reason}")]
    Data { reason: String },

    #[error("bar series is missing required indicator {key}")]
    MissingIndicator { key: IndicatorKey },

    #[error("timestamps must be strictly increasing (bar {index})")]
    UnorderedBars { index: usize },

    #[error(transparent)]
    Csv(#[from] csv::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl StratsimError {
    pub(crate) fn invalid(section: &str, key: &str, reason: impl Into<String>) -> Self {
        StratsimError::ConfigInvalid {
            section: section.to_string(),
            key: key.to_string(),
            reason: reason.into(),
        }
    }

    pub(crate) fn missing(section: &str, key: &str) -> Self {
        StratsimError::ConfigMissing {
            section: section.to_string(),
            key: key.to_string(),
        }
    }
}

impl From<&StratsimError> for std::process::ExitCode {
    fn from(err: &StratsimError) -> Self {
        let code: u8 = match err {
            StratsimError::Io(_) => 1,
            StratsimError::ConfigParse { .. }
            | StratsimError::ConfigMissing { .. }
            | StratsimError::ConfigInvalid { .. }
            | StratsimError::UnknownStrategy { .. } => 2,
            StratsimError::Data { .. } | StratsimError::Csv(_) => 3,
            StratsimError::MissingIndicator { .. } | StratsimError::UnorderedBars { .. } => 4,
        };
        std::process::ExitCode::from(code)
    }
}

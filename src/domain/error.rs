//! Domain error types.

use crate::domain::indicator::IndicatorKind;

/// Failure of a series primitive or indicator computation.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum IndicatorError {
    #[error("insufficient data: need {need} points, have {have}")]
    InsufficientData { need: usize, have: usize },

    #[error("length mismatch: expected {expected} values, found {found}")]
    LengthMismatch { expected: usize, found: usize },

    #[error("invalid parameter {name}: {reason}")]
    InvalidParameter { name: &'static str, reason: String },

    #[error("computation produced a non-finite value")]
    NonFinite,
}

impl IndicatorError {
    pub(crate) fn require(need: usize, have: usize) -> Result<(), IndicatorError> {
        if have < need {
            Err(IndicatorError::InsufficientData { need, have })
        } else {
            Ok(())
        }
    }

    pub(crate) fn positive_period(name: &'static str, period: usize) -> Result<(), IndicatorError> {
        if period == 0 {
            Err(IndicatorError::InvalidParameter {
                name,
                reason: "period must be at least 1".into(),
            })
        } else {
            Ok(())
        }
    }
}

/// Why an instrument produced no result record.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SkipReason {
    #[error("missing identity field {field}")]
    IdentityMissing { field: &'static str },

    #[error("malformed series: {reason}")]
    MalformedSeries { reason: String },

    #[error("insufficient data for {indicator}: need {need} points, have {have}")]
    InsufficientData {
        indicator: IndicatorScope,
        need: usize,
        have: usize,
    },

    #[error("{indicator} failed: {reason}")]
    ComputationFailed {
        indicator: IndicatorKind,
        reason: String,
    },
}

/// Which requirement a data-length skip was raised against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndicatorScope {
    /// The pipeline-wide minimum for full coverage.
    FullCoverage,
    Indicator(IndicatorKind),
}

impl std::fmt::Display for IndicatorScope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            IndicatorScope::FullCoverage => write!(f, "full coverage"),
            IndicatorScope::Indicator(kind) => write!(f, "{kind}"),
        }
    }
}

/// Top-level error type for stocksignals.
#[derive(Debug, thiserror::Error)]
pub enum ScanError {
    #[error("database error: {reason}")]
    Database { reason: String },

    #[error("database query error: {reason}")]
    DatabaseQuery { reason: String },

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

    #[error("report error: {reason}")]
    Report { reason: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl ScanError {
    pub(crate) fn invalid(section: &str, key: &str, reason: impl Into<String>) -> Self {
        ScanError::ConfigInvalid {
            section: section.to_string(),
            key: key.to_string(),
            reason: reason.into(),
        }
    }
}

impl From<&ScanError> for std::process::ExitCode {
    fn from(err: &ScanError) -> Self {
        let code: u8 = match err {
            ScanError::Io(_) => 1,
            ScanError::ConfigParse { .. }
            | ScanError::ConfigMissing { .. }
            | ScanError::ConfigInvalid { .. } => 2,
            ScanError::Database { .. } | ScanError::DatabaseQuery { .. } => 3,
            ScanError::Report { .. } => 6,
        };
        std::process::ExitCode::from(code)
    }
}

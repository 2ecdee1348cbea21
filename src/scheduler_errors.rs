use thiserror::Error;

#[derive(Error, Debug)]
pub enum SchedulerError {
    #[error("Missing required target field: {0}")]
    MissingField(String),

    #[error("Invalid value for field `{field}`: {reason}")]
    InvalidField { field: String, reason: String },

    #[error("Invalid target specification: {0}")]
    InvalidSpec(String),

    #[error("Unable to parse coordinate: {0}")]
    InvalidCoordinate(String),

    #[error("Unknown reference frame: {0}")]
    UnknownFrame(String),

    #[error("Invalid equinox: {0}")]
    InvalidEquinox(String),

    #[error("Name resolution failed for {name}: {reason}")]
    ResolutionFailed { name: String, reason: String },

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("HTTP reqwest error: {0}")]
    ReqwestError(#[from] reqwest::Error),

    #[error("Unable to perform file operation: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Invalid FITS file: {0}")]
    InvalidFits(String),

    #[error("FITS library error: {0}")]
    FitsError(#[from] fitsio::errors::Error),

    #[error("No visit left: the last visit has been handed out and is complete")]
    VisitsExhausted,
}

impl SchedulerError {
    /// Shorthand for [`SchedulerError::InvalidField`].
    pub(crate) fn invalid_field(field: &str, reason: impl Into<String>) -> Self {
        SchedulerError::InvalidField {
            field: field.to_string(),
            reason: reason.into(),
        }
    }

    /// `true` for the errors that stop a target from being built.
    pub fn is_configuration_error(&self) -> bool {
        use SchedulerError::*;
        matches!(
            self,
            MissingField(_)
                | InvalidField { .. }
                | InvalidSpec(_)
                | InvalidCoordinate(_)
                | UnknownFrame(_)
                | InvalidEquinox(_)
        )
    }
}

impl PartialEq for SchedulerError {
    fn eq(&self, other: &Self) -> bool {
        use SchedulerError::*;
        match (self, other) {
            (MissingField(a), MissingField(b)) => a == b,
            (
                InvalidField {
                    field: fa,
                    reason: ra,
                },
                InvalidField {
                    field: fb,
                    reason: rb,
                },
            ) => fa == fb && ra == rb,
            (InvalidSpec(a), InvalidSpec(b)) => a == b,
            (InvalidCoordinate(a), InvalidCoordinate(b)) => a == b,
            (UnknownFrame(a), UnknownFrame(b)) => a == b,
            (InvalidEquinox(a), InvalidEquinox(b)) => a == b,
            (
                ResolutionFailed {
                    name: na,
                    reason: ra,
                },
                ResolutionFailed {
                    name: nb,
                    reason: rb,
                },
            ) => na == nb && ra == rb,
            (InvalidUrl(a), InvalidUrl(b)) => a == b,
            (InvalidFits(a), InvalidFits(b)) => a == b,

            // not comparable, same variant is enough
            (ReqwestError(_), ReqwestError(_)) => true,
            (IoError(_), IoError(_)) => true,
            (FitsError(_), FitsError(_)) => true,

            (VisitsExhausted, VisitsExhausted) => true,

            _ => false,
        }
    }
}

use std::fmt;

/// Failures of viewport construction and grid generation.
#[derive(Debug, Clone, PartialEq)]
pub enum Error {
    /// A parameter was rejected before any computation started.
    InvalidArgument {
        parameter: &'static str,
        reason: String,
    },
    /// The cancellation flag was raised while rows were still pending.
    Cancelled,
}

impl Error {
    pub(crate) fn invalid(parameter: &'static str, reason: impl Into<String>) -> Self {
        Error::InvalidArgument {
            parameter,
            reason: reason.into(),
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidArgument { parameter, reason } => {
                write!(f, "invalid argument `{parameter}`: {reason}")
            }
            Self::Cancelled => write!(f, "grid generation was cancelled"),
        }
    }
}

impl std::error::Error for Error {}

pub type Result<T> = std::result::Result<T, Error>;

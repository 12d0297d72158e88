use serde::Serialize;
use thiserror::Error;

/// Errors raised while building, rendering or applying configuration steps.
///
/// `Connection` and `LockUnavailable` abort the whole run before any step is
/// attempted. Every other variant fails only the step that produced it.
#[derive(Debug, Clone, Error, Serialize, PartialEq, Eq)]
#[serde(tag = "kind", content = "detail", rename_all = "snake_case")]
pub enum Error {
    #[error("connection to device failed: {0}")]
    Connection(String),

    #[error("unable to lock running config: {0}")]
    LockUnavailable(String),

    #[error("{0} does not conform to expected interface name format")]
    MalformedInterfaceName(String),

    #[error("unable to determine XML interface name for \"{prefix}\" (derived from \"{name}\")")]
    UnknownInterfaceType { prefix: String, name: String },

    #[error("invalid {param} \"{value}\": {reason}")]
    InvalidParameter {
        param: &'static str,
        value: String,
        reason: String,
    },

    #[error("submission failed: {0}")]
    SubmissionFailure(String),

    #[error("template error: {0}")]
    Template(String),
}

impl Error {
    pub fn invalid(param: &'static str, value: &str, reason: impl Into<String>) -> Self {
        Error::InvalidParameter {
            param,
            value: value.to_string(),
            reason: reason.into(),
        }
    }
}

impl From<tera::Error> for Error {
    fn from(e: tera::Error) -> Self {
        // tera nests the useful message in the source chain
        let mut msg = e.to_string();
        let mut source = std::error::Error::source(&e);
        while let Some(inner) = source {
            msg.push_str(": ");
            msg.push_str(&inner.to_string());
            source = inner.source();
        }
        Error::Template(msg)
    }
}

pub type Result<T> = std::result::Result<T, Error>;

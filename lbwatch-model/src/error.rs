use std::fmt::{self, Display};

/// Errors produced by model constructors and parsers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModelError {
    InvalidUri { uri: String, reason: String },
    UnknownOption { uri: String, option: String },
    InvalidOption {
        uri: String,
        option: String,
        value: String,
    },
}

impl ModelError {
    /// The raw endpoint URI the error was raised for.
    pub fn uri(&self) -> &str {
        match self {
            ModelError::InvalidUri { uri, .. }
            | ModelError::UnknownOption { uri, .. }
            | ModelError::InvalidOption { uri, .. } => uri,
        }
    }
}

impl Display for ModelError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ModelError::InvalidUri { uri, reason } => {
                write!(f, "invalid endpoint uri '{uri}': {reason}")
            }
            ModelError::UnknownOption { uri, option } => {
                write!(f, "unknown option '{option}' on endpoint '{uri}'")
            }
            ModelError::InvalidOption { uri, option, value } => write!(
                f,
                "invalid value '{value}' for option '{option}' on endpoint '{uri}'"
            ),
        }
    }
}

impl std::error::Error for ModelError {}

pub type Result<T> = std::result::Result<T, ModelError>;

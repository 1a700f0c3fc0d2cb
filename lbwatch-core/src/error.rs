use std::path::PathBuf;

use lbwatch_model::ModelError;
use thiserror::Error;

use crate::endpoint::EndpointState;

/// Fatal, configuration-time failures of a single endpoint.
///
/// Every variant names the endpoint URI so the operator can tell which route
/// was rejected. None of them are retried.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigurationError {
    #[error("failed to resolve endpoint {uri}: PriorityFilterFactory is absent")]
    MissingFactory { uri: String },

    #[error(
        "failed to resolve endpoint {uri}: filter is already set, which stops the PriorityFilterFactory assigning one"
    )]
    FilterAlreadySet { uri: String },

    #[error(
        "failed to resolve endpoint {uri}: maxMessagesPerPoll is set as '{configured}' which does not match the amount of watchers '{expected}'"
    )]
    ConcurrencyMismatch {
        uri: String,
        configured: i64,
        expected: usize,
    },

    #[error("failed to resolve endpoint {uri}: cannot move from {from} to {to}")]
    InvalidTransition {
        uri: String,
        from: EndpointState,
        to: EndpointState,
    },
}

impl ConfigurationError {
    pub fn uri(&self) -> &str {
        match self {
            ConfigurationError::MissingFactory { uri }
            | ConfigurationError::FilterAlreadySet { uri }
            | ConfigurationError::ConcurrencyMismatch { uri, .. }
            | ConfigurationError::InvalidTransition { uri, .. } => uri,
        }
    }
}

#[derive(Error, Debug)]
pub enum PollError {
    #[error("endpoint {uri} is not ready to poll (state: {state})")]
    NotReady { uri: String, state: EndpointState },

    #[error("failed to list {}: {source}", .path.display())]
    ListDirectory {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Error, Debug)]
pub enum LbwatchError {
    #[error(transparent)]
    Model(#[from] ModelError),

    #[error(transparent)]
    Configuration(#[from] ConfigurationError),

    #[error(transparent)]
    Poll(#[from] PollError),

    #[error("invalid file name pattern '{pattern}': {source}")]
    Pattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },
}

pub type Result<T> = std::result::Result<T, LbwatchError>;

//! The polling-endpoint collaborator as seen by the coordinator.

use std::{fmt, path::PathBuf};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use lbwatch_model::WatcherPriority;
use serde::Serialize;

use crate::{
    error::{ConfigurationError, PollError},
    filter::{PriorityFilterFactory, SharedFilter},
};

pub mod file;

/// Lifecycle of an endpoint during finalization.
///
/// ```text
/// Unconfigured -> FilterBound -> ConcurrencyValidated -> DestinationTagged -> Ready
///       \______________\_______________\______________________\_____-> Failed
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EndpointState {
    #[default]
    Unconfigured,
    FilterBound,
    ConcurrencyValidated,
    DestinationTagged,
    Ready,
    Failed,
}

impl EndpointState {
    pub fn next(self) -> Option<Self> {
        match self {
            EndpointState::Unconfigured => Some(EndpointState::FilterBound),
            EndpointState::FilterBound => {
                Some(EndpointState::ConcurrencyValidated)
            }
            EndpointState::ConcurrencyValidated => {
                Some(EndpointState::DestinationTagged)
            }
            EndpointState::DestinationTagged => Some(EndpointState::Ready),
            EndpointState::Ready | EndpointState::Failed => None,
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, EndpointState::Ready | EndpointState::Failed)
    }

    pub fn can_transition_to(self, to: EndpointState) -> bool {
        match to {
            EndpointState::Failed => !self.is_terminal(),
            _ => self.next() == Some(to),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            EndpointState::Unconfigured => "unconfigured",
            EndpointState::FilterBound => "filter_bound",
            EndpointState::ConcurrencyValidated => "concurrency_validated",
            EndpointState::DestinationTagged => "destination_tagged",
            EndpointState::Ready => "ready",
            EndpointState::Failed => "failed",
        }
    }
}

impl fmt::Display for EndpointState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Properties of a polling endpoint the coordinator reads and rewrites
/// before the endpoint starts its poll loop.
pub trait PollingEndpoint {
    /// Identifying URI, used in error messages.
    fn endpoint_uri(&self) -> &str;

    fn filter_factory(&self) -> Option<&PriorityFilterFactory>;

    fn filter(&self) -> Option<&SharedFilter>;

    fn set_filter(&mut self, filter: SharedFilter);

    /// Files claimed per poll cycle. Zero or negative means unset.
    fn max_messages_per_poll(&self) -> i64;

    fn set_max_messages_per_poll(&mut self, value: i64);

    /// Destination for processed files, relative to the watched directory.
    fn move_path(&self) -> Option<&str>;

    fn set_move_path(&mut self, path: String);

    fn state(&self) -> EndpointState;

    fn set_state(&mut self, state: EndpointState);

    /// Move to `to`, rejecting anything but the next lifecycle step or
    /// `Failed`.
    fn advance(&mut self, to: EndpointState) -> Result<(), ConfigurationError> {
        let from = self.state();
        if !from.can_transition_to(to) {
            return Err(ConfigurationError::InvalidTransition {
                uri: self.endpoint_uri().to_string(),
                from,
                to,
            });
        }
        self.set_state(to);
        Ok(())
    }
}

/// One poll cycle: list candidates, filter them, claim the admitted ones.
#[async_trait]
pub trait PollCycle: Send + Sync {
    async fn poll_once(&self) -> Result<PollReport, PollError>;
}

/// Outcome of a single poll cycle.
#[derive(Debug, Clone, Serialize)]
pub struct PollReport {
    pub endpoint_uri: String,
    pub priority: Option<WatcherPriority>,
    /// Candidate files seen in the directory.
    pub listed: usize,
    /// Candidates admitted by the name patterns and the bound filter.
    pub admitted: usize,
    /// Destination paths of the files claimed this cycle.
    pub claimed: Vec<PathBuf>,
    pub failed: usize,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

impl PollReport {
    pub fn new(
        endpoint_uri: impl Into<String>,
        priority: Option<WatcherPriority>,
    ) -> Self {
        let now = Utc::now();
        Self {
            endpoint_uri: endpoint_uri.into(),
            priority,
            listed: 0,
            admitted: 0,
            claimed: Vec::new(),
            failed: 0,
            started_at: now,
            finished_at: now,
        }
    }

    /// Admitted files left in place because of `maxMessagesPerPoll`.
    pub fn deferred(&self) -> usize {
        self.admitted
            .saturating_sub(self.claimed.len())
            .saturating_sub(self.failed)
    }
}

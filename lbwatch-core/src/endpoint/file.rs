//! Directory-backed polling endpoint.

use std::{
    io,
    path::{Path, PathBuf},
    time::Duration,
};

use async_trait::async_trait;
use chrono::Utc;
use lbwatch_model::{CandidateFile, EndpointUri};
use tokio::fs;
use tracing::{debug, info, warn};

use super::{EndpointState, PollCycle, PollReport, PollingEndpoint};
use crate::{
    error::{PollError, Result},
    filter::{FileFilter, NameFilter, PriorityFilterFactory, SharedFilter},
};

/// Poll interval used when the endpoint URI carries no `delay`.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(500);

/// Watches one directory and moves claimed files below it.
#[derive(Debug)]
pub struct FileEndpoint {
    uri: String,
    directory: PathBuf,
    names: NameFilter,
    factory: Option<PriorityFilterFactory>,
    filter: Option<SharedFilter>,
    max_messages_per_poll: i64,
    move_path: Option<String>,
    poll_interval: Duration,
    state: EndpointState,
}

impl FileEndpoint {
    pub fn new(uri: impl Into<String>, directory: impl Into<PathBuf>) -> Self {
        Self {
            uri: uri.into(),
            directory: directory.into(),
            names: NameFilter::default(),
            factory: None,
            filter: None,
            max_messages_per_poll: 0,
            move_path: None,
            poll_interval: DEFAULT_POLL_INTERVAL,
            state: EndpointState::Unconfigured,
        }
    }

    /// Build an unconfigured endpoint from a parsed URI.
    pub fn from_uri(
        uri: &EndpointUri,
        factory: Option<PriorityFilterFactory>,
    ) -> Result<Self> {
        let options = uri.options();
        let names =
            NameFilter::new(options.include.as_deref(), options.exclude.as_deref())?;

        let mut endpoint = Self::new(uri.as_str(), uri.directory())
            .with_name_filter(names)
            .with_max_messages_per_poll(options.max_messages_per_poll.unwrap_or(0));
        endpoint.factory = factory;
        endpoint.move_path = options.move_path.clone();
        if let Some(delay_ms) = options.delay_ms {
            endpoint.poll_interval = Duration::from_millis(delay_ms);
        }
        Ok(endpoint)
    }

    pub fn with_factory(mut self, factory: PriorityFilterFactory) -> Self {
        self.factory = Some(factory);
        self
    }

    pub fn with_filter(mut self, filter: SharedFilter) -> Self {
        self.filter = Some(filter);
        self
    }

    pub fn with_max_messages_per_poll(mut self, value: i64) -> Self {
        self.max_messages_per_poll = value;
        self
    }

    pub fn with_move_path(mut self, path: impl Into<String>) -> Self {
        self.move_path = Some(path.into());
        self
    }

    pub fn with_name_filter(mut self, names: NameFilter) -> Self {
        self.names = names;
        self
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    pub fn poll_interval(&self) -> Duration {
        self.poll_interval
    }

    /// Directory claimed files are moved into.
    pub fn destination_dir(&self) -> PathBuf {
        match self.move_path.as_deref() {
            Some(path) => self.directory.join(path),
            None => self.directory.clone(),
        }
    }

    fn admits(&self, candidate: &CandidateFile) -> bool {
        self.names.accept(candidate)
            && self
                .filter
                .as_ref()
                .is_none_or(|filter| filter.accept(candidate))
    }

    async fn list_candidates(
        &self,
    ) -> std::result::Result<Vec<CandidateFile>, PollError> {
        let list_error = |source| PollError::ListDirectory {
            path: self.directory.clone(),
            source,
        };

        let mut entries =
            fs::read_dir(&self.directory).await.map_err(list_error)?;
        let mut candidates = Vec::new();
        while let Some(entry) = entries.next_entry().await.map_err(list_error)? {
            if entry.file_name().as_encoded_bytes().starts_with(b".") {
                continue;
            }
            let metadata = match entry.metadata().await {
                Ok(metadata) => metadata,
                Err(err) => {
                    debug!(
                        path = %entry.path().display(),
                        error = %err,
                        "skipping unreadable entry"
                    );
                    continue;
                }
            };
            if !metadata.is_file() {
                continue;
            }
            candidates.push(
                CandidateFile::new(entry.path()).with_size(metadata.len()),
            );
        }

        candidates.sort_by(|a, b| a.path().cmp(b.path()));
        Ok(candidates)
    }

    async fn claim(
        &self,
        candidate: &CandidateFile,
        destination: &Path,
    ) -> io::Result<PathBuf> {
        let Some(name) = candidate.file_name() else {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                "candidate has no file name",
            ));
        };

        fs::create_dir_all(destination).await?;
        let target = destination.join(name);
        fs::rename(candidate.path(), &target).await?;
        Ok(target)
    }
}

impl PollingEndpoint for FileEndpoint {
    fn endpoint_uri(&self) -> &str {
        &self.uri
    }

    fn filter_factory(&self) -> Option<&PriorityFilterFactory> {
        self.factory.as_ref()
    }

    fn filter(&self) -> Option<&SharedFilter> {
        self.filter.as_ref()
    }

    fn set_filter(&mut self, filter: SharedFilter) {
        self.filter = Some(filter);
    }

    fn max_messages_per_poll(&self) -> i64 {
        self.max_messages_per_poll
    }

    fn set_max_messages_per_poll(&mut self, value: i64) {
        self.max_messages_per_poll = value;
    }

    fn move_path(&self) -> Option<&str> {
        self.move_path.as_deref()
    }

    fn set_move_path(&mut self, path: String) {
        self.move_path = Some(path);
    }

    fn state(&self) -> EndpointState {
        self.state
    }

    fn set_state(&mut self, state: EndpointState) {
        self.state = state;
    }
}

#[async_trait]
impl PollCycle for FileEndpoint {
    async fn poll_once(&self) -> std::result::Result<PollReport, PollError> {
        if self.state != EndpointState::Ready {
            return Err(PollError::NotReady {
                uri: self.uri.clone(),
                state: self.state,
            });
        }

        let priority = self.filter.as_ref().and_then(|filter| filter.priority());
        let mut report = PollReport::new(self.uri.as_str(), priority);

        let candidates = self.list_candidates().await?;
        report.listed = candidates.len();

        let admitted: Vec<CandidateFile> = candidates
            .into_iter()
            .filter(|candidate| self.admits(candidate))
            .collect();
        report.admitted = admitted.len();

        let limit = usize::try_from(self.max_messages_per_poll)
            .ok()
            .filter(|limit| *limit > 0)
            .unwrap_or(usize::MAX);
        let destination = self.destination_dir();

        for candidate in admitted.iter().take(limit) {
            match self.claim(candidate, &destination).await {
                Ok(target) => report.claimed.push(target),
                Err(err) if err.kind() == io::ErrorKind::NotFound => {
                    debug!(
                        endpoint = %self.uri,
                        file = %candidate.path().display(),
                        "file vanished before it could be claimed"
                    );
                }
                Err(err) => {
                    report.failed += 1;
                    warn!(
                        endpoint = %self.uri,
                        file = %candidate.path().display(),
                        error = %err,
                        "failed to claim file"
                    );
                }
            }
        }

        report.finished_at = Utc::now();
        if !report.claimed.is_empty() {
            info!(
                endpoint = %self.uri,
                priority = ?priority.map(|p| p.get()),
                listed = report.listed,
                admitted = report.admitted,
                claimed = report.claimed.len(),
                deferred = report.deferred(),
                "poll cycle claimed files"
            );
        }
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_uri_copies_options() {
        let uri = EndpointUri::parse(
            "lbfile:/data/in?maxMessagesPerPoll=2&move=done&delay=40&include=.*%5C.csv",
        )
        .expect("parse");
        let endpoint = FileEndpoint::from_uri(&uri, None).expect("endpoint");

        assert_eq!(endpoint.endpoint_uri(), uri.as_str());
        assert_eq!(endpoint.directory(), Path::new("/data/in"));
        assert_eq!(endpoint.max_messages_per_poll(), 2);
        assert_eq!(endpoint.move_path(), Some("done"));
        assert_eq!(endpoint.poll_interval(), Duration::from_millis(40));
        assert_eq!(endpoint.destination_dir(), PathBuf::from("/data/in/done"));
        assert!(endpoint.filter().is_none());
        assert!(endpoint.filter_factory().is_none());
        assert_eq!(endpoint.state(), EndpointState::Unconfigured);
    }

    #[test]
    fn from_uri_rejects_bad_patterns() {
        let uri = EndpointUri::parse("lbfile:/data/in?exclude=(").expect("parse");
        assert!(FileEndpoint::from_uri(&uri, None).is_err());
    }

    #[tokio::test]
    async fn refuses_to_poll_before_ready() {
        let endpoint = FileEndpoint::new("lbfile:/nowhere", "/nowhere");
        let err = endpoint.poll_once().await.expect_err("not ready");

        assert!(matches!(
            err,
            PollError::NotReady {
                state: EndpointState::Unconfigured,
                ..
            }
        ));
    }
}

//! # lbwatch core
//!
//! Coordination layer for a pool of independent file-polling watchers sharing
//! one directory tree. Every watcher receives a [`PriorityFileFilter`] from a
//! shared [`PriorityFilterFactory`]; the filters partition the visible file
//! set so that each file is admitted by exactly one watcher.
//!
//! ## Architecture
//!
//! - [`filter`]: the [`FileFilter`] capability trait, the priority partition
//!   filter, the factory issuing them, and a regex name filter.
//! - [`coordinator`]: one-shot endpoint finalization. Binds the filter, keeps
//!   `maxMessagesPerPoll` equal to the pool size, and tags the processed-file
//!   destination with the watcher priority.
//! - [`endpoint`]: the [`PollingEndpoint`] contract the coordinator drives, and
//!   [`FileEndpoint`], a minimal directory poller implementing it.
//! - [`runtime`]: spawns one polling loop per ready endpoint.
//!
//! ## Examples
//!
//! ```no_run
//! use lbwatch_core::{
//!     FileEndpoint, PollCycle, PriorityFilterFactory, finalize_endpoint,
//! };
//! use lbwatch_model::EndpointUri;
//!
//! async fn start() -> Result<(), Box<dyn std::error::Error>> {
//!     let factory = PriorityFilterFactory::new();
//!     let uri = EndpointUri::parse("lbfile:/data/inbox")?;
//!     let mut endpoint = FileEndpoint::from_uri(&uri, Some(factory.clone()))?;
//!
//!     finalize_endpoint(&mut endpoint)?;
//!     let report = endpoint.poll_once().await?;
//!     println!("claimed {} files", report.claimed.len());
//!     Ok(())
//! }
//! ```

#![cfg_attr(docsrs, feature(doc_cfg))]
#![allow(missing_docs)]

/// Endpoint finalization: filter binding, concurrency validation, destination tagging
pub mod coordinator;

/// Polling endpoint contract and the directory-backed implementation
pub mod endpoint;

/// Error types and error handling utilities
pub mod error;

/// File filters and the priority filter factory
pub mod filter;

/// Polling loops for ready endpoints
pub mod runtime;

pub use coordinator::{
    DEFAULT_MOVE_ROOT, finalize_endpoint, tag_destination, tag_move_path,
};
pub use endpoint::{
    EndpointState, PollCycle, PollReport, PollingEndpoint,
    file::{DEFAULT_POLL_INTERVAL, FileEndpoint},
};
pub use error::{ConfigurationError, LbwatchError, PollError, Result};
pub use filter::{
    FileFilter, NameFilter, PriorityFileFilter, PriorityFilterFactory,
    SharedFilter, partition_bucket,
};
pub use runtime::WatcherRuntime;

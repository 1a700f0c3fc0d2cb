//! Core data model definitions shared across lbwatch crates.
#![allow(missing_docs)]

pub mod candidate;
pub mod endpoint_uri;
pub mod error;
pub mod priority;

// Intentionally curated re-exports for downstream consumers.
pub use candidate::CandidateFile;
pub use endpoint_uri::{ENDPOINT_SCHEMES, EndpointOptions, EndpointUri};
pub use error::{ModelError, Result as ModelResult};
pub use priority::{PRIORITY_BASE, WatcherPriority};

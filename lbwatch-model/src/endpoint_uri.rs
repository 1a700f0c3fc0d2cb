//! Parsing of `lbfile:` endpoint URIs.
//!
//! ```text
//! lbfile:/data/inbox?move=.done&include=.*\.csv&delay=250
//! ```
//!
//! The directory is the URI path (a host component is treated as the first
//! relative segment, so `lbfile://inbox/orders` means `inbox/orders`). Every
//! query parameter must be one of the options recognised by
//! [`EndpointOptions`].

use std::{fmt, path::{Path, PathBuf}, str::FromStr};

use url::Url;

use crate::error::{ModelError, Result};

/// Schemes accepted for watcher endpoints.
pub const ENDPOINT_SCHEMES: &[&str] = &["lbfile", "file"];

const OPT_MAX_MESSAGES_PER_POLL: &str = "maxMessagesPerPoll";
const OPT_MOVE: &str = "move";
const OPT_INCLUDE: &str = "include";
const OPT_EXCLUDE: &str = "exclude";
const OPT_DELAY: &str = "delay";

/// Options carried in the query string of an endpoint URI.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EndpointOptions {
    /// Files to claim per poll cycle. `None`, zero, or negative means unset.
    pub max_messages_per_poll: Option<i64>,
    /// Directory (relative to the watched directory) receiving processed files.
    pub move_path: Option<String>,
    /// Regex a file name must fully match to be considered.
    pub include: Option<String>,
    /// Regex excluding file names that fully match it.
    pub exclude: Option<String>,
    /// Poll interval in milliseconds.
    pub delay_ms: Option<u64>,
}

/// A parsed endpoint URI. Keeps the raw text for error reporting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EndpointUri {
    raw: String,
    directory: PathBuf,
    options: EndpointOptions,
}

impl EndpointUri {
    pub fn parse(raw: &str) -> Result<Self> {
        let trimmed = raw.trim();
        let invalid = |reason: String| ModelError::InvalidUri {
            uri: trimmed.to_string(),
            reason,
        };

        let url = Url::parse(trimmed).map_err(|err| invalid(err.to_string()))?;
        if !ENDPOINT_SCHEMES.contains(&url.scheme()) {
            return Err(invalid(format!(
                "unsupported scheme '{}', expected one of {:?}",
                url.scheme(),
                ENDPOINT_SCHEMES
            )));
        }

        let path = urlencoding::decode(url.path())
            .map_err(|err| invalid(format!("path is not valid utf-8: {err}")))?;
        let directory = match url.host_str().filter(|host| !host.is_empty()) {
            Some(host) => {
                PathBuf::from(host).join(path.trim_start_matches('/'))
            }
            None => PathBuf::from(path.as_ref()),
        };
        if directory.as_os_str().is_empty() {
            return Err(invalid("missing directory".to_string()));
        }

        let mut options = EndpointOptions::default();
        for (key, value) in url.query_pairs() {
            options.apply(trimmed, &key, &value)?;
        }

        Ok(Self {
            raw: trimmed.to_string(),
            directory,
            options,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    pub fn options(&self) -> &EndpointOptions {
        &self.options
    }
}

impl EndpointOptions {
    fn apply(&mut self, uri: &str, key: &str, value: &str) -> Result<()> {
        let invalid = || ModelError::InvalidOption {
            uri: uri.to_string(),
            option: key.to_string(),
            value: value.to_string(),
        };

        match key {
            OPT_MAX_MESSAGES_PER_POLL => {
                self.max_messages_per_poll =
                    Some(value.trim().parse().map_err(|_| invalid())?);
            }
            OPT_DELAY => {
                let delay: u64 = value.trim().parse().map_err(|_| invalid())?;
                if delay == 0 {
                    return Err(invalid());
                }
                self.delay_ms = Some(delay);
            }
            OPT_MOVE => self.move_path = non_empty(value),
            OPT_INCLUDE => self.include = non_empty(value),
            OPT_EXCLUDE => self.exclude = non_empty(value),
            _ => {
                return Err(ModelError::UnknownOption {
                    uri: uri.to_string(),
                    option: key.to_string(),
                });
            }
        }
        Ok(())
    }
}

fn non_empty(value: &str) -> Option<String> {
    (!value.is_empty()).then(|| value.to_string())
}

impl FromStr for EndpointUri {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl fmt::Display for EndpointUri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_absolute_directory_and_options() {
        let uri = EndpointUri::parse(
            "lbfile:/data/inbox?maxMessagesPerPoll=3&move=.done&delay=250",
        )
        .expect("parse");

        assert_eq!(uri.directory(), Path::new("/data/inbox"));
        assert_eq!(uri.options().max_messages_per_poll, Some(3));
        assert_eq!(uri.options().move_path.as_deref(), Some(".done"));
        assert_eq!(uri.options().delay_ms, Some(250));
        assert_eq!(uri.options().include, None);
    }

    #[test]
    fn parses_relative_directories() {
        let opaque = EndpointUri::parse("lbfile:inbox/orders").expect("parse");
        assert_eq!(opaque.directory(), Path::new("inbox/orders"));

        let hosted = EndpointUri::parse("file://inbox/orders").expect("parse");
        assert_eq!(hosted.directory(), Path::new("inbox/orders"));
    }

    #[test]
    fn decodes_percent_encoded_paths() {
        let uri = EndpointUri::parse("lbfile:/data/my%20inbox").expect("parse");
        assert_eq!(uri.directory(), Path::new("/data/my inbox"));
    }

    #[test]
    fn keeps_negative_max_messages_for_the_coordinator() {
        let uri =
            EndpointUri::parse("lbfile:/in?maxMessagesPerPoll=-1").expect("parse");
        assert_eq!(uri.options().max_messages_per_poll, Some(-1));
    }

    #[test]
    fn rejects_unknown_scheme() {
        let err = EndpointUri::parse("ftp://host/in").expect_err("scheme");
        assert!(matches!(err, ModelError::InvalidUri { .. }));
        assert_eq!(err.uri(), "ftp://host/in");
    }

    #[test]
    fn rejects_unknown_and_malformed_options() {
        let err = EndpointUri::parse("lbfile:/in?recursive=true").expect_err("unknown");
        assert_eq!(
            err,
            ModelError::UnknownOption {
                uri: "lbfile:/in?recursive=true".to_string(),
                option: "recursive".to_string(),
            }
        );

        let err =
            EndpointUri::parse("lbfile:/in?maxMessagesPerPoll=lots").expect_err("value");
        assert!(matches!(err, ModelError::InvalidOption { ref option, .. } if option == "maxMessagesPerPoll"));
    }

    #[test]
    fn rejects_zero_delay() {
        let err = EndpointUri::parse("lbfile:/in?delay=0").expect_err("zero delay");
        assert_eq!(
            err,
            ModelError::InvalidOption {
                uri: "lbfile:/in?delay=0".to_string(),
                option: "delay".to_string(),
                value: "0".to_string(),
            }
        );
    }

    #[test]
    fn rejects_missing_directory() {
        let err = EndpointUri::parse("lbfile:?move=x").expect_err("directory");
        assert!(err.to_string().contains("missing directory"));
    }
}

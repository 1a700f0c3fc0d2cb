use serde::{Deserialize, Serialize};

fn default_poll_interval() -> String {
    "500ms".to_string()
}

/// Settings applied to every route that does not override them.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct PollDefaults {
    /// Poll cadence (humantime, e.g. `500ms`, `5s`). A route's own
    /// `poll_interval`, or a `delay` option in its URI, takes precedence.
    pub poll_interval: String,
}

impl Default for PollDefaults {
    fn default() -> Self {
        Self {
            poll_interval: default_poll_interval(),
        }
    }
}

/// One watcher: a directory endpoint URI plus scheduling overrides.
///
/// Every route receives its own priority filter from the shared factory, so
/// routes meant to split one directory should list the same directory.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct RouteConfig {
    /// Label used in logs; defaults to the URI.
    #[serde(default)]
    pub name: Option<String>,
    /// `lbfile:<directory>?<options>`
    pub uri: String,
    #[serde(default)]
    pub poll_interval: Option<String>,
}

impl RouteConfig {
    pub fn new(uri: impl Into<String>) -> Self {
        Self {
            name: None,
            uri: uri.into(),
            poll_interval: None,
        }
    }

    pub fn label(&self) -> &str {
        self.name.as_deref().unwrap_or(&self.uri)
    }
}

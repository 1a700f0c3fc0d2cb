pub mod routes;
pub mod watch;

use std::path::PathBuf;

pub use routes::{PollDefaults, RouteConfig};
pub use watch::{ConfigFormat, DEFAULT_FILES, WatchConfig};

/// Source that produced the watch configuration.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum WatchConfigSource {
    #[default]
    Default,
    /// Explicit `--config` path.
    Cli(PathBuf),
    EnvPath(PathBuf),
    EnvInline,
    File(PathBuf),
}

impl std::fmt::Display for WatchConfigSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            WatchConfigSource::Default => f.write_str("defaults"),
            WatchConfigSource::Cli(path) => {
                write!(f, "--config {}", path.display())
            }
            WatchConfigSource::EnvPath(path) => {
                write!(f, "LBWATCH_CONFIG_PATH={}", path.display())
            }
            WatchConfigSource::EnvInline => f.write_str("LBWATCH_CONFIG_JSON"),
            WatchConfigSource::File(path) => write!(f, "{}", path.display()),
        }
    }
}

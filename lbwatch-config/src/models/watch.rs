use anyhow::{Context, anyhow};
use serde::{Deserialize, Serialize};
use std::{
    env, fs,
    path::{Path, PathBuf},
};

use super::{PollDefaults, RouteConfig, WatchConfigSource};

pub const CONFIG_PATH_VAR: &str = "LBWATCH_CONFIG_PATH";
pub const CONFIG_JSON_VAR: &str = "LBWATCH_CONFIG_JSON";

/// Top-level watcher settings: shared polling defaults and the routes to
/// start, in the order their filters are issued.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct WatchConfig {
    pub defaults: PollDefaults,
    pub routes: Vec<RouteConfig>,
}

/// Encoding of a config document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    Toml,
    Json,
    /// No recognised extension: TOML is tried first, then JSON.
    Detect,
}

impl ConfigFormat {
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("json") => ConfigFormat::Json,
            Some("toml" | "tml") => ConfigFormat::Toml,
            _ => ConfigFormat::Detect,
        }
    }
}

/// Files probed in the working directory when nothing else names a config.
pub const DEFAULT_FILES: &[&str] =
    &["lbwatch.toml", "lbwatch.json", "config/lbwatch.toml"];

impl WatchConfig {
    /// Load configuration using environment variables.
    /// Evaluation order:
    /// 1) `$LBWATCH_CONFIG_PATH` (TOML or JSON file),
    /// 2) `$LBWATCH_CONFIG_JSON` (inline JSON),
    /// 3) the first of [`DEFAULT_FILES`] that exists,
    /// 4) defaults (no routes).
    pub fn load_from_env() -> anyhow::Result<(Self, WatchConfigSource)> {
        let source = Self::resolve_source(None);
        let config = Self::load_source(&source)?;
        Ok((config, source))
    }

    /// Load from an explicit path, falling back to the environment when
    /// `path` is `None`.
    pub fn load(path: Option<&Path>) -> anyhow::Result<(Self, WatchConfigSource)> {
        let source = Self::resolve_source(path);
        let config = Self::load_source(&source)?;
        Ok((config, source))
    }

    /// Decide where the configuration comes from without reading it.
    pub fn resolve_source(cli_path: Option<&Path>) -> WatchConfigSource {
        if let Some(path) = cli_path {
            return WatchConfigSource::Cli(path.to_path_buf());
        }
        if let Some(path) = non_blank_var(CONFIG_PATH_VAR) {
            return WatchConfigSource::EnvPath(PathBuf::from(path));
        }
        if non_blank_var(CONFIG_JSON_VAR).is_some() {
            return WatchConfigSource::EnvInline;
        }
        match Self::find_default_file() {
            Some(path) => WatchConfigSource::File(path),
            None => WatchConfigSource::Default,
        }
    }

    pub fn load_source(source: &WatchConfigSource) -> anyhow::Result<Self> {
        match source {
            WatchConfigSource::Default => Ok(Self::default()),
            WatchConfigSource::Cli(path)
            | WatchConfigSource::EnvPath(path)
            | WatchConfigSource::File(path) => Self::load_from_file(path),
            WatchConfigSource::EnvInline => {
                let raw = non_blank_var(CONFIG_JSON_VAR).unwrap_or_default();
                Self::decode(&raw, ConfigFormat::Json, CONFIG_JSON_VAR)
            }
        }
    }

    pub fn load_from_file(path: &Path) -> anyhow::Result<Self> {
        let contents = fs::read_to_string(path).with_context(|| {
            format!("failed to read watch config from {}", path.display())
        })?;
        Self::decode(
            &contents,
            ConfigFormat::from_path(path),
            &path.display().to_string(),
        )
    }

    /// Parse TOML, falling back to JSON.
    pub fn parse_from_str(contents: &str, origin: &str) -> anyhow::Result<Self> {
        Self::decode(contents, ConfigFormat::Detect, origin)
    }

    pub fn decode(
        contents: &str,
        format: ConfigFormat,
        origin: &str,
    ) -> anyhow::Result<Self> {
        match format {
            ConfigFormat::Toml => toml::from_str(contents)
                .map_err(|err| anyhow!("invalid watch config {origin}: {err}")),
            ConfigFormat::Json => serde_json::from_str(contents)
                .map_err(|err| anyhow!("invalid watch config {origin}: {err}")),
            ConfigFormat::Detect => toml::from_str(contents).or_else(|toml_err| {
                serde_json::from_str(contents).map_err(|json_err| {
                    anyhow!(
                        "failed to parse watch config {origin}: toml error: {toml_err}; json error: {json_err}"
                    )
                })
            }),
        }
    }

    fn find_default_file() -> Option<PathBuf> {
        DEFAULT_FILES
            .iter()
            .map(PathBuf::from)
            .find(|candidate| candidate.is_file())
    }
}

fn non_blank_var(key: &str) -> Option<String> {
    env::var(key)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn toml_routes_keep_declaration_order() {
        let config = WatchConfig::parse_from_str(
            r#"
            [defaults]
            poll_interval = "2s"

            [[routes]]
            name = "first"
            uri = "lbfile:/data/inbox"

            [[routes]]
            uri = "lbfile:/data/inbox?move=done"
            poll_interval = "250ms"
            "#,
            "inline",
        )
        .expect("toml");

        assert_eq!(config.defaults.poll_interval, "2s");
        assert_eq!(config.routes.len(), 2);
        assert_eq!(config.routes[0].label(), "first");
        assert_eq!(config.routes[1].label(), "lbfile:/data/inbox?move=done");
        assert_eq!(config.routes[1].poll_interval.as_deref(), Some("250ms"));
    }

    #[test]
    fn json_is_accepted_as_fallback() {
        let config = WatchConfig::parse_from_str(
            r#"{"routes": [{"uri": "lbfile:/in"}]}"#,
            "inline",
        )
        .expect("json");

        assert_eq!(config.routes, vec![RouteConfig::new("lbfile:/in")]);
        assert_eq!(config.defaults.poll_interval, "500ms");
    }

    #[test]
    fn format_follows_extension() {
        assert_eq!(ConfigFormat::from_path(Path::new("a.json")), ConfigFormat::Json);
        assert_eq!(ConfigFormat::from_path(Path::new("a.tml")), ConfigFormat::Toml);
        assert_eq!(ConfigFormat::from_path(Path::new("a.conf")), ConfigFormat::Detect);
    }

    #[test]
    fn explicit_format_does_not_fall_back() {
        let err = WatchConfig::decode(
            r#"{"routes": []}"#,
            ConfigFormat::Toml,
            "watch.toml",
        )
        .expect_err("json is not toml");
        assert!(err.to_string().contains("watch.toml"), "{err}");
    }

    #[test]
    fn cli_path_wins_without_reading_env() {
        let path = Path::new("/etc/lbwatch/routes.toml");
        assert_eq!(
            WatchConfig::resolve_source(Some(path)),
            WatchConfigSource::Cli(path.to_path_buf())
        );
    }

    #[test]
    fn reports_both_parse_errors() {
        let err = WatchConfig::parse_from_str("routes = [", "broken")
            .expect_err("invalid");
        let message = err.to_string();
        assert!(message.contains("toml error"), "{message}");
        assert!(message.contains("json error"), "{message}");
    }
}

//! Non-fatal checks over a loaded [`WatchConfig`].
//!
//! Fatal problems (bad URIs, concurrency mismatches) are left to route
//! bootstrap, which rejects the offending route only. The warnings here point
//! at setups that start fine but behave surprisingly.

use std::{
    collections::{BTreeMap, BTreeSet},
    path::PathBuf,
};

use lbwatch_model::EndpointUri;

use crate::{models::WatchConfig, util::parse_interval};

/// A configuration issue worth surfacing to the operator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigWarning {
    pub message: String,
    pub hint: Option<String>,
}

impl ConfigWarning {
    fn new(message: impl Into<String>, hint: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            hint: Some(hint.into()),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct ConfigWarnings {
    pub items: Vec<ConfigWarning>,
}

impl ConfigWarnings {
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn push(&mut self, warning: ConfigWarning) {
        self.items.push(warning);
    }

    pub fn iter(&self) -> impl Iterator<Item = &ConfigWarning> {
        self.items.iter()
    }
}

pub fn validate(config: &WatchConfig) -> ConfigWarnings {
    let mut warnings = ConfigWarnings::default();

    if config.routes.is_empty() {
        warnings.push(ConfigWarning::new(
            "no routes configured",
            "add [[routes]] entries with lbfile:<directory> URIs",
        ));
        return warnings;
    }

    if parse_interval(&config.defaults.poll_interval).is_err() {
        warnings.push(ConfigWarning::new(
            format!(
                "default poll interval '{}' is not a valid duration",
                config.defaults.poll_interval
            ),
            "routes without their own interval will be rejected; use values like 500ms or 5s",
        ));
    }

    let mut directories: BTreeMap<PathBuf, BTreeSet<String>> = BTreeMap::new();
    for (position, route) in config.routes.iter().enumerate() {
        if let Some(raw) = &route.poll_interval
            && parse_interval(raw).is_err()
        {
            warnings.push(ConfigWarning::new(
                format!("route '{}' has invalid poll interval '{raw}'", route.label()),
                "the route will be rejected at startup",
            ));
        }

        let uri = match EndpointUri::parse(&route.uri) {
            Ok(uri) => uri,
            Err(err) => {
                warnings.push(ConfigWarning::new(
                    format!("route '{}' has an invalid uri: {err}", route.label()),
                    "the route will be rejected at startup",
                ));
                continue;
            }
        };
        directories
            .entry(uri.directory().to_path_buf())
            .or_default()
            .insert(uri.options().move_path.clone().unwrap_or_default());

        // Pool size once this route's filter is issued, assuming every
        // earlier route starts.
        let expected = position + 1;
        if let Some(configured) = uri.options().max_messages_per_poll
            && configured > 0
        {
            let hint = if configured as u64 == expected as u64 {
                "leave it unset; it is always derived from the number of watchers".to_string()
            } else {
                format!(
                    "it must equal the number of watchers configured so far ({expected}) or the route is rejected"
                )
            };
            warnings.push(ConfigWarning::new(
                format!(
                    "route '{}' sets maxMessagesPerPoll={configured} explicitly",
                    route.label()
                ),
                hint,
            ));
        }
    }

    for (directory, move_paths) in &directories {
        if move_paths.len() > 1 {
            warnings.push(ConfigWarning::new(
                format!(
                    "routes watching {} use {} different move paths",
                    directory.display(),
                    move_paths.len()
                ),
                "processed files end up under unrelated destination names; give every route the same move option",
            ));
        }
    }

    if directories.len() > 1 {
        warnings.push(ConfigWarning::new(
            format!(
                "routes watch {} different directories with one shared watcher pool",
                directories.len()
            ),
            "a file is only claimed by the watcher its name hashes to; point every route at the same directory",
        ));
    }

    warnings
}

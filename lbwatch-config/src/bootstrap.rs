//! Turns configured routes into finalized endpoints.
//!
//! Routes are finalized in declaration order against one shared factory, so
//! the N-th successful route gets priority N. A route that fails (bad URI,
//! bad interval, or a coordinator rejection) is recorded and skipped; its
//! siblings still start. Every route is finalized before any of them polls,
//! which keeps the pool size stable once polling begins.

use std::time::Duration;

use anyhow::Context;
use lbwatch_core::{
    EndpointState, FileEndpoint, PollingEndpoint, PriorityFilterFactory,
    finalize_endpoint,
};
use lbwatch_model::{EndpointUri, WatcherPriority};
use serde::Serialize;
use tracing::{error, info};

use crate::{
    models::{PollDefaults, RouteConfig, WatchConfig},
    util::parse_interval,
};

/// A route whose endpoint reached `Ready`.
#[derive(Debug)]
pub struct ReadyRoute {
    pub name: String,
    pub endpoint: FileEndpoint,
}

impl ReadyRoute {
    pub fn priority(&self) -> Option<WatcherPriority> {
        self.endpoint.filter().and_then(|filter| filter.priority())
    }
}

/// A route rejected during bootstrap.
#[derive(Debug)]
pub struct FailedRoute {
    pub name: String,
    pub uri: String,
    pub error: anyhow::Error,
}

#[derive(Debug, Default)]
pub struct RouteBootstrap {
    pub ready: Vec<ReadyRoute>,
    pub failed: Vec<FailedRoute>,
}

/// Printable outcome of one route.
#[derive(Debug, Clone, Serialize)]
pub struct RouteSummary {
    pub name: String,
    pub uri: String,
    pub state: EndpointState,
    pub priority: Option<WatcherPriority>,
    pub max_messages_per_poll: Option<i64>,
    pub move_path: Option<String>,
    pub poll_interval_ms: Option<u64>,
    pub error: Option<String>,
}

impl RouteBootstrap {
    pub fn is_clean(&self) -> bool {
        self.failed.is_empty()
    }

    pub fn summaries(&self) -> Vec<RouteSummary> {
        let ready = self.ready.iter().map(|route| RouteSummary {
            name: route.name.clone(),
            uri: route.endpoint.endpoint_uri().to_string(),
            state: route.endpoint.state(),
            priority: route.priority(),
            max_messages_per_poll: Some(route.endpoint.max_messages_per_poll()),
            move_path: route.endpoint.move_path().map(str::to_string),
            poll_interval_ms: Some(
                route.endpoint.poll_interval().as_millis() as u64
            ),
            error: None,
        });
        let failed = self.failed.iter().map(|route| RouteSummary {
            name: route.name.clone(),
            uri: route.uri.clone(),
            state: EndpointState::Failed,
            priority: None,
            max_messages_per_poll: None,
            move_path: None,
            poll_interval_ms: None,
            error: Some(format!("{:#}", route.error)),
        });
        ready.chain(failed).collect()
    }
}

/// Build and finalize every route of `config` on `factory`.
pub fn bootstrap_routes(
    config: &WatchConfig,
    factory: &PriorityFilterFactory,
) -> RouteBootstrap {
    let mut outcome = RouteBootstrap::default();

    for route in &config.routes {
        let name = route.label().to_string();
        match build_route(route, &config.defaults, factory) {
            Ok(endpoint) => {
                info!(
                    route = %name,
                    priority = ?endpoint.filter().and_then(|f| f.priority()).map(|p| p.get()),
                    max_messages_per_poll = endpoint.max_messages_per_poll(),
                    move_path = endpoint.move_path().unwrap_or_default(),
                    "route ready"
                );
                outcome.ready.push(ReadyRoute { name, endpoint });
            }
            Err(err) => {
                error!(route = %name, uri = %route.uri, error = %format!("{err:#}"), "route rejected");
                outcome.failed.push(FailedRoute {
                    name,
                    uri: route.uri.clone(),
                    error: err,
                });
            }
        }
    }

    info!(
        ready = outcome.ready.len(),
        failed = outcome.failed.len(),
        pool_size = factory.pool_size(),
        "route bootstrap finished"
    );
    outcome
}

fn build_route(
    route: &RouteConfig,
    defaults: &PollDefaults,
    factory: &PriorityFilterFactory,
) -> anyhow::Result<FileEndpoint> {
    let uri = EndpointUri::parse(&route.uri)?;

    let interval = resolve_interval(route, &uri, defaults)?;
    let mut endpoint = FileEndpoint::from_uri(&uri, Some(factory.clone()))?;
    if let Some(interval) = interval {
        endpoint = endpoint.with_poll_interval(interval);
    }

    finalize_endpoint(&mut endpoint)?;
    Ok(endpoint)
}

/// Route interval, else the URI `delay` (`None`: keep it), else the default.
fn resolve_interval(
    route: &RouteConfig,
    uri: &EndpointUri,
    defaults: &PollDefaults,
) -> anyhow::Result<Option<Duration>> {
    if let Some(raw) = &route.poll_interval {
        return parse_interval(raw)
            .with_context(|| format!("route '{}'", route.label()))
            .map(Some);
    }
    if uri.options().delay_ms.is_some() {
        return Ok(None);
    }
    parse_interval(&defaults.poll_interval)
        .context("defaults.poll_interval")
        .map(Some)
}

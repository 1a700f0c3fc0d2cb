//! Endpoint finalization.
//!
//! Runs once per endpoint, after its options are parsed and before it starts
//! polling. In order:
//!
//! 1. a [`PriorityFilterFactory`] must be configured;
//! 2. no filter may be bound yet; the factory issues one;
//! 3. `maxMessagesPerPoll` is set to the pool size, or checked against it
//!    when explicitly configured;
//! 4. the processed-file destination gets the watcher priority appended.
//!
//! Any failure leaves the endpoint `Failed` with its properties untouched,
//! and the factory pool unchanged.

use std::sync::Arc;

use lbwatch_model::WatcherPriority;
use tracing::{debug, warn};

use crate::{
    endpoint::{EndpointState, PollingEndpoint},
    error::ConfigurationError,
    filter::{PriorityFilterFactory, SharedFilter},
};

/// Destination root used when the endpoint has no move path configured.
pub const DEFAULT_MOVE_ROOT: &str = ".camel";

/// Finalize `endpoint`, driving it from `Unconfigured` to `Ready`.
pub fn finalize_endpoint<E>(
    endpoint: &mut E,
) -> Result<EndpointState, ConfigurationError>
where
    E: PollingEndpoint + ?Sized,
{
    match run_steps(endpoint) {
        Ok(()) => {
            debug!(
                endpoint = endpoint.endpoint_uri(),
                max_messages_per_poll = endpoint.max_messages_per_poll(),
                move_path = endpoint.move_path().unwrap_or_default(),
                "endpoint ready"
            );
            Ok(endpoint.state())
        }
        Err(err) => {
            warn!(
                endpoint = endpoint.endpoint_uri(),
                state = %endpoint.state(),
                error = %err,
                "endpoint configuration rejected"
            );
            if !endpoint.state().is_terminal() {
                endpoint.set_state(EndpointState::Failed);
            }
            Err(err)
        }
    }
}

fn run_steps<E>(endpoint: &mut E) -> Result<(), ConfigurationError>
where
    E: PollingEndpoint + ?Sized,
{
    let uri = endpoint.endpoint_uri().to_string();

    let state = endpoint.state();
    if state != EndpointState::Unconfigured {
        return Err(ConfigurationError::InvalidTransition {
            uri,
            from: state,
            to: EndpointState::FilterBound,
        });
    }

    let factory: PriorityFilterFactory = endpoint
        .filter_factory()
        .cloned()
        .ok_or_else(|| ConfigurationError::MissingFactory { uri: uri.clone() })?;

    if endpoint.filter().is_some() {
        return Err(ConfigurationError::FilterAlreadySet { uri });
    }

    let configured = endpoint.max_messages_per_poll();
    let mut pool_size = 0;
    let filter = factory.try_create_filter(|size| {
        pool_size = size;
        check_concurrency(&uri, configured, size)
    })?;

    debug!(
        endpoint = %uri,
        priority = %filter.assigned_priority(),
        "updating filter as not set"
    );
    endpoint.set_filter(Arc::new(filter) as SharedFilter);
    endpoint.advance(EndpointState::FilterBound)?;

    if configured <= 0 {
        let expected = i64::try_from(pool_size).unwrap_or(i64::MAX);
        debug!(
            endpoint = %uri,
            from = configured,
            to = expected,
            "updating maxMessagesPerPoll to the amount of watchers"
        );
        endpoint.set_max_messages_per_poll(expected);
    }
    endpoint.advance(EndpointState::ConcurrencyValidated)?;

    tag_destination(endpoint);
    endpoint.advance(EndpointState::DestinationTagged)?;

    endpoint.advance(EndpointState::Ready)
}

fn check_concurrency(
    uri: &str,
    configured: i64,
    pool_size: usize,
) -> Result<(), ConfigurationError> {
    if configured <= 0 || u64::try_from(configured).ok() == Some(pool_size as u64) {
        return Ok(());
    }

    Err(ConfigurationError::ConcurrencyMismatch {
        uri: uri.to_string(),
        configured,
        expected: pool_size,
    })
}

/// Rewrite the move path of an endpoint whose filter exposes a priority.
///
/// Returns the new move path, or `None` when the bound filter has no
/// priority and the endpoint was left alone.
pub fn tag_destination<E>(endpoint: &mut E) -> Option<String>
where
    E: PollingEndpoint + ?Sized,
{
    let priority = endpoint.filter().and_then(|filter| filter.priority())?;
    let tagged = tag_move_path(endpoint.move_path(), priority);

    debug!(
        endpoint = endpoint.endpoint_uri(),
        from = endpoint.move_path().unwrap_or_default(),
        to = %tagged,
        "updating move"
    );
    endpoint.set_move_path(tagged.clone());
    Some(tagged)
}

/// Append `priority` to the destination name derived from `current`.
///
/// - unset or empty: [`DEFAULT_MOVE_ROOT`]
/// - exactly three `/`-separated segments (`a/b/c`): the middle segment
/// - anything else: `current` as is
///
/// Trailing empty segments are ignored when counting, so `a/b/c/` still has
/// three segments.
// TODO: replace the three-segment rule with "last directory component" once
// deployments no longer depend on the existing destination names.
pub fn tag_move_path(current: Option<&str>, priority: WatcherPriority) -> String {
    let current = current.unwrap_or_default();
    if current.is_empty() {
        return format!("{DEFAULT_MOVE_ROOT}{priority}");
    }

    let mut segments: Vec<&str> = current.split('/').collect();
    while segments.len() > 1 && segments.last() == Some(&"") {
        segments.pop();
    }

    let base = match segments.as_slice() {
        [_, middle, _] => *middle,
        _ => current,
    };
    format!("{base}{priority}")
}

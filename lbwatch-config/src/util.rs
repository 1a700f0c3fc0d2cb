use std::time::Duration;

use anyhow::Context;

/// Parse a human readable duration such as `250ms`, `5s` or `1m 30s`.
pub fn parse_interval(raw: &str) -> anyhow::Result<Duration> {
    let interval = humantime::parse_duration(raw.trim())
        .with_context(|| format!("invalid poll interval '{raw}'"))?;
    anyhow::ensure!(!interval.is_zero(), "poll interval must be positive");
    Ok(interval)
}

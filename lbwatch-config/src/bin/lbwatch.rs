//! `lbwatch`: check and run the configured load-balanced watchers.

use std::{path::PathBuf, process::ExitCode};

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use lbwatch_config::{
    RouteBootstrap, RouteSummary, WatchConfig, bootstrap_routes, validate,
};
use lbwatch_core::{PollCycle, PriorityFilterFactory, WatcherRuntime};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "lbwatch", version, about = "Load-balanced file watchers")]
struct Cli {
    /// Watch config (TOML or JSON). Defaults to LBWATCH_CONFIG_PATH,
    /// LBWATCH_CONFIG_JSON, then ./lbwatch.toml.
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    #[arg(long, global = true, default_value = ".env")]
    env_file: PathBuf,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Finalize every route without polling and print the outcome
    Check {
        #[arg(long)]
        json: bool,
    },
    /// Start the watchers
    Run {
        /// Run a single poll cycle per watcher, print the reports and exit
        #[arg(long)]
        once: bool,
        #[arg(long)]
        json: bool,
    },
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();

    let env_file_loaded = dotenvy::from_path(&cli.env_file).is_ok();
    if env_file_loaded {
        info!(path = %cli.env_file.display(), "loaded .env file");
    }

    let (config, source) = WatchConfig::load(cli.config.as_deref())
        .context("failed to load watch configuration")?;
    info!(source = %source, routes = config.routes.len(), "watch config loaded");

    for warning in validate(&config).iter() {
        match &warning.hint {
            Some(hint) => {
                warn!(message = %warning.message, hint = %hint, "configuration warning")
            }
            None => warn!(message = %warning.message, "configuration warning"),
        }
    }

    let factory = PriorityFilterFactory::new();
    let bootstrap = bootstrap_routes(&config, &factory);

    match cli.command {
        Command::Check { json } => {
            print_summaries(&bootstrap.summaries(), json)?;
            Ok(exit_code(&bootstrap))
        }
        Command::Run { once, json } => {
            if bootstrap.ready.is_empty() {
                bail!("no route could be started");
            }
            let clean = exit_code(&bootstrap);
            if once {
                run_once(bootstrap, json).await?;
            } else {
                run_until_interrupted(bootstrap).await?;
            }
            Ok(clean)
        }
    }
}

fn exit_code(bootstrap: &RouteBootstrap) -> ExitCode {
    if bootstrap.is_clean() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}

fn print_summaries(summaries: &[RouteSummary], json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(summaries)?);
        return Ok(());
    }

    for summary in summaries {
        match &summary.error {
            None => println!(
                "{:<8} {}  priority={} maxMessagesPerPoll={} move={} interval={}ms",
                summary.state.as_str(),
                summary.name,
                summary
                    .priority
                    .map(|p| p.to_string())
                    .unwrap_or_else(|| "-".to_string()),
                summary.max_messages_per_poll.unwrap_or_default(),
                summary.move_path.as_deref().unwrap_or("-"),
                summary.poll_interval_ms.unwrap_or_default(),
            ),
            Some(error) => {
                println!("{:<8} {}  {}", summary.state.as_str(), summary.name, error)
            }
        }
    }
    Ok(())
}

async fn run_once(bootstrap: RouteBootstrap, json: bool) -> Result<()> {
    let mut reports = Vec::with_capacity(bootstrap.ready.len());
    for route in &bootstrap.ready {
        let report = route
            .endpoint
            .poll_once()
            .await
            .with_context(|| format!("poll cycle failed for route '{}'", route.name))?;
        reports.push(report);
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&reports)?);
    } else {
        for report in &reports {
            println!(
                "{}  priority={} listed={} admitted={} claimed={} deferred={} failed={}",
                report.endpoint_uri,
                report
                    .priority
                    .map(|p| p.to_string())
                    .unwrap_or_else(|| "-".to_string()),
                report.listed,
                report.admitted,
                report.claimed.len(),
                report.deferred(),
                report.failed,
            );
        }
    }
    Ok(())
}

async fn run_until_interrupted(bootstrap: RouteBootstrap) -> Result<()> {
    let mut runtime = WatcherRuntime::new();
    for route in bootstrap.ready {
        runtime
            .spawn_file_endpoint(route.endpoint)
            .with_context(|| format!("failed to start route '{}'", route.name))?;
    }
    info!(watchers = runtime.len(), "watchers started; press Ctrl-C to stop");

    let shutdown = runtime.shutdown_token();
    tokio::select! {
        signal = tokio::signal::ctrl_c() => {
            signal.context("failed to listen for Ctrl-C")?;
            info!("shutdown requested");
        }
        _ = shutdown.cancelled() => {}
    }

    runtime.shutdown().await;
    Ok(())
}

use anyhow::Result;
use hostwatch_alert::engine::AlertEngine;
use hostwatch_agent::config::AgentConfig;
use hostwatch_agent::console::{CommandRequest, Console};
use hostwatch_agent::monitor::Monitor;
use hostwatch_agent::usage_log::UsageLog;
use hostwatch_collector::snapshot::{HostSnapshot, DEFAULT_TOP_PROCESSES};
use hostwatch_collector::HostSensor;
use hostwatch_common::types::Recipient;
use hostwatch_notify::dispatcher::AlertDispatcher;
use hostwatch_notify::telegram::TelegramNotifier;
use hostwatch_sandbox::Sandbox;
use std::sync::Arc;
use tokio::signal;
use tracing_subscriber::EnvFilter;

const DEFAULT_CONFIG_PATH: &str = "config/hostwatch.toml";

const USAGE: &str = r#"Usage:
  hostwatch [config.toml]                                  Run the monitoring loop
  hostwatch status [config.toml]                           Print a host snapshot as JSON
  hostwatch exec <config.toml> <user-id> "<command line>"  Run one console command
"#;

#[allow(clippy::print_stderr)]
fn print_usage() {
    eprint!("{USAGE}");
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("hostwatch=info".parse()?))
        .init();

    let args: Vec<String> = std::env::args().collect();

    match args.get(1).map(|s| s.as_str()) {
        Some("status") => {
            run_status(args.get(2).map(String::as_str).unwrap_or(DEFAULT_CONFIG_PATH)).await
        }
        Some("exec") => {
            let config_path = args.get(2).ok_or_else(|| {
                print_usage();
                anyhow::anyhow!("exec requires <config.toml>, <user-id> and a command")
            })?;
            let user = args.get(3).ok_or_else(|| {
                print_usage();
                anyhow::anyhow!("exec requires <user-id> argument")
            })?;
            if args.len() < 5 {
                print_usage();
                anyhow::bail!("exec requires a command");
            }
            run_exec(config_path, user, &args[4..].join(" ")).await
        }
        Some("--help" | "-h") => {
            print_usage();
            Ok(())
        }
        _ => {
            let config_path = args
                .get(1)
                .map(|s| s.as_str())
                .unwrap_or(DEFAULT_CONFIG_PATH);
            run_daemon(config_path).await
        }
    }
}

async fn run_daemon(config_path: &str) -> Result<()> {
    let config = AgentConfig::load(config_path)?;
    let token = config.require_bot_token()?;

    let notifier = TelegramNotifier::new(&config.telegram_api_base, token)?;
    let mut dispatcher = AlertDispatcher::new(Arc::new(notifier), config.recipients.clone());
    if let Some(host) = hostwatch_collector::system::collect().host_name {
        dispatcher = dispatcher.with_host(host);
    }

    let sensor = HostSensor::new();
    tracing::info!(
        config = %config_path,
        gpus = sensor.gpu_count(),
        recipients = config.recipients.len(),
        "hostwatch starting"
    );
    if config.recipients.is_empty() {
        tracing::warn!("No recipients configured; alerts will not be delivered");
    }

    let mut monitor = Monitor::new(
        Box::new(sensor),
        AlertEngine::new(config.thresholds),
        dispatcher,
        config.poll_interval(),
    );

    monitor
        .run_until(async {
            match signal::ctrl_c().await {
                Ok(()) => tracing::info!("Shutting down gracefully"),
                Err(e) => tracing::error!(error = %e, "Failed to listen for shutdown signal"),
            }
        })
        .await;

    Ok(())
}

#[allow(clippy::print_stdout)]
async fn run_status(config_path: &str) -> Result<()> {
    // Only validates the file; the snapshot itself needs no settings.
    if std::path::Path::new(config_path).exists() {
        AgentConfig::load(config_path)?;
    }

    let snapshot =
        tokio::task::spawn_blocking(|| HostSnapshot::collect(DEFAULT_TOP_PROCESSES)).await?;
    println!("{}", serde_json::to_string_pretty(&snapshot)?);
    Ok(())
}

#[allow(clippy::print_stdout)]
async fn run_exec(config_path: &str, user: &str, command: &str) -> Result<()> {
    let config = AgentConfig::load(config_path)?;
    let console = Console::new(
        config.recipients.clone(),
        UsageLog::new(&config.usage_log_path),
        Sandbox::new(config.command_policy(), config.sandbox.limits()),
    );

    let result = console
        .handle(&CommandRequest::new(Recipient::new(user), command))
        .await;
    println!("{}", result.rendered);
    Ok(())
}

//! Tributary: an event-routing broker for workflow runs.

use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use tributary_loader::load_all_workflows;
use tributary_router::Router;
use tributary_server::{Server, shutdown_signal};

mod config;

use config::ServiceConfig;

/// Tributary - route business events into in-flight workflow runs
#[derive(Parser)]
#[command(name = "tributary")]
#[command(version, about, long_about = None)]
struct Cli {
  /// Configuration file path
  #[arg(short, long, env = "TRIBUTARY_CONFIG")]
  config: Option<String>,

  /// Listen address (overrides config)
  #[arg(short, long, env = "TRIBUTARY_LISTEN_ADDR")]
  listen_addr: Option<SocketAddr>,

  /// Directory of workflow essence files (default: ~/.tributary/workflows)
  #[arg(long, env = "TRIBUTARY_WORKFLOWS_DIR")]
  workflows_dir: Option<PathBuf>,

  /// Log level (overrides config)
  #[arg(long, env = "TRIBUTARY_LOG_LEVEL")]
  log_level: Option<String>,

  /// Enable JSON logging
  #[arg(long, env = "TRIBUTARY_LOG_JSON")]
  log_json: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
  let cli = Cli::parse();

  let mut config =
    ServiceConfig::load(cli.config.as_deref()).context("failed to load configuration")?;
  if let Some(listen_addr) = cli.listen_addr {
    config.server.listen_addr = listen_addr;
  }
  if let Some(workflows_dir) = cli.workflows_dir {
    config.workflows_dir = Some(workflows_dir);
  }
  if let Some(level) = cli.log_level {
    config.logging.level = level;
  }
  if cli.log_json {
    config.logging.json = true;
  }

  init_tracing(&config);

  let mut router = Router::new(config.router_config());
  if let Some(dir) = config.workflows_dir() {
    preload_workflows(&mut router, dir).await;
  }

  info!(
    listen_addr = %config.server.listen_addr,
    workflows = router.list_workflows().len(),
    "tributary_starting"
  );

  Server::new(config.server_config(), router)
    .run(shutdown_signal())
    .await
    .context("server failed")?;

  info!("tributary_stopped");
  Ok(())
}

fn init_tracing(config: &ServiceConfig) {
  let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
    .unwrap_or_else(|_| config.logging.level.clone().into());

  if config.logging.json {
    tracing_subscriber::registry()
      .with(env_filter)
      .with(tracing_subscriber::fmt::layer().json())
      .init();
  } else {
    tracing_subscriber::registry()
      .with(env_filter)
      .with(tracing_subscriber::fmt::layer())
      .init();
  }
}

/// Register every workflow found in `dir`. A missing directory is not fatal.
async fn preload_workflows(router: &mut Router, dir: PathBuf) {
  if !tokio::fs::try_exists(&dir).await.unwrap_or(false) {
    info!(dir = %dir.display(), "workflows_dir_absent");
    return;
  }

  let workflows = match load_all_workflows(&dir).await {
    Ok(workflows) => workflows,
    Err(error) => {
      warn!(dir = %dir.display(), error = %error, "workflows_dir_unreadable");
      return;
    }
  };

  for workflow in workflows {
    let workflow_id = workflow.id().to_string();
    if let Err(error) = router.register_workflow(workflow) {
      warn!(workflow_id = %workflow_id, error = %error, "workflow_preload_failed");
    }
  }
}

//! Service configuration.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tributary_router::{FetchMode, RouterConfig};
use tributary_run::RunLimits;
use tributary_server::ServerConfig;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ServiceConfig {
  #[serde(default)]
  pub server: ServerSection,

  #[serde(default)]
  pub router: RouterSection,

  /// Directory of workflow essence files loaded at startup.
  #[serde(default)]
  pub workflows_dir: Option<PathBuf>,

  #[serde(default)]
  pub logging: LoggingSection,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerSection {
  #[serde(default = "default_listen_addr")]
  pub listen_addr: SocketAddr,
}

impl Default for ServerSection {
  fn default() -> Self {
    Self {
      listen_addr: default_listen_addr(),
    }
  }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RouterSection {
  #[serde(default = "default_status_poll_interval")]
  pub status_poll_interval_secs: u64,

  #[serde(default)]
  pub fetch_mode: FetchMode,

  /// `0` keeps the queue unbounded.
  #[serde(default)]
  pub max_queue_len: usize,

  #[serde(default = "default_max_trash_len")]
  pub max_trash_len: usize,
}

impl Default for RouterSection {
  fn default() -> Self {
    Self {
      status_poll_interval_secs: default_status_poll_interval(),
      fetch_mode: FetchMode::default(),
      max_queue_len: 0,
      max_trash_len: default_max_trash_len(),
    }
  }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingSection {
  #[serde(default = "default_log_level")]
  pub level: String,

  #[serde(default)]
  pub json: bool,
}

impl Default for LoggingSection {
  fn default() -> Self {
    Self {
      level: default_log_level(),
      json: false,
    }
  }
}

fn default_listen_addr() -> SocketAddr {
  SocketAddr::from(([127, 0, 0, 1], 3000))
}

fn default_status_poll_interval() -> u64 {
  5
}

fn default_max_trash_len() -> usize {
  1000
}

fn default_log_level() -> String {
  "info".to_string()
}

impl ServiceConfig {
  /// Load defaults, then the optional file, then `TRIBUTARY_*` variables.
  ///
  /// Nested keys use a double underscore, e.g.
  /// `TRIBUTARY_ROUTER__MAX_QUEUE_LEN=100`.
  pub fn load(path: Option<&str>) -> Result<Self, config::ConfigError> {
    let mut builder = config::Config::builder();

    builder = builder.add_source(config::Config::try_from(&ServiceConfig::default())?);

    if let Some(path) = path {
      builder = builder.add_source(config::File::with_name(path).required(false));
    }

    builder = builder.add_source(
      config::Environment::with_prefix("TRIBUTARY")
        .prefix_separator("_")
        .separator("__")
        .try_parsing(true),
    );

    let config: Self = builder.build()?.try_deserialize()?;
    config.validate()?;
    Ok(config)
  }

  pub fn validate(&self) -> Result<(), config::ConfigError> {
    if self.router.status_poll_interval_secs == 0 {
      return Err(config::ConfigError::Message(
        "router.status_poll_interval_secs must be at least 1".to_string(),
      ));
    }
    Ok(())
  }

  /// The configured workflows directory, or `~/.tributary/workflows`.
  pub fn workflows_dir(&self) -> Option<PathBuf> {
    self
      .workflows_dir
      .clone()
      .or_else(|| dirs::home_dir().map(|home| home.join(".tributary").join("workflows")))
  }

  pub fn router_config(&self) -> RouterConfig {
    RouterConfig {
      fetch_mode: self.router.fetch_mode,
      limits: RunLimits {
        max_queue_len: self.router.max_queue_len,
        max_trash_len: self.router.max_trash_len,
      },
    }
  }

  pub fn server_config(&self) -> ServerConfig {
    ServerConfig {
      listen_addr: self.server.listen_addr,
      status_poll_interval: Duration::from_secs(self.router.status_poll_interval_secs),
    }
  }
}

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::engine::history::HistorySelector;
use crate::error::{ExportError, Result};

pub const CONFIG_FILE_NAME: &str = ".nessus-export.toml";

pub const DEFAULT_HOST: &str = "https://localhost:8834";
pub const DEFAULT_IDENTIFIER: &str = "SAS_KSB";
pub const DEFAULT_HISTORY: &str = "1";
pub const DEFAULT_TIMEOUT_SECS: u64 = 60;
pub const DEFAULT_POLL_INTERVAL_SECS: u64 = 2;
pub const DEFAULT_WAIT_SECS: u64 = 600;

/// Contents of `.nessus-export.toml`. API keys are deliberately not read from it.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FileConfig {
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub export: ExportConfig,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ServerConfig {
    /// Base URL of the Nessus instance
    pub host: Option<String>,

    /// Skip TLS certificate verification
    pub insecure: Option<bool>,

    /// Per-request timeout in seconds
    pub timeout_secs: Option<u64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ExportConfig {
    /// Scan name prefix
    pub identifier: Option<String>,

    /// History index, counted back from the newest run
    pub history: Option<String>,

    /// Output directory
    pub path: Option<PathBuf>,

    /// Seconds between export status checks
    pub poll_interval_secs: Option<u64>,

    /// Seconds to wait for the service to prepare one export
    pub wait_secs: Option<u64>,
}

impl FileConfig {
    /// Parse a config file. A missing or malformed file is an error.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| ExportError::Config(format!("could not read {}: {}", path.display(), e)))?;
        let config = toml::from_str::<FileConfig>(&content)
            .map_err(|e| ExportError::Config(format!("failed to parse {}: {}", path.display(), e)))?;
        info!("Loaded config from {}", path.display());
        Ok(config)
    }

    /// Look for `.nessus-export.toml` in `start` or its parents
    pub fn discover(start: &Path) -> Result<Option<Self>> {
        match find_config_file(start) {
            Some(path) => {
                debug!("Found config: {}", path.display());
                Self::load(&path).map(Some)
            }
            None => Ok(None),
        }
    }
}

/// Walk up from `start` to find the config file
fn find_config_file(start: &Path) -> Option<PathBuf> {
    let mut current = start.to_path_buf();
    loop {
        let config = current.join(CONFIG_FILE_NAME);
        if config.is_file() {
            return Some(config);
        }
        if !current.pop() {
            return None;
        }
    }
}

/// Values supplied on the command line or through the environment.
/// `None` means "not given", so the config file or the default applies.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub host: Option<String>,
    pub access_key: Option<String>,
    pub secret_key: Option<String>,
    pub identifier: Option<String>,
    pub history: Option<String>,
    pub path: Option<PathBuf>,
    pub insecure: Option<bool>,
    pub timeout_secs: Option<u64>,
}

/// Fully resolved settings for one export run
#[derive(Clone)]
pub struct Settings {
    pub host: String,
    pub access_key: String,
    pub secret_key: String,
    pub identifier: String,
    pub history: HistorySelector,
    pub output_dir: PathBuf,
    pub insecure: bool,
    pub timeout: Duration,
    pub poll_interval: Duration,
    pub export_wait: Duration,
}

impl std::fmt::Debug for Settings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Settings")
            .field("host", &self.host)
            .field("identifier", &self.identifier)
            .field("history", &self.history)
            .field("output_dir", &self.output_dir)
            .field("insecure", &self.insecure)
            .field("timeout", &self.timeout)
            .field("poll_interval", &self.poll_interval)
            .field("export_wait", &self.export_wait)
            .finish_non_exhaustive()
    }
}

impl Settings {
    /// Merge overrides over the config file over built-in defaults.
    pub fn resolve(overrides: Overrides, file: Option<FileConfig>) -> Result<Self> {
        let file = file.unwrap_or_default();

        let access_key = non_empty(overrides.access_key).ok_or_else(|| {
            ExportError::Config("no access key given (use --access-key or ACCESS_KEY)".to_string())
        })?;
        let secret_key = non_empty(overrides.secret_key).ok_or_else(|| {
            ExportError::Config("no secret key given (use --secret-key or SECRET_KEY)".to_string())
        })?;

        let history = overrides
            .history
            .or(file.export.history)
            .unwrap_or_else(|| DEFAULT_HISTORY.to_string())
            .parse::<HistorySelector>()?;

        let poll_interval_secs = file
            .export
            .poll_interval_secs
            .unwrap_or(DEFAULT_POLL_INTERVAL_SECS);
        if poll_interval_secs == 0 {
            return Err(ExportError::Config(
                "export.poll_interval_secs must be at least 1".to_string(),
            ));
        }

        Ok(Settings {
            host: overrides
                .host
                .or(file.server.host)
                .unwrap_or_else(|| DEFAULT_HOST.to_string()),
            access_key,
            secret_key,
            identifier: overrides
                .identifier
                .or(file.export.identifier)
                .unwrap_or_else(|| DEFAULT_IDENTIFIER.to_string()),
            history,
            output_dir: overrides
                .path
                .or(file.export.path)
                .unwrap_or_else(|| PathBuf::from(".")),
            insecure: overrides.insecure.or(file.server.insecure).unwrap_or(false),
            timeout: Duration::from_secs(
                overrides
                    .timeout_secs
                    .or(file.server.timeout_secs)
                    .unwrap_or(DEFAULT_TIMEOUT_SECS),
            ),
            poll_interval: Duration::from_secs(poll_interval_secs),
            export_wait: Duration::from_secs(file.export.wait_secs.unwrap_or(DEFAULT_WAIT_SECS)),
        })
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

/// Create a default `.nessus-export.toml` in the current directory
pub fn init_config() -> anyhow::Result<()> {
    let config_path = std::env::current_dir()?.join(CONFIG_FILE_NAME);

    if config_path.exists() {
        println!("⚠️  {} already exists in this directory", CONFIG_FILE_NAME);
        return Ok(());
    }

    let default_config = r#"# nessus-export configuration
# Command-line flags override these values.
# API keys are never read from this file: use ACCESS_KEY / SECRET_KEY.

[server]
# Base URL of the Nessus instance
# host = "https://localhost:8834"

# Accept self-signed certificates
# insecure = false

# Per-request timeout in seconds
# timeout_secs = 60

[export]
# Only completed scans whose name starts with this prefix are exported
# identifier = "SAS_KSB"

# Which run to export, counted back from the newest ("1" = newest)
# history = "1"

# Directory for the .nessus files (must already exist)
# path = "."

# Seconds between export status checks, and how long to wait per export
# poll_interval_secs = 2
# wait_secs = 600
"#;

    std::fs::write(&config_path, default_config)?;
    println!("✅ Created {}", CONFIG_FILE_NAME);
    println!("   Edit it to customize your export settings.");

    Ok(())
}

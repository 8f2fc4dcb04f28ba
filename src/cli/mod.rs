use std::path::PathBuf;

use clap::{Parser, ValueEnum};

use nessus_export::config::Overrides;

/// nessus-export: download completed Nessus scans as .nessus files
///
/// Selects completed scans whose name starts with an identifier and writes
/// one `<scan name>-<YYYYMM>.nessus` file per scan into the output directory.
#[derive(Parser, Debug)]
#[command(
    name = "nessus-export",
    version,
    about = "Export completed Nessus scans to .nessus files",
    long_about = "Export completed Nessus scans to .nessus files.\n\nEvery completed scan whose name starts with --identifier is exported\n(the run picked by --history) into --path as <scan name>-<YYYYMM>.nessus.\nSettings may also come from a .nessus-export.toml file; flags win."
)]
pub struct Cli {
    /// The Nessus instance [default: https://localhost:8834]
    #[arg(long)]
    pub host: Option<String>,

    /// Nessus API access key
    #[arg(long, env = "ACCESS_KEY", hide_env_values = true)]
    pub access_key: Option<String>,

    /// Nessus API secret key
    #[arg(long, env = "SECRET_KEY", hide_env_values = true)]
    pub secret_key: Option<String>,

    /// String to select the scan(s) to export [default: SAS_KSB]
    #[arg(short, long)]
    pub identifier: Option<String>,

    /// Export specific scan from history, counted back from the newest run [default: 1]
    #[arg(long, allow_hyphen_values = true)]
    pub history: Option<String>,

    /// Directory to store the exported files [default: .]
    #[arg(short, long)]
    pub path: Option<PathBuf>,

    /// Accept invalid or self-signed TLS certificates
    #[arg(long, overrides_with = "no_insecure")]
    pub insecure: bool,

    /// Verify TLS certificates even if the config file sets `insecure = true`
    #[arg(long, overrides_with = "insecure")]
    pub no_insecure: bool,

    /// Per-request timeout in seconds [default: 60]
    #[arg(long)]
    pub timeout: Option<u64>,

    /// How to print the run summary
    #[arg(long, value_enum, default_value = "terminal")]
    pub format: OutputFormat,

    /// Read settings from this file instead of searching for .nessus-export.toml
    #[arg(long, conflicts_with = "no_config")]
    pub config: Option<PathBuf>,

    /// Ignore .nessus-export.toml files
    #[arg(long)]
    pub no_config: bool,

    /// Write a default .nessus-export.toml in the current directory and exit
    #[arg(long)]
    pub init_config: bool,

    /// Enable verbose output (debug level)
    #[arg(short, long, conflicts_with = "quiet")]
    pub verbose: bool,

    /// Suppress all output except errors
    #[arg(short, long)]
    pub quiet: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable summary with colors
    Terminal,
    /// JSON summary for scripting
    Json,
}

impl Cli {
    pub fn overrides(&self) -> Overrides {
        Overrides {
            host: self.host.clone(),
            access_key: self.access_key.clone(),
            secret_key: self.secret_key.clone(),
            identifier: self.identifier.clone(),
            history: self.history.clone(),
            path: self.path.clone(),
            insecure: match (self.insecure, self.no_insecure) {
                (true, _) => Some(true),
                (_, true) => Some(false),
                _ => None,
            },
            timeout_secs: self.timeout,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_definition_is_valid() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn short_flags_and_negative_history() {
        let cli = Cli::try_parse_from([
            "nessus-export",
            "--host",
            "https://localhost:8811",
            "--access-key",
            "key",
            "--secret-key",
            "key",
            "-i",
            "SAS_KSB_",
            "--history",
            "-2",
            "-p",
            "reports",
        ])
        .unwrap();

        let overrides = cli.overrides();
        assert_eq!(overrides.host.as_deref(), Some("https://localhost:8811"));
        assert_eq!(overrides.identifier.as_deref(), Some("SAS_KSB_"));
        assert_eq!(overrides.history.as_deref(), Some("-2"));
        assert_eq!(overrides.path, Some(PathBuf::from("reports")));
        assert_eq!(cli.format, OutputFormat::Terminal);
    }

    #[test]
    fn unset_flags_stay_unset() {
        let cli = Cli::try_parse_from(["nessus-export", "--format", "json"]).unwrap();
        assert!(cli.host.is_none());
        assert!(cli.identifier.is_none());
        assert!(cli.history.is_none());
        assert_eq!(cli.format, OutputFormat::Json);
    }

    #[test]
    fn insecure_flags_last_one_wins() {
        let parse = |args: &[&str]| {
            let mut argv = vec!["nessus-export"];
            argv.extend_from_slice(args);
            Cli::try_parse_from(argv).unwrap().overrides().insecure
        };

        assert_eq!(parse(&[]), None);
        assert_eq!(parse(&["--insecure"]), Some(true));
        assert_eq!(parse(&["--no-insecure"]), Some(false));
        assert_eq!(parse(&["--insecure", "--no-insecure"]), Some(false));
        assert_eq!(parse(&["--no-insecure", "--insecure"]), Some(true));
    }

    #[test]
    fn config_conflicts_with_no_config() {
        let result = Cli::try_parse_from([
            "nessus-export",
            "--config",
            "x.toml",
            "--no-config",
        ]);
        assert!(result.is_err());
    }
}

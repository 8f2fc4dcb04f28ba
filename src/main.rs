mod cli;

use anyhow::Result;
use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use cli::{Cli, OutputFormat};
use nessus_export::client::nessus::{ClientOptions, NessusClient};
use nessus_export::config::{self, FileConfig, Settings};
use nessus_export::engine::Exporter;
use nessus_export::report;

fn main() -> Result<()> {
    // Parse CLI arguments
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new("nessus_export=debug")
    } else if cli.quiet {
        EnvFilter::new("nessus_export=error")
    } else {
        EnvFilter::new("nessus_export=info")
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time()
        .init();

    if cli.init_config {
        return config::init_config();
    }

    info!("nessus-export v{}", env!("CARGO_PKG_VERSION"));

    let file_config = if cli.no_config {
        None
    } else if let Some(ref path) = cli.config {
        Some(FileConfig::load(path)?)
    } else {
        FileConfig::discover(&std::env::current_dir()?)?
    };

    let settings = Settings::resolve(cli.overrides(), file_config)?;
    if settings.insecure {
        warn!("TLS certificate verification is disabled for {}", settings.host);
    }

    let client = NessusClient::new(ClientOptions {
        base_url: settings.host.clone(),
        access_key: settings.access_key.clone(),
        secret_key: settings.secret_key.clone(),
        insecure: settings.insecure,
        timeout: settings.timeout,
        poll_interval: settings.poll_interval,
        export_wait: settings.export_wait,
    })?;

    let show_progress = cli.format == OutputFormat::Terminal && !cli.quiet;
    let export_report = Exporter::new(&settings)
        .with_progress(show_progress)
        .run(&client)?;

    match cli.format {
        OutputFormat::Json => println!("{}", report::json::render(&export_report)?),
        OutputFormat::Terminal => {
            if !cli.quiet {
                report::terminal::render(&export_report);
            }
        }
    }

    Ok(())
}

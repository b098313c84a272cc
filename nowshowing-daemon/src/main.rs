mod runtime;

use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use nowshowing_config::{ConfigLoad, ConfigLoader, ConfigLoaderOptions};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// CLI entry point
#[derive(Parser, Debug)]
#[command(name = "nowshowing")]
#[command(about = "Show the poster of whatever you are watching on Trakt")]
struct Cli {
    /// Credential store written by `nowshowing-init` (default: config.json)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Display and polling settings (TOML or JSON)
    #[arg(long)]
    settings: Option<PathBuf>,

    /// Alternative .env file
    #[arg(long)]
    env_file: Option<PathBuf>,

    /// Run a single poll/resolve/display cycle and exit
    #[arg(long, default_value_t = false)]
    once: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let ConfigLoad { config, warnings } =
        ConfigLoader::with_options(ConfigLoaderOptions {
            credentials_path: cli.config,
            settings_path: cli.settings,
            env_file: cli.env_file,
        })
        .load()
        .context("failed to load configuration")?;

    if config.metadata.env_file_loaded {
        info!("loaded .env file");
    }
    if let Some(path) = &config.metadata.settings_path {
        info!(path = %path.display(), "settings loaded from file");
    }
    for warning in warnings.iter() {
        match &warning.hint {
            Some(hint) => {
                warn!(message = %warning.message, hint = %hint, "configuration warning")
            }
            None => warn!(message = %warning.message, "configuration warning"),
        }
    }

    let driver = runtime::build_driver(&config)?;
    info!(
        user = %config.credentials.trakt_username,
        interval = ?config.poll.interval,
        fill_mode = %config.display.geometry.fill_mode,
        "nowshowing started"
    );

    if cli.once {
        let outcome = driver.run_cycle().await;
        info!(?outcome, "single cycle finished");
        return Ok(());
    }

    tokio::select! {
        _ = driver.run() => {}
        signal = tokio::signal::ctrl_c() => {
            signal.context("failed to listen for Ctrl-C")?;
            info!("shutdown requested");
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_parse() {
        let cli = Cli::try_parse_from([
            "nowshowing",
            "--config",
            "/etc/nowshowing/config.json",
            "--once",
        ])
        .unwrap();
        assert_eq!(
            cli.config.as_deref(),
            Some(std::path::Path::new("/etc/nowshowing/config.json"))
        );
        assert!(cli.once);
        assert!(cli.settings.is_none());
    }

    #[test]
    fn defaults_to_looping() {
        let cli = Cli::try_parse_from(["nowshowing"]).unwrap();
        assert!(!cli.once);
        assert!(cli.config.is_none());
    }
}

use std::{net::SocketAddr, path::PathBuf};

use anyhow::Context;
use clap::{Parser, Subcommand};
use relay_core::{Config, WeatherQuery, WeatherRelay};

use crate::server;

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "weather-relay", version, about = "HTTP relay for current weather in Brazil")]
pub struct Cli {
    /// Config file to use instead of the platform default.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Log at debug level unless RUST_LOG says otherwise.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Defaults to `serve`.
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Run the HTTP server.
    Serve {
        /// Listen address, e.g. "127.0.0.1:5000". Overrides the config file.
        #[arg(long)]
        bind: Option<SocketAddr>,
    },

    /// Look up the current weather once and print it as JSON.
    Show {
        #[arg(long)]
        city: Option<String>,

        #[arg(long)]
        state: Option<String>,
    },

    /// Print the path of the config file in use.
    ConfigPath,

    /// Write the default configuration file if none exists yet.
    InitConfig,
}

impl Cli {
    pub async fn run(self) -> anyhow::Result<()> {
        let config_path = match &self.config {
            Some(path) => path.clone(),
            None => Config::config_file_path()?,
        };

        match self.command.unwrap_or(Command::Serve { bind: None }) {
            Command::Serve { bind } => {
                let config = Config::load_from(&config_path)?;
                let bind = bind.unwrap_or(config.bind);
                let relay = WeatherRelay::from_config(&config)?;
                server::serve(relay, bind).await?;
            }
            Command::Show { city, state } => {
                let config = Config::load_from(&config_path)?;
                let relay = WeatherRelay::from_config(&config)?;
                let weather = relay
                    .current_weather(&WeatherQuery::new(city, state))
                    .await
                    .context("Weather lookup failed")?;
                println!("{}", serde_json::to_string_pretty(&weather)?);
            }
            Command::ConfigPath => {
                println!("{}", config_path.display());
            }
            Command::InitConfig => {
                if config_path.exists() {
                    println!("Config already exists at {}", config_path.display());
                } else {
                    Config::default().save_to(&config_path)?;
                    println!("Wrote default config to {}", config_path.display());
                }
            }
        }

        Ok(())
    }
}

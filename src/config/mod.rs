use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use dotenvy::dotenv;
use serde::Deserialize;

const ENV_PREFIX: &str = "CLIENT_CONSOLE_";

/// Configuration for the application
#[derive(Debug, Deserialize, PartialEq)]
pub struct Config {
    /// Base URL of the remote client service
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,
    /// Clients fetched per page
    #[serde(default = "default_page_size")]
    pub page_size: u32,
    /// Directory holding persisted session, selection and log files
    #[serde(default = "default_state_dir")]
    pub state_dir: PathBuf,
    /// Run without a backend, keeping clients on disk
    #[serde(default)]
    pub local_mode: bool,
    /// Keep session and selection in memory only; nothing is restored or saved
    #[serde(default)]
    pub ephemeral: bool,
}

fn default_api_base_url() -> String {
    "https://boasorte.teddybackoffice.com.br".to_string()
}

fn default_page_size() -> u32 {
    16
}

fn default_state_dir() -> PathBuf {
    PathBuf::from(".client-console")
}

/// Command-line overrides; anything given here wins over the environment.
#[derive(Debug, Default, Parser)]
#[command(name = "client-console", about = "Terminal console for managing clients")]
pub struct Cli {
    /// Base URL of the client service
    #[arg(long)]
    pub api_url: Option<String>,
    /// Clients per page
    #[arg(long)]
    pub page_size: Option<u32>,
    /// Where persisted state and logs are kept
    #[arg(long)]
    pub state_dir: Option<PathBuf>,
    /// Work offline with locally stored clients
    #[arg(long)]
    pub local: bool,
    /// Do not read or write any state files
    #[arg(long)]
    pub ephemeral: bool,
}

impl Config {
    /// Load configuration from environment variables
    ///
    /// This function will:
    /// 1. Load variables from .env file if it exists
    /// 2. Deserialize `CLIENT_CONSOLE_*` variables into Config struct
    pub fn load() -> Result<Self> {
        dotenv().ok();

        let config = envy::prefixed(ENV_PREFIX).from_env::<Config>()?;

        Ok(config)
    }

    pub fn apply(mut self, cli: Cli) -> Self {
        if let Some(url) = cli.api_url {
            self.api_base_url = url;
        }
        if let Some(size) = cli.page_size {
            self.page_size = size;
        }
        if let Some(dir) = cli.state_dir {
            self.state_dir = dir;
        }
        self.local_mode |= cli.local;
        self.ephemeral |= cli.ephemeral;
        self
    }

    pub fn log_file(&self) -> PathBuf {
        self.state_dir.join("client-console.log")
    }
}

/// Initialize environment variables and load configuration
pub fn init() -> Result<Config> {
    let cli = Cli::parse();

    let config = Config::load()?.apply(cli);

    Ok(config)
}

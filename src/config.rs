use std::{io::ErrorKind, net::SocketAddr};

use clap::{Parser, Subcommand};
use serde::Deserialize;

use crate::{
    codec::{RowCodec, DEFAULT_DATETIME_FORMAT, DEFAULT_DATE_FORMAT},
    error::ConfigError,
};

#[derive(Parser, Debug)]
#[command(name = "sheetbase", about = "Sheetbase - tabular data access over spreadsheet grids")]
pub struct CliArgs {
    /// Path to config file
    #[arg(short, long, default_value = "sheetbase.toml")]
    pub config: String,

    /// Port to listen on (overrides config file)
    #[arg(short, long)]
    pub port: Option<u16>,

    /// Log level (overrides config file)
    #[arg(short, long)]
    pub log_level: Option<String>,

    /// Spreadsheet id (overrides config file)
    #[arg(long)]
    pub spreadsheet_id: Option<String>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum Command {
    /// Serve the HTTP API (default)
    Serve,
    /// Create every declared sheet with its header row
    Setup {
        /// Seed the sheets with demo rows
        #[arg(long)]
        sample_data: bool,
        /// Clear existing data rows before seeding
        #[arg(long)]
        reset: bool,
    },
    /// Check that every sheet exists with the expected headers
    Verify,
}

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    #[serde(default = "default_server")]
    pub server: ServerConfig,

    #[serde(default = "default_logging")]
    pub logging: LoggingConfig,

    #[serde(default = "default_storage")]
    pub storage: StorageConfig,

    #[serde(default = "default_formats")]
    pub formats: FormatConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,
}

#[derive(Debug, Deserialize, Clone)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,

    #[serde(default)]
    pub json: bool,
}

#[derive(Debug, Deserialize, Clone)]
pub struct StorageConfig {
    /// `memory` or `sqlite`.
    #[serde(default = "default_backend")]
    pub backend: String,

    /// Database file for the sqlite backend; `:memory:` is accepted.
    #[serde(default = "default_path")]
    pub path: String,

    /// Must not be empty or the `YOUR_SPREADSHEET_ID_HERE` placeholder.
    #[serde(default = "default_spreadsheet_id")]
    pub spreadsheet_id: String,
}

/// `time` format descriptions used when dates are written to cells.
#[derive(Debug, Deserialize, Clone)]
pub struct FormatConfig {
    #[serde(default = "default_date_format")]
    pub date: String,

    #[serde(default = "default_datetime_format")]
    pub datetime: String,
}

fn default_server() -> ServerConfig {
    ServerConfig {
        host: default_host(),
        port: default_port(),
    }
}

fn default_logging() -> LoggingConfig {
    LoggingConfig {
        level: default_log_level(),
        json: false,
    }
}

fn default_storage() -> StorageConfig {
    StorageConfig {
        backend: default_backend(),
        path: default_path(),
        spreadsheet_id: default_spreadsheet_id(),
    }
}

fn default_formats() -> FormatConfig {
    FormatConfig {
        date: default_date_format(),
        datetime: default_datetime_format(),
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    3000
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_backend() -> String {
    "memory".to_string()
}

fn default_path() -> String {
    "sheetbase.db".to_string()
}

fn default_spreadsheet_id() -> String {
    "sheetbase-local".to_string()
}

fn default_date_format() -> String {
    DEFAULT_DATE_FORMAT.to_string()
}

fn default_datetime_format() -> String {
    DEFAULT_DATETIME_FORMAT.to_string()
}

impl Default for Config {
    fn default() -> Self {
        Config {
            server: default_server(),
            logging: default_logging(),
            storage: default_storage(),
            formats: default_formats(),
        }
    }
}

impl Config {
    /// Reads the config file, falling back to defaults only when it does not
    /// exist. An unreadable or malformed file is an error.
    pub fn load(cli: &CliArgs) -> Result<Self, ConfigError> {
        let mut config = match std::fs::read_to_string(&cli.config) {
            Ok(contents) => Self::parse(&cli.config, &contents)?,
            Err(e) if e.kind() == ErrorKind::NotFound => Config::default(),
            Err(source) => {
                return Err(ConfigError::Read {
                    path: cli.config.clone(),
                    source,
                })
            }
        };

        // CLI overrides
        if let Some(port) = cli.port {
            config.server.port = port;
        }
        if let Some(ref level) = cli.log_level {
            config.logging.level = level.clone();
        }
        if let Some(ref id) = cli.spreadsheet_id {
            config.storage.spreadsheet_id = id.clone();
        }

        Ok(config)
    }

    pub fn parse(path: &str, contents: &str) -> Result<Self, ConfigError> {
        toml::from_str(contents).map_err(|source| ConfigError::Parse {
            path: path.to_string(),
            source,
        })
    }

    pub fn listen_addr(&self) -> Result<SocketAddr, ConfigError> {
        let addr = format!("{}:{}", self.server.host, self.server.port);
        addr.parse().map_err(|_| ConfigError::ListenAddr(addr))
    }

    pub fn codec(&self) -> Result<RowCodec, ConfigError> {
        Ok(RowCodec::new(&self.formats.date, &self.formats.datetime)?)
    }
}

//! Service configuration.
//!
//! Parsed once at startup (flags, falling back to `PRINTMAPS_*` environment
//! variables) and passed by value into everything that needs it.

use std::net::SocketAddr;
use std::path::PathBuf;

use clap::{Parser, ValueEnum};

use printmaps_core::ValidationRules;
use printmaps_observability::LogFormat;

/// Where job records live.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum StoreBackend {
    /// One directory per job under `--data-dir`.
    File,
    /// Process memory; everything is lost on restart.
    Memory,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogFormatArg {
    Json,
    Pretty,
}

impl From<LogFormatArg> for LogFormat {
    fn from(value: LogFormatArg) -> Self {
        match value {
            LogFormatArg::Json => LogFormat::Json,
            LogFormatArg::Pretty => LogFormat::Pretty,
        }
    }
}

#[derive(Debug, Clone, Parser)]
#[command(name = "printmaps-api", version, about = "Map build job service")]
pub struct Config {
    /// Address to listen on.
    #[arg(long, env = "PRINTMAPS_LISTEN", default_value = "0.0.0.0:8080")]
    pub listen: SocketAddr,

    /// Root directory of the file record store.
    #[arg(long, env = "PRINTMAPS_DATA_DIR", default_value = "data/maps")]
    pub data_dir: PathBuf,

    /// Directory build orders are spooled to for the map builder.
    #[arg(long, env = "PRINTMAPS_ORDERS_DIR", default_value = "data/orders")]
    pub orders_dir: PathBuf,

    #[arg(long, env = "PRINTMAPS_STORE", value_enum, default_value_t = StoreBackend::File)]
    pub store: StoreBackend,

    #[arg(long, env = "PRINTMAPS_LOG_FORMAT", value_enum, default_value_t = LogFormatArg::Json)]
    pub log_format: LogFormatArg,

    /// Allowed map styles (comma separated). Empty means the built-in list.
    #[arg(long, env = "PRINTMAPS_STYLES", value_delimiter = ',')]
    pub styles: Vec<String>,

    #[arg(long, env = "PRINTMAPS_MIN_SCALE")]
    pub min_scale: Option<u32>,

    #[arg(long, env = "PRINTMAPS_MAX_SCALE")]
    pub max_scale: Option<u32>,

    /// Largest printable edge in millimeters.
    #[arg(long, env = "PRINTMAPS_MAX_PRINT_MM")]
    pub max_print_mm: Option<f64>,
}

impl Config {
    /// Attribute limits, built-in defaults overridden by whatever was set.
    pub fn validation_rules(&self) -> ValidationRules {
        let mut rules = ValidationRules::default();
        if !self.styles.is_empty() {
            rules.styles = self.styles.clone();
        }
        if let Some(v) = self.min_scale {
            rules.min_scale = v;
        }
        if let Some(v) = self.max_scale {
            rules.max_scale = v;
        }
        if let Some(v) = self.max_print_mm {
            rules.max_print_mm = v;
        }
        rules
    }
}

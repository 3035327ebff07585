//! CLI arguments and subcommands for procinfo-exporter.
//!
//! This module defines the command-line interface structure using the clap library,
//! including all flags, options, and subcommands.

use clap::{Parser, Subcommand, ValueEnum};
use std::net::IpAddr;
use std::path::PathBuf;

/// Log level options for CLI parsing
#[derive(Debug, Clone, ValueEnum)]
pub enum LogLevel {
    Off,
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Configuration format options for output
#[derive(Debug, Clone, ValueEnum)]
pub enum ConfigFormat {
    Yaml,
    Json,
    Toml,
}

/// Main CLI arguments structure
#[derive(Parser, Debug)]
#[command(
    name = "procinfo-exporter",
    about = "JSON snapshots of Linux process state with container filtering",
    long_about = "JSON snapshots of Linux process state with container filtering.\n\n\
                  Serves two read-triggered JSON reports over HTTP: a system report with \
                  host RAM totals and every process, and a container report restricted to \
                  processes living in a namespace other than init's. Each read computes a \
                  fresh snapshot from /proc.",
    version,
    propagate_version = true
)]
pub struct Args {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// HTTP listen port
    #[arg(short = 'p', long)]
    pub port: Option<u16>,

    /// Bind to specific interface/IP
    #[arg(long)]
    pub bind: Option<IpAddr>,

    /// Log level
    #[arg(long, value_enum, default_value = "info")]
    pub log_level: LogLevel,

    /// Config file (YAML/JSON/TOML)
    #[arg(short = 'c', long)]
    pub config: Option<PathBuf>,

    /// Disable all config file loading
    #[arg(long)]
    pub no_config: bool,

    /// Print effective merged config and exit
    #[arg(long)]
    pub show_config: bool,

    /// Output format for --show-config
    #[arg(long, value_enum, default_value = "yaml")]
    pub config_format: ConfigFormat,

    /// Validate config and exit (return code 1 on error)
    #[arg(long)]
    pub check_config: bool,

    /// procfs mount point to read processes from. Namespaces are compared
    /// against pid 1, or against the first pid listed if there is no pid 1
    #[arg(long)]
    pub proc_root: Option<PathBuf>,

    /// Path to JSON test data file (uses synthetic data instead of /proc)
    #[arg(short = 't', long)]
    pub test_data_file: Option<PathBuf>,

    /// Namespace kinds compared for container classification (comma-separated)
    #[arg(long)]
    pub namespace_kinds: Option<String>,

    /// Endpoint name of the system report
    #[arg(long)]
    pub system_endpoint: Option<String>,

    /// Endpoint name of the container report
    #[arg(long)]
    pub container_endpoint: Option<String>,

    /// Disable /health endpoint
    #[arg(long)]
    pub disable_health: bool,

    /// Disable /metrics self-telemetry endpoint
    #[arg(long)]
    pub disable_telemetry: bool,

    /// Enable TLS/SSL for HTTPS
    #[arg(long)]
    pub enable_tls: bool,

    /// Path to TLS certificate file (PEM format)
    #[arg(long)]
    pub tls_cert: Option<PathBuf>,

    /// Path to TLS private key file (PEM format)
    #[arg(long)]
    pub tls_key: Option<PathBuf>,
}

/// Subcommands for additional functionality
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Print a single report to stdout and exit
    Report {
        /// Print the container report instead of the system report
        #[arg(long)]
        container: bool,
    },

    /// Validate configuration and /proc accessibility
    Check,

    /// Generate configuration files
    Config {
        /// Output file path ("-" for stdout)
        #[arg(short = 'o', long)]
        output: Option<PathBuf>,

        /// Output format
        #[arg(long, value_enum, default_value = "yaml")]
        format: ConfigFormat,

        /// Include comments and examples
        #[arg(long)]
        commented: bool,
    },

    /// Generate synthetic test data JSON file
    GenerateTestdata {
        /// Output file path
        #[arg(short = 'o', long, default_value = "testdata.json")]
        output: PathBuf,

        /// Number of host processes to generate (besides init and kthreadd)
        #[arg(long, default_value_t = 20)]
        processes: usize,

        /// Number of containerized processes to generate
        #[arg(long, default_value_t = 5)]
        containerized: usize,
    },
}

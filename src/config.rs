//! Configuration management for procinfo-exporter.
//!
//! This module handles loading, merging, and validating configuration from files
//! and CLI arguments. It supports YAML, JSON, and TOML formats.

use crate::cli::{Args, ConfigFormat};
use procinfo_exporter::process::NamespaceKind;
use procinfo_exporter::registry::validate_endpoint_name;
use procinfo_exporter::source::procfs::DEFAULT_PROC_ROOT;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

// Default configuration constants
pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 9216;
pub const DEFAULT_SYSTEM_ENDPOINT: &str = "sysinfo";
pub const DEFAULT_CONTAINER_ENDPOINT: &str = "continfo";

/// Paths that must not be used as report endpoint names.
const RESERVED_ENDPOINTS: [&str; 2] = ["health", "metrics"];

/// Exporter configuration; every field is optional so files can be partial.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    // Server configuration
    pub port: Option<u16>,
    pub bind: Option<String>,

    // Process table source
    #[serde(alias = "proc-root")]
    pub proc_root: Option<PathBuf>,
    /// Path to JSON test data file (uses synthetic data instead of /proc)
    #[serde(alias = "test-data-file")]
    pub test_data_file: Option<PathBuf>,

    // Classification
    /// Namespace kinds compared against init's; a difference in any of them
    /// marks a process as containerized.
    #[serde(alias = "namespace-kinds")]
    pub namespace_kinds: Option<Vec<NamespaceKind>>,

    // Endpoint names
    #[serde(alias = "system-endpoint")]
    pub system_endpoint: Option<String>,
    #[serde(alias = "container-endpoint")]
    pub container_endpoint: Option<String>,

    // Feature flags
    pub enable_health: Option<bool>,
    pub enable_telemetry: Option<bool>,

    // Logging
    pub log_level: Option<String>,

    // TLS/SSL Configuration
    #[serde(alias = "enable-tls")]
    pub enable_tls: Option<bool>,
    #[serde(alias = "tls-cert-path")]
    pub tls_cert_path: Option<String>,
    #[serde(alias = "tls-key-path")]
    pub tls_key_path: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind: Some(DEFAULT_BIND_ADDR.to_string()),
            port: Some(DEFAULT_PORT),
            proc_root: Some(PathBuf::from(DEFAULT_PROC_ROOT)),
            test_data_file: None,
            namespace_kinds: Some(vec![NamespaceKind::Uts]),
            system_endpoint: Some(DEFAULT_SYSTEM_ENDPOINT.to_string()),
            container_endpoint: Some(DEFAULT_CONTAINER_ENDPOINT.to_string()),
            enable_health: Some(true),
            enable_telemetry: Some(true),
            log_level: Some("info".into()),
            enable_tls: Some(false),
            tls_cert_path: None,
            tls_key_path: None,
        }
    }
}

impl Config {
    pub fn proc_root(&self) -> PathBuf {
        self.proc_root
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_PROC_ROOT))
    }

    pub fn namespace_kinds(&self) -> Vec<NamespaceKind> {
        self.namespace_kinds
            .clone()
            .unwrap_or_else(|| vec![NamespaceKind::Uts])
    }

    pub fn system_endpoint(&self) -> &str {
        self.system_endpoint
            .as_deref()
            .unwrap_or(DEFAULT_SYSTEM_ENDPOINT)
    }

    pub fn container_endpoint(&self) -> &str {
        self.container_endpoint
            .as_deref()
            .unwrap_or(DEFAULT_CONTAINER_ENDPOINT)
    }
}

/// Validate effective config (used by --check-config and at startup)
pub fn validate_effective_config(cfg: &Config) -> Result<(), Box<dyn std::error::Error>> {
    // Namespace kinds: at least one, no duplicates
    if let Some(kinds) = &cfg.namespace_kinds {
        if kinds.is_empty() {
            return Err("namespace_kinds must list at least one namespace kind".into());
        }
        for (i, kind) in kinds.iter().enumerate() {
            if kinds[..i].contains(kind) {
                return Err(format!("namespace_kinds lists '{}' more than once", kind).into());
            }
        }
    }

    // Endpoint names
    let system = cfg.system_endpoint();
    let container = cfg.container_endpoint();
    for name in [system, container] {
        validate_endpoint_name(name)?;
        if RESERVED_ENDPOINTS.contains(&name) {
            return Err(format!("Endpoint name '{}' is reserved", name).into());
        }
    }
    if system == container {
        return Err(format!(
            "system_endpoint and container_endpoint must differ (both are '{}')",
            system
        )
        .into());
    }

    // Test data file must exist if configured
    if let Some(path) = &cfg.test_data_file {
        if !path.exists() {
            return Err(format!("Test data file not found: {}", path.display()).into());
        }
    }

    // TLS validation
    if cfg.enable_tls.unwrap_or(false) {
        let cert_path = cfg.tls_cert_path.as_deref();
        let key_path = cfg.tls_key_path.as_deref();

        match (cert_path, key_path) {
            (None, None) => {
                return Err(
                    "TLS is enabled but neither tls_cert_path nor tls_key_path are set".into(),
                );
            }
            (Some(_), None) => {
                return Err("TLS is enabled but tls_key_path is not set".into());
            }
            (None, Some(_)) => {
                return Err("TLS is enabled but tls_cert_path is not set".into());
            }
            (Some(cert), Some(key)) => {
                check_pem_file(cert, "certificate")?;
                check_pem_file(key, "private key")?;
            }
        }
    }

    Ok(())
}

/// Checks that a TLS file exists, is readable and not empty.
fn check_pem_file(path: &str, what: &str) -> Result<(), Box<dyn std::error::Error>> {
    if !Path::new(path).exists() {
        return Err(format!("TLS {} file not found: {}", what, path).into());
    }
    match fs::metadata(path) {
        Ok(meta) if meta.len() == 0 => Err(format!("TLS {} file is empty: {}", what, path).into()),
        Err(e) => Err(format!("TLS {} file is not readable: {} ({})", what, path, e).into()),
        Ok(_) => Ok(()),
    }
}

/// Parses a comma-separated list of namespace kinds.
pub fn parse_namespace_kinds(list: &str) -> Result<Vec<NamespaceKind>, String> {
    list.split(',')
        .filter(|s| !s.trim().is_empty())
        .map(|s| s.parse::<NamespaceKind>())
        .collect()
}

/// Resolves configuration from CLI args, config file, and defaults.
/// This enforces precedence: CLI (if provided) > config file > default.
pub fn resolve_config(args: &Args) -> Result<Config, Box<dyn std::error::Error>> {
    let mut config = if args.no_config {
        Config::default()
    } else {
        load_config(args.config.as_deref())?
    };

    // Override with CLI args
    if let Some(bind_ip) = args.bind {
        config.bind = Some(bind_ip.to_string());
    }
    if let Some(cli_port) = args.port {
        config.port = Some(cli_port);
    }

    // Source settings
    if let Some(root) = &args.proc_root {
        config.proc_root = Some(root.clone());
    }
    if let Some(test_file) = &args.test_data_file {
        config.test_data_file = Some(test_file.clone());
    }

    // Classification
    if let Some(kinds) = &args.namespace_kinds {
        config.namespace_kinds = Some(parse_namespace_kinds(kinds)?);
    }

    // Endpoint names
    if let Some(name) = &args.system_endpoint {
        config.system_endpoint = Some(name.clone());
    }
    if let Some(name) = &args.container_endpoint {
        config.container_endpoint = Some(name.clone());
    }

    // Feature flags
    if args.disable_health {
        config.enable_health = Some(false);
    }
    if args.disable_telemetry {
        config.enable_telemetry = Some(false);
    }

    // TLS configuration: CLI wins if provided
    if args.enable_tls {
        config.enable_tls = Some(true);
    }
    if let Some(cert_path) = &args.tls_cert {
        config.tls_cert_path = Some(cert_path.to_string_lossy().to_string());
    }
    if let Some(key_path) = &args.tls_key {
        config.tls_key_path = Some(key_path.to_string_lossy().to_string());
    }

    Ok(config)
}

/// Configuration loading with multiple format support
pub fn load_config(path: Option<&Path>) -> Result<Config, Box<dyn std::error::Error>> {
    let path = match path {
        Some(p) => p.to_path_buf(),
        None => {
            // Try default locations
            let defaults = [
                "/etc/procinfo/exporter.yaml",
                "/etc/procinfo/exporter.yml",
                "/etc/procinfo/exporter.json",
                "./procinfo-exporter.yaml",
                "./procinfo-exporter.yml",
                "./procinfo-exporter.json",
            ];

            match defaults.iter().find(|p| Path::new(p).exists()) {
                Some(p) => PathBuf::from(p),
                None => return Ok(Config::default()),
            }
        }
    };

    if !path.exists() {
        return Err(format!("Config file not found: {}", path.display()).into());
    }

    let content = fs::read_to_string(&path)?;
    let config = parse_config(&content, path.extension().and_then(|s| s.to_str()))?;
    info!("Loaded configuration from: {}", path.display());
    Ok(config)
}

/// Parses config content; the extension picks the format (YAML by default).
pub fn parse_config(
    content: &str,
    extension: Option<&str>,
) -> Result<Config, Box<dyn std::error::Error>> {
    let config = match extension {
        Some("json") => serde_json::from_str(content)?,
        Some("toml") => toml::from_str(content)?,
        _ => serde_yaml::from_str(content)?,
    };
    Ok(config)
}

/// Renders a configuration in the requested format.
pub fn render_config(
    config: &Config,
    format: &ConfigFormat,
) -> Result<String, Box<dyn std::error::Error>> {
    let output = match format {
        ConfigFormat::Json => serde_json::to_string_pretty(config)?,
        ConfigFormat::Toml => toml::to_string_pretty(config)?,
        ConfigFormat::Yaml => serde_yaml::to_string(config)?,
    };
    Ok(output)
}

/// Shows configuration in requested format
pub fn show_config(config: &Config, format: ConfigFormat) -> Result<(), Box<dyn std::error::Error>> {
    println!("{}", render_config(config, &format)?);
    Ok(())
}

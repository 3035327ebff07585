//! Report command implementation.
//!
//! Performs a single read of one report and prints it to stdout.

use std::io::Write;

use crate::config::Config;
use crate::state::{build_registry, build_source};

/// Prints the system report, or the container report with `container`.
pub fn command_report(container: bool, config: &Config) -> Result<(), Box<dyn std::error::Error>> {
    let registry = build_registry(config, build_source(config))?;
    let name = if container {
        config.container_endpoint()
    } else {
        config.system_endpoint()
    };

    let rendered = registry.generate(name)?.render()?;
    let mut stdout = std::io::stdout().lock();
    stdout.write_all(rendered.as_bytes())?;
    stdout.flush()?;
    Ok(())
}

//! Startup requirement validation for procinfo-exporter.
//!
//! This module validates that the exporter has the permissions it needs to
//! read other processes' namespaces before the server starts.

use nix::unistd::geteuid;
use procinfo_exporter::NamespaceKind;
use std::fs;
use std::path::Path;
use tracing::{error, info, warn};

/// Validate all runtime requirements against the procfs mounted at `proc_root`,
/// for the namespace kinds used to classify processes.
pub fn validate_requirements(
    proc_root: &Path,
    kinds: &[NamespaceKind],
) -> Result<(), ValidationError> {
    info!("🔍 Validating runtime requirements...");

    check_user_privileges();
    check_proc_mounted(proc_root)?;
    check_namespace_access(proc_root, kinds)?;

    info!("✅ All runtime requirements validated");
    Ok(())
}

/// Check if running with sufficient privileges
fn check_user_privileges() {
    if !geteuid().is_root() {
        warn!("⚠️  Not running as root - namespaces of other users' processes may be unreadable");
        warn!("   Such processes are reported as host processes");
    } else {
        info!("✅ Running as root (uid=0)");
    }
}

fn check_proc_mounted(proc_root: &Path) -> Result<(), ValidationError> {
    let meminfo = proc_root.join("meminfo");
    if !meminfo.exists() {
        error!("❌ {} not found - is procfs mounted?", meminfo.display());
        return Err(ValidationError::ProcNotMounted(
            proc_root.display().to_string(),
        ));
    }
    Ok(())
}

/// Check that the root process's namespace link of every configured kind
/// can be resolved. Returns the kinds that could be read.
fn check_namespace_access(
    proc_root: &Path,
    kinds: &[NamespaceKind],
) -> Result<Vec<NamespaceKind>, ValidationError> {
    let mut readable = Vec::new();

    for &kind in kinds {
        let link = proc_root.join("1/ns").join(kind.as_str());

        match fs::read_link(&link) {
            Ok(_) => {
                info!("✅ {} readable", link.display());
                readable.push(kind);
            }
            Err(e) if e.kind() == std::io::ErrorKind::PermissionDenied => {
                error!("❌ Cannot read {} - insufficient permissions", link.display());
                error!("   Without the root process's namespace every process looks like a host process!");
                error!("");
                error!("   Solutions:");
                error!("   1. Run as root");
                error!("   2. Grant capabilities:");
                error!("      setcap cap_sys_ptrace+ep /path/to/binary");
                return Err(ValidationError::InsufficientPermissions(format!(
                    "{}: {}",
                    link.display(),
                    e
                )));
            }
            Err(e) => {
                warn!("⚠️  Could not test {} namespace access: {}", kind.as_str(), e);
                warn!("   The {} namespace never marks a process as containerized", kind.as_str());
            }
        }
    }

    Ok(readable)
}

#[derive(Debug, thiserror::Error)]
pub enum ValidationError {
    #[error("Insufficient permissions: {0}")]
    InsufficientPermissions(String),

    #[error("procfs not mounted at {0}")]
    ProcNotMounted(String),
}

//! Management-daemon discovery.
//!
//! Runs once at controller construction: is the libvirt control client
//! installed, and what is its compiled-in default connection URI? Neither
//! probe can fail; any execution problem just reads as "unavailable".

use crate::exec::Runner;

/// Check whether the libvirt control client is installed.
pub fn daemon_available(runner: &Runner, virsh_bin: &str) -> bool {
    match runner.run(&["which", virsh_bin]) {
        Ok(out) => out.success(),
        Err(e) => {
            tracing::debug!(error = %e, "libvirt availability probe failed");
            false
        }
    }
}

/// Ask the control client for its default connection URI.
///
/// Only meaningful when [`daemon_available`] returned true. Returns `None`
/// on any failure.
pub fn default_endpoint(runner: &Runner, virsh_bin: &str) -> Option<String> {
    match runner.run(&[virsh_bin, "uri"]) {
        Ok(out) if out.success() => {
            let uri = out.stdout_text().trim().to_string();
            if uri.is_empty() {
                None
            } else {
                Some(uri)
            }
        }
        Ok(out) => {
            tracing::debug!(code = ?out.code, "default URI query exited nonzero");
            None
        }
        Err(e) => {
            tracing::debug!(error = %e, "default URI query failed");
            None
        }
    }
}

//! The VM controller.
//!
//! One [`Controller`] fronts two disjoint backends: directly-spawned QEMU
//! processes, discovered by scanning the process table, and libvirt domains,
//! driven through the `virsh` client. Both are reached exclusively via
//! external commands, so every operation here tolerates spawn failure,
//! nonzero exits, and ambiguous output, degrading to `false`/`Unknown`/empty
//! instead of propagating errors.
//!
//! Probes run once at construction; build a new controller to re-probe.

mod enumerate;
mod lifecycle;

pub use lifecycle::{SpawnOpt, DEFAULT_STOP_TIMEOUT_SECS};

use crate::exec::{Output, Runner};
use crate::probe;
use crate::sandbox;
use crate::vm::WELL_KNOWN_URIS;
use crate::Result;

/// Construction-time settings for [`Controller`].
///
/// Binary paths are injectable so tests (and unusual hosts) can substitute
/// their own tools; the defaults match a stock Linux install.
#[derive(Debug, Clone)]
pub struct ControllerConfig {
    /// QEMU binary used for direct spawns.
    pub qemu_bin: String,
    /// libvirt control client.
    pub virsh_bin: String,
    /// Process-search tool.
    pub pgrep_bin: String,
    /// Explicit libvirt URI for single-endpoint enumeration; falls back to
    /// the probed default.
    pub endpoint: Option<String>,
    /// Sandbox override. `None` auto-detects flatpak.
    pub sandboxed: Option<bool>,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            qemu_bin: "qemu-system-x86_64".to_string(),
            virsh_bin: "virsh".to_string(),
            pgrep_bin: "pgrep".to_string(),
            endpoint: None,
            sandboxed: None,
        }
    }
}

/// Unified lifecycle controller for QEMU and libvirt VMs.
///
/// Holds no VM state: enumeration and status results are created fresh per
/// call and owned by the caller. All operations are synchronous and
/// blocking, dominated by external-process latency; `stop` may block for up
/// to its full timeout.
pub struct Controller {
    runner: Runner,
    qemu_bin: String,
    virsh_bin: String,
    pgrep_bin: String,
    endpoint: Option<String>,
    daemon_available: bool,
    default_endpoint: Option<String>,
}

impl Controller {
    /// Construct a controller, probing the environment once.
    pub fn new(config: ControllerConfig) -> Self {
        let sandboxed = config.sandboxed.unwrap_or_else(sandbox::is_sandboxed);
        let runner = Runner::new(sandboxed);

        let daemon_available = probe::daemon_available(&runner, &config.virsh_bin);
        let default_endpoint = if daemon_available {
            probe::default_endpoint(&runner, &config.virsh_bin)
        } else {
            None
        };

        tracing::debug!(
            sandboxed,
            daemon_available,
            default_endpoint = default_endpoint.as_deref().unwrap_or("-"),
            "controller initialized"
        );

        Self {
            runner,
            qemu_bin: config.qemu_bin,
            virsh_bin: config.virsh_bin,
            pgrep_bin: config.pgrep_bin,
            endpoint: config.endpoint,
            daemon_available,
            default_endpoint,
        }
    }

    /// Whether the libvirt control client was found at construction.
    pub fn daemon_available(&self) -> bool {
        self.daemon_available
    }

    /// The probed default connection URI, if any.
    pub fn default_endpoint(&self) -> Option<&str> {
        self.default_endpoint.as_deref()
    }

    /// Endpoints queried by a full enumeration: the well-known system and
    /// session URIs plus the probed default, deduplicated in order.
    pub(crate) fn all_endpoints(&self) -> Vec<String> {
        let mut uris: Vec<String> = Vec::new();
        for uri in WELL_KNOWN_URIS
            .iter()
            .map(|u| u.to_string())
            .chain(self.default_endpoint.clone())
        {
            if !uris.contains(&uri) {
                uris.push(uri);
            }
        }
        uris
    }

    /// The one endpoint used when not enumerating everything.
    pub(crate) fn single_endpoint(&self) -> Option<String> {
        self.endpoint
            .clone()
            .or_else(|| self.default_endpoint.clone())
    }

    /// Build a `virsh -c <uri> ...` invocation.
    pub(crate) fn virsh_argv(&self, uri: &str, args: &[&str]) -> Vec<String> {
        let mut argv = vec![self.virsh_bin.clone(), "-c".to_string(), uri.to_string()];
        argv.extend(args.iter().map(|s| s.to_string()));
        argv
    }

    /// Run a `virsh` sub-command against one endpoint.
    pub(crate) fn run_virsh(&self, uri: &str, args: &[&str]) -> Result<Output> {
        self.runner.run(&self.virsh_argv(uri, args))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::write_shim;

    #[test]
    fn test_construction_probes_daemon_and_default_endpoint() {
        let dir = tempfile::tempdir().unwrap();
        let virsh = write_shim(
            dir.path(),
            "virsh",
            r#"[ "$1" = uri ] && { echo "qemu:///session"; exit 0; }; exit 1"#,
        );

        let controller = Controller::new(ControllerConfig {
            virsh_bin: virsh.display().to_string(),
            sandboxed: Some(false),
            ..Default::default()
        });

        assert!(controller.daemon_available());
        assert_eq!(controller.default_endpoint(), Some("qemu:///session"));
    }

    #[test]
    fn test_construction_without_daemon() {
        let controller = Controller::new(ControllerConfig {
            virsh_bin: "qemuctl-test-no-such-tool".to_string(),
            sandboxed: Some(false),
            ..Default::default()
        });

        assert!(!controller.daemon_available());
        assert_eq!(controller.default_endpoint(), None);
    }

    #[test]
    fn test_all_endpoints_deduplicates_default() {
        let dir = tempfile::tempdir().unwrap();
        // Default URI collides with a well-known one.
        let virsh = write_shim(
            dir.path(),
            "virsh",
            r#"[ "$1" = uri ] && { echo "qemu:///system"; exit 0; }; exit 1"#,
        );

        let controller = Controller::new(ControllerConfig {
            virsh_bin: virsh.display().to_string(),
            sandboxed: Some(false),
            ..Default::default()
        });

        assert_eq!(
            controller.all_endpoints(),
            vec!["qemu:///system", "qemu:///session"]
        );
    }

    #[test]
    fn test_single_endpoint_prefers_explicit_uri() {
        let dir = tempfile::tempdir().unwrap();
        let virsh = write_shim(
            dir.path(),
            "virsh",
            r#"[ "$1" = uri ] && { echo "qemu:///session"; exit 0; }; exit 1"#,
        );

        let controller = Controller::new(ControllerConfig {
            virsh_bin: virsh.display().to_string(),
            endpoint: Some("qemu+ssh://host/system".to_string()),
            sandboxed: Some(false),
            ..Default::default()
        });

        assert_eq!(
            controller.single_endpoint().as_deref(),
            Some("qemu+ssh://host/system")
        );
    }
}

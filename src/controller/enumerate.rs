//! Multi-endpoint enumeration.
//!
//! Managed domains are listed per endpoint with two `virsh list` calls
//! (running, then inactive; the daemon offers no reliable combined query).
//! Directly-spawned guests come from a process-table scan, filtered against
//! the union of managed names: the daemon launches its domains as the same
//! QEMU process the raw scan would otherwise double-report.

use super::Controller;
use crate::vm::{EndpointVms, Inventory, VmEntry, VmStatus};
use regex::Regex;
use std::collections::HashSet;
use std::sync::OnceLock;

/// Token identifying a guest name on a QEMU command line.
///
/// The value runs to the next comma or end of line; names containing a
/// comma are truncated at the first one.
fn guest_name_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"-name\s+guest=([^,]+)").unwrap())
}

/// Extract the guest name from one process-scan line, if present.
fn guest_name(line: &str) -> Option<&str> {
    guest_name_pattern()
        .captures(line)
        .and_then(|captures| captures.get(1))
        .map(|m| m.as_str())
}

impl Controller {
    /// List VMs across the direct-process backend and libvirt endpoints.
    ///
    /// With `all_endpoints`, every well-known URI plus the probed default is
    /// queried; otherwise only the configured (or default) endpoint. A
    /// failure against one endpoint is logged and leaves that endpoint's
    /// list empty without aborting the others.
    pub fn list_vms(&self, all_endpoints: bool) -> Inventory {
        let mut inventory = Inventory::default();

        if self.daemon_available {
            let endpoints = if all_endpoints {
                self.all_endpoints()
            } else {
                self.single_endpoint().into_iter().collect()
            };

            for uri in endpoints {
                let vms = self.list_endpoint(&uri);
                inventory.managed.push(EndpointVms { endpoint: uri, vms });
            }
        }

        let managed_names: HashSet<&str> = inventory
            .managed
            .iter()
            .flat_map(|per_endpoint| per_endpoint.vms.iter())
            .map(|vm| vm.name.as_str())
            .collect();
        let direct = self.scan_direct(&managed_names);
        inventory.direct = direct;

        tracing::debug!(
            direct = inventory.direct.len(),
            managed = inventory.len() - inventory.direct.len(),
            "enumerated vms"
        );
        inventory
    }

    /// Running then inactive domains for one endpoint.
    fn list_endpoint(&self, uri: &str) -> Vec<VmEntry> {
        let queries: [(&[&str], VmStatus); 2] = [
            (&["list", "--name"], VmStatus::Running),
            (&["list", "--inactive", "--name"], VmStatus::Stopped),
        ];

        let mut vms = Vec::new();
        for (args, status) in queries {
            match self.run_virsh(uri, args) {
                Ok(out) if out.success() => {
                    for line in out.stdout_text().lines() {
                        let name = line.trim();
                        if !name.is_empty() {
                            vms.push(VmEntry::new(name, status));
                        }
                    }
                }
                Ok(out) => {
                    tracing::warn!(
                        endpoint = %uri,
                        code = ?out.code,
                        stderr = %out.stderr_text().trim(),
                        "domain listing exited nonzero"
                    );
                }
                Err(e) => {
                    tracing::warn!(endpoint = %uri, error = %e, "domain listing failed");
                }
            }
        }
        vms
    }

    /// Scan the process table for directly-spawned guests.
    ///
    /// Every match is `Running`; a guest whose process does not exist simply
    /// never appears. Lines without a guest-name token are ignored.
    fn scan_direct(&self, managed_names: &HashSet<&str>) -> Vec<VmEntry> {
        let out = match self.runner.run(&[self.pgrep_bin.as_str(), "-fa", "qemu"]) {
            Ok(out) => out,
            Err(e) => {
                tracing::warn!(error = %e, "process scan failed");
                return Vec::new();
            }
        };

        let mut vms = Vec::new();
        for line in out.stdout_text().lines() {
            let Some(name) = guest_name(line) else {
                continue;
            };
            if managed_names.contains(name) {
                continue;
            }
            vms.push(VmEntry::new(name, VmStatus::Running));
        }
        vms
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::controller::ControllerConfig;
    use crate::testutil::write_shim;

    #[test]
    fn test_guest_name_extraction() {
        let line = "1234 qemu-system-x86_64 -name guest=Fedora39,debug-threads=on -m 2048";
        assert_eq!(guest_name(line), Some("Fedora39"));
    }

    #[test]
    fn test_guest_name_runs_to_end_of_line() {
        assert_eq!(
            guest_name("77 qemu-system-x86_64 -name guest=win11"),
            Some("win11")
        );
    }

    #[test]
    fn test_guest_name_truncates_at_comma() {
        // A comma inside the name is indistinguishable from the next
        // parameter; the name is cut at the first one.
        assert_eq!(
            guest_name("9 qemu -name guest=a,b -m 512"),
            Some("a")
        );
    }

    #[test]
    fn test_line_without_token_is_ignored() {
        assert_eq!(guest_name("4321 qemu-system-x86_64 -m 2048"), None);
        assert_eq!(guest_name(""), None);
    }

    fn fake_virsh_body() -> &'static str {
        // `virsh uri` probe, then `virsh -c <uri> list [--inactive] --name`.
        r#"
if [ "$1" = uri ]; then echo "qemu:///custom"; exit 0; fi
case "$2|$4" in
  "qemu:///system|--name") echo alpha; echo beta;;
  "qemu:///system|--inactive") echo gamma;;
  "qemu:///custom|--name") echo delta;;
esac
exit 0
"#
    }

    fn fake_pgrep_body() -> &'static str {
        r#"
echo "101 qemu-system-x86_64 -name guest=alpha,debug-threads=on -m 2048"
echo "102 qemu-system-x86_64 -name guest=scratch -m 512"
echo "103 qemu-system-x86_64 -display gtk"
exit 0
"#
    }

    fn controller(dir: &std::path::Path) -> Controller {
        let virsh = write_shim(dir, "virsh", fake_virsh_body());
        let pgrep = write_shim(dir, "pgrep", fake_pgrep_body());
        Controller::new(ControllerConfig {
            virsh_bin: virsh.display().to_string(),
            pgrep_bin: pgrep.display().to_string(),
            sandboxed: Some(false),
            ..Default::default()
        })
    }

    #[test]
    fn test_list_all_endpoints() {
        let dir = tempfile::tempdir().unwrap();
        let inventory = controller(dir.path()).list_vms(true);

        // Fixed endpoint order: system, session, then the probed default.
        let endpoints: Vec<&str> = inventory
            .managed
            .iter()
            .map(|e| e.endpoint.as_str())
            .collect();
        assert_eq!(
            endpoints,
            vec!["qemu:///system", "qemu:///session", "qemu:///custom"]
        );

        // Running domains precede inactive ones within an endpoint.
        let system = &inventory.managed[0].vms;
        assert_eq!(
            system,
            &vec![
                VmEntry::new("alpha", VmStatus::Running),
                VmEntry::new("beta", VmStatus::Running),
                VmEntry::new("gamma", VmStatus::Stopped),
            ]
        );
        assert!(inventory.managed[1].vms.is_empty());
        assert_eq!(inventory.managed[2].vms, vec![VmEntry::new("delta", VmStatus::Running)]);
    }

    #[test]
    fn test_direct_scan_excludes_managed_names() {
        let dir = tempfile::tempdir().unwrap();
        let inventory = controller(dir.path()).list_vms(true);

        // "alpha" belongs to the daemon; only the unmanaged guest survives.
        assert_eq!(
            inventory.direct,
            vec![VmEntry::new("scratch", VmStatus::Running)]
        );

        let managed: HashSet<&str> = inventory
            .managed
            .iter()
            .flat_map(|e| e.vms.iter())
            .map(|vm| vm.name.as_str())
            .collect();
        assert!(inventory.direct.iter().all(|vm| !managed.contains(vm.name.as_str())));
    }

    #[test]
    fn test_single_endpoint_listing() {
        let dir = tempfile::tempdir().unwrap();
        let inventory = controller(dir.path()).list_vms(false);

        // Only the probed default is queried.
        let endpoints: Vec<&str> = inventory
            .managed
            .iter()
            .map(|e| e.endpoint.as_str())
            .collect();
        assert_eq!(endpoints, vec!["qemu:///custom"]);
    }

    #[test]
    fn test_enumeration_without_daemon_still_scans_processes() {
        let dir = tempfile::tempdir().unwrap();
        let pgrep = write_shim(dir.path(), "pgrep", fake_pgrep_body());
        let controller = Controller::new(ControllerConfig {
            virsh_bin: "qemuctl-test-no-such-tool".to_string(),
            pgrep_bin: pgrep.display().to_string(),
            sandboxed: Some(false),
            ..Default::default()
        });

        let inventory = controller.list_vms(true);
        assert!(inventory.managed.is_empty());
        // Nothing is managed, so nothing is excluded from the scan.
        assert_eq!(
            inventory.direct,
            vec![
                VmEntry::new("alpha", VmStatus::Running),
                VmEntry::new("scratch", VmStatus::Running),
            ]
        );
    }
}

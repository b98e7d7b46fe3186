//! VM identity and status model.
//!
//! This module provides the small data model shared by enumeration and
//! lifecycle operations:
//! - [`Backend`]: which of the two backends owns a VM
//! - [`VmStatus`] / [`StatusReport`]: the status classification
//! - [`Inventory`]: the result of a multi-endpoint enumeration
//!
//! All types are transient; the controller retains none of them between
//! calls.

pub mod endpoint;
pub mod state;

pub use endpoint::{Backend, QEMU_ENDPOINT, WELL_KNOWN_URIS};
pub use state::{StatusReport, VmStatus};

use serde::{Deserialize, Serialize};

/// A VM observed during enumeration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VmEntry {
    /// Guest name.
    pub name: String,
    /// Observed status. Enumeration never reports `Unknown`.
    pub status: VmStatus,
}

impl VmEntry {
    /// Create an entry.
    pub fn new(name: impl Into<String>, status: VmStatus) -> Self {
        Self {
            name: name.into(),
            status,
        }
    }
}

/// VMs found on one libvirt endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EndpointVms {
    /// Connection URI.
    pub endpoint: String,
    /// Running domains first, then inactive ones.
    pub vms: Vec<VmEntry>,
}

/// Live enumeration result across both backends.
///
/// Invariant: no name under `direct` appears in any endpoint's managed list.
/// The daemon launches its guests as the same QEMU process the raw scan
/// matches, so the scan is filtered against the union of managed names
/// before acceptance.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Inventory {
    /// Directly-spawned QEMU guests, in process-scan order.
    pub direct: Vec<VmEntry>,
    /// Per-endpoint managed guests, in endpoint iteration order.
    pub managed: Vec<EndpointVms>,
}

/// One row of a flattened inventory: enough to identify a VM for any
/// lifecycle call, plus a display label for pickers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VmRef {
    /// Guest name.
    pub name: String,
    /// Endpoint token to pass back into lifecycle operations.
    pub endpoint: String,
    /// Observed status.
    pub status: VmStatus,
    /// Human-readable label, e.g. `Fedora39 (QEMU)`.
    pub label: String,
}

impl Inventory {
    /// Whether the enumeration found nothing at all.
    pub fn is_empty(&self) -> bool {
        self.direct.is_empty() && self.managed.iter().all(|e| e.vms.is_empty())
    }

    /// Total number of VMs across both backends.
    pub fn len(&self) -> usize {
        self.direct.len() + self.managed.iter().map(|e| e.vms.len()).sum::<usize>()
    }

    /// Flatten into `(name, endpoint)` rows, direct guests first.
    pub fn flatten(&self) -> Vec<VmRef> {
        let mut rows = Vec::with_capacity(self.len());
        for vm in &self.direct {
            rows.push(VmRef {
                name: vm.name.clone(),
                endpoint: QEMU_ENDPOINT.to_string(),
                status: vm.status,
                label: format!("{} (QEMU)", vm.name),
            });
        }
        for per_endpoint in &self.managed {
            for vm in &per_endpoint.vms {
                rows.push(VmRef {
                    name: vm.name.clone(),
                    endpoint: per_endpoint.endpoint.clone(),
                    status: vm.status,
                    label: format!("{} ({})", vm.name, per_endpoint.endpoint),
                });
            }
        }
        rows
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Inventory {
        Inventory {
            direct: vec![VmEntry::new("scratch", VmStatus::Running)],
            managed: vec![EndpointVms {
                endpoint: "qemu:///system".to_string(),
                vms: vec![
                    VmEntry::new("web", VmStatus::Running),
                    VmEntry::new("db", VmStatus::Stopped),
                ],
            }],
        }
    }

    #[test]
    fn test_flatten_orders_direct_before_managed() {
        let rows = sample().flatten();
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0].name, "scratch");
        assert_eq!(rows[0].endpoint, QEMU_ENDPOINT);
        assert_eq!(rows[1].name, "web");
        assert_eq!(rows[1].endpoint, "qemu:///system");
    }

    #[test]
    fn test_flatten_labels() {
        let rows = sample().flatten();
        assert_eq!(rows[0].label, "scratch (QEMU)");
        assert_eq!(rows[2].label, "db (qemu:///system)");
    }

    #[test]
    fn test_empty_inventory() {
        assert!(Inventory::default().is_empty());
        assert!(!sample().is_empty());
        assert_eq!(sample().len(), 3);
    }
}

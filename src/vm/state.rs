//! Status classification.

use crate::vm::Backend;
use serde::{Deserialize, Serialize};

/// Observable status of a VM.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VmStatus {
    /// The VM is up.
    Running,
    /// The VM exists but is not running, or its process is gone.
    Stopped,
    /// Neither state could be confirmed.
    Unknown,
}

impl VmStatus {
    /// Map a `virsh domstate` report onto the status model.
    ///
    /// libvirt has a wider state vocabulary than the controller tracks;
    /// anything outside the known set stays `Unknown`.
    pub fn from_domstate(state: &str) -> Self {
        match state.trim().to_lowercase().as_str() {
            "running" => VmStatus::Running,
            "shut off" | "inactive" | "paused" | "suspended" => VmStatus::Stopped,
            _ => VmStatus::Unknown,
        }
    }

    /// Check if the status is `Running`.
    pub fn is_running(self) -> bool {
        self == VmStatus::Running
    }

    /// Check if the status is `Stopped`.
    pub fn is_stopped(self) -> bool {
        self == VmStatus::Stopped
    }
}

impl std::fmt::Display for VmStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            VmStatus::Running => write!(f, "running"),
            VmStatus::Stopped => write!(f, "stopped"),
            VmStatus::Unknown => write!(f, "unknown"),
        }
    }
}

/// Result of a single-VM status query.
///
/// `backend` is `None` when no backend could claim the VM (daemon
/// unavailable for a managed endpoint, or the query failed before the
/// backend was identified). The connection URI lives inside
/// [`Backend::Managed`], so a URI is present exactly when the managed
/// backend is.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusReport {
    /// Classified status.
    pub status: VmStatus,
    /// Backend that answered the query, if any.
    pub backend: Option<Backend>,
}

impl StatusReport {
    /// Build a report.
    pub fn new(status: VmStatus, backend: Option<Backend>) -> Self {
        Self { status, backend }
    }

    /// The zero value: nothing confirmed, no backend.
    pub fn unknown() -> Self {
        Self {
            status: VmStatus::Unknown,
            backend: None,
        }
    }

    /// Connection URI, for managed-backend reports only.
    pub fn endpoint(&self) -> Option<&str> {
        self.backend.as_ref().and_then(Backend::endpoint)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_domstate_mapping() {
        // (reported state, classified status)
        let cases = [
            ("running", VmStatus::Running),
            ("shut off", VmStatus::Stopped),
            ("inactive", VmStatus::Stopped),
            ("paused", VmStatus::Stopped),
            ("suspended", VmStatus::Stopped),
            ("pmsuspended", VmStatus::Unknown),
            ("crashed", VmStatus::Unknown),
            ("", VmStatus::Unknown),
        ];

        for (state, expected) in cases {
            assert_eq!(
                VmStatus::from_domstate(state),
                expected,
                "domstate {:?}",
                state
            );
        }
    }

    #[test]
    fn test_domstate_mapping_is_case_and_whitespace_tolerant() {
        assert_eq!(VmStatus::from_domstate(" Running\n"), VmStatus::Running);
        assert_eq!(VmStatus::from_domstate("Shut Off"), VmStatus::Stopped);
    }

    #[test]
    fn test_report_endpoint_present_only_for_managed() {
        let direct = StatusReport::new(VmStatus::Running, Some(Backend::Direct));
        assert_eq!(direct.endpoint(), None);

        let managed = StatusReport::new(
            VmStatus::Stopped,
            Some(Backend::resolve("qemu:///session")),
        );
        assert_eq!(managed.endpoint(), Some("qemu:///session"));

        assert_eq!(StatusReport::unknown().endpoint(), None);
    }

    #[test]
    fn test_status_display() {
        assert_eq!(VmStatus::Running.to_string(), "running");
        assert_eq!(VmStatus::Stopped.to_string(), "stopped");
        assert_eq!(VmStatus::Unknown.to_string(), "unknown");
    }
}

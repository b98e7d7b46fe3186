//! Endpoint tokens and backend resolution.
//!
//! A VM is identified by `(name, endpoint)` where the endpoint is either the
//! sentinel `"qemu"` (a directly-spawned hypervisor process) or a libvirt
//! connection URI. The token is the sole discriminator of which backend owns
//! the VM; [`Backend::resolve`] is the single place the comparison happens.

use serde::{Deserialize, Serialize};

/// Sentinel endpoint naming the direct-process backend.
pub const QEMU_ENDPOINT: &str = "qemu";

/// Connection URIs tried during multi-endpoint enumeration, in order.
/// System-level domains first, then user-session domains.
pub const WELL_KNOWN_URIS: [&str; 2] = ["qemu:///system", "qemu:///session"];

/// Backend owning a VM, resolved once per call from the endpoint token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Backend {
    /// Standalone hypervisor process, no management layer.
    Direct,
    /// libvirt domain reachable through the given connection URI.
    Managed {
        /// Connection URI.
        endpoint: String,
    },
}

impl Backend {
    /// Resolve an endpoint token. `"qemu"` selects the direct backend;
    /// anything else is treated as a libvirt URI.
    pub fn resolve(endpoint: &str) -> Self {
        if endpoint == QEMU_ENDPOINT {
            Backend::Direct
        } else {
            Backend::Managed {
                endpoint: endpoint.to_string(),
            }
        }
    }

    /// The connection URI, for managed backends only.
    pub fn endpoint(&self) -> Option<&str> {
        match self {
            Backend::Direct => None,
            Backend::Managed { endpoint } => Some(endpoint),
        }
    }

    /// Whether this is the direct-process backend.
    pub fn is_direct(&self) -> bool {
        matches!(self, Backend::Direct)
    }
}

impl std::fmt::Display for Backend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Backend::Direct => write!(f, "qemu"),
            Backend::Managed { endpoint } => write!(f, "libvirt ({})", endpoint),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sentinel_resolves_to_direct() {
        assert_eq!(Backend::resolve("qemu"), Backend::Direct);
        assert!(Backend::resolve("qemu").is_direct());
        assert_eq!(Backend::resolve("qemu").endpoint(), None);
    }

    #[test]
    fn test_anything_else_resolves_to_managed() {
        let backend = Backend::resolve("qemu:///system");
        assert!(!backend.is_direct());
        assert_eq!(backend.endpoint(), Some("qemu:///system"));
    }

    #[test]
    fn test_uri_is_carried_verbatim() {
        // Even a URI naming the qemu driver is a managed endpoint; only the
        // bare sentinel selects the direct backend.
        let backend = Backend::resolve("qemu+ssh://host/system");
        assert_eq!(backend.endpoint(), Some("qemu+ssh://host/system"));
    }
}

//! Unified lifecycle control for QEMU and libvirt virtual machines.
//!
//! qemuctl reconciles two disjoint VM backends behind one API:
//!
//! - **Direct-process**: QEMU spawned as a standalone process, discovered by
//!   scanning the process table. Identified by the endpoint sentinel
//!   `"qemu"`.
//! - **Managed**: libvirt domains, driven through the `virsh` client across
//!   one or more connection URIs.
//!
//! Every operation shells out to external tools and classifies their output
//! and exit codes into a small status model; failures degrade to
//! `false`/`Unknown`/empty results rather than propagating. Inside a flatpak
//! sandbox, every invocation is transparently re-routed to the host.
//!
//! ```no_run
//! use qemuctl::{Controller, ControllerConfig};
//!
//! let controller = Controller::new(ControllerConfig::default());
//! for vm in controller.list_vms(true).flatten() {
//!     println!("{:<30} {}", vm.label, vm.status);
//! }
//! ```

pub mod controller;
pub mod error;
pub mod exec;
pub mod probe;
pub mod sandbox;
pub mod vm;

#[cfg(test)]
pub(crate) mod testutil;

pub use controller::{Controller, ControllerConfig, SpawnOpt, DEFAULT_STOP_TIMEOUT_SECS};
pub use error::{Error, Result};
pub use vm::{
    Backend, EndpointVms, Inventory, StatusReport, VmEntry, VmRef, VmStatus, QEMU_ENDPOINT,
};

/// Crate version from Cargo.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

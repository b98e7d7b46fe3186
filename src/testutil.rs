//! Shared test fixtures.
//!
//! Controller-level tests substitute small shell scripts for the external
//! tools (`virsh`, `pgrep`, QEMU), so the full command → parse → classify
//! path runs against deterministic behavior.

use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};

/// Write an executable `#!/bin/sh` shim into `dir` and return its path.
pub(crate) fn write_shim(dir: &Path, name: &str, body: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, format!("#!/bin/sh\n{}\n", body)).unwrap();

    let mut perms = fs::metadata(&path).unwrap().permissions();
    perms.set_mode(0o755);
    fs::set_permissions(&path, perms).unwrap();

    path
}

//! Flatpak sandbox detection.
//!
//! Inside a flatpak, host-side tools are not directly reachable; commands
//! have to be re-spawned on the host via `flatpak-spawn --host`. Detection
//! follows the portal convention: flatpak mounts a metadata file at the
//! sandbox root.

use std::path::Path;

/// Metadata file present at the root of every flatpak sandbox.
const FLATPAK_INFO: &str = "/.flatpak-info";

/// Whether the current process runs inside a flatpak sandbox.
pub fn is_sandboxed() -> bool {
    flatpak_info_present(Path::new(FLATPAK_INFO))
}

fn flatpak_info_present(path: &Path) -> bool {
    path.exists()
}

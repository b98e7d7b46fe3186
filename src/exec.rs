//! External command execution.
//!
//! Every controller operation round-trips through an external program
//! (`virsh`, `pgrep`, QEMU itself). The [`Runner`] owns the one piece of
//! ambient configuration affecting all of them: whether invocations must be
//! re-routed across the flatpak sandbox boundary. The rewrite applies to
//! every invocation uniformly, probes included.

use crate::error::{Error, Result};
use std::process::{Command, Stdio};

/// Launcher prefix escaping the flatpak sandbox onto the host.
const HOST_LAUNCHER: [&str; 2] = ["flatpak-spawn", "--host"];

/// Working directory for every invocation.
///
/// Commands must not inherit an unpredictable caller directory.
const WORKDIR: &str = "/";

/// Captured result of a finished command.
#[derive(Debug)]
pub struct Output {
    /// Raw stdout bytes.
    pub stdout: Vec<u8>,
    /// Raw stderr bytes.
    pub stderr: Vec<u8>,
    /// Exit code, or `None` if the process was killed by a signal.
    pub code: Option<i32>,
}

impl Output {
    /// Whether the command exited with code 0.
    pub fn success(&self) -> bool {
        self.code == Some(0)
    }

    /// stdout decoded lossily as UTF-8.
    pub fn stdout_text(&self) -> String {
        String::from_utf8_lossy(&self.stdout).into_owned()
    }

    /// stderr decoded lossily as UTF-8.
    pub fn stderr_text(&self) -> String {
        String::from_utf8_lossy(&self.stderr).into_owned()
    }
}

/// Runs external commands, rewriting them for the sandbox when needed.
#[derive(Debug, Clone)]
pub struct Runner {
    sandboxed: bool,
}

impl Runner {
    /// Create a runner. `sandboxed` selects the host-escape rewrite.
    pub fn new(sandboxed: bool) -> Self {
        Self { sandboxed }
    }

    /// Whether invocations are re-routed through the host launcher.
    pub fn sandboxed(&self) -> bool {
        self.sandboxed
    }

    /// The argv actually executed for a requested argv.
    pub fn effective_argv<S: AsRef<str>>(&self, argv: &[S]) -> Vec<String> {
        let mut full = Vec::with_capacity(argv.len() + 2);
        if self.sandboxed {
            full.extend(HOST_LAUNCHER.iter().map(|s| s.to_string()));
        }
        full.extend(argv.iter().map(|s| s.as_ref().to_string()));
        full
    }

    /// Run a command to completion, capturing stdout and stderr.
    ///
    /// Both streams are drained independently of process completion, so
    /// arbitrarily large output cannot deadlock the child. A nonzero exit is
    /// reported through [`Output::code`], not as an error; `Err` is reserved
    /// for spawn failure (binary missing, permission denied).
    pub fn run<S: AsRef<str>>(&self, argv: &[S]) -> Result<Output> {
        let full = self.effective_argv(argv);
        tracing::trace!(command = %full.join(" "), "running command");

        let output = Command::new(&full[0])
            .args(&full[1..])
            .current_dir(WORKDIR)
            .stdin(Stdio::null())
            .output()
            .map_err(|e| Error::command_failed(full.join(" "), e.to_string()))?;

        Ok(Output {
            stdout: output.stdout,
            stderr: output.stderr,
            code: output.status.code(),
        })
    }

    /// Spawn a long-lived background process and return immediately.
    ///
    /// The child is placed in its own session with stdio detached, so it
    /// survives the caller. Only spawn success is reported; the child's exit
    /// status is never observed.
    pub fn spawn_detached<S: AsRef<str>>(&self, argv: &[S]) -> Result<()> {
        use std::os::unix::process::CommandExt;

        let full = self.effective_argv(argv);
        tracing::debug!(command = %full.join(" "), "spawning background process");

        let mut command = Command::new(&full[0]);
        command
            .args(&full[1..])
            .current_dir(WORKDIR)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null());

        unsafe {
            command.pre_exec(|| {
                libc::setsid();
                Ok(())
            });
        }

        let _child = command
            .spawn()
            .map_err(|e| Error::command_failed(full.join(" "), e.to_string()))?;

        Ok(())
    }
}

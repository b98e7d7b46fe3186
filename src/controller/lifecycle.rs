//! Single-VM lifecycle operations: status, start, stop, toggle.
//!
//! Every mutating operation follows the same shape: query status first (the
//! no-op fast path), issue the backend-specific command, sleep a short
//! settle delay, then re-query. The returned boolean always reflects a
//! status observed strictly after the mutating command completed, never a
//! stale pre-command read.

use super::Controller;
use crate::vm::{Backend, StatusReport, VmStatus, QEMU_ENDPOINT};
use std::thread;
use std::time::{Duration, Instant};

/// Default graceful-stop timeout, in seconds.
pub const DEFAULT_STOP_TIMEOUT_SECS: u64 = 3;

/// Pause between a start command and the confirming status re-read.
const START_SETTLE: Duration = Duration::from_secs(2);

/// Pause before the final status re-read after stopping a managed domain.
const MANAGED_STOP_SETTLE: Duration = Duration::from_millis(200);

/// Pause before the final status re-read after signalling a direct process.
const DIRECT_STOP_SETTLE: Duration = Duration::from_secs(1);

/// Poll cadence while waiting out a graceful shutdown.
const POLL_INTERVAL: Duration = Duration::from_secs(1);

/// Extra QEMU command-line option for a direct spawn.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SpawnOpt {
    /// Bare `-flag` token, e.g. `enable-kvm`.
    Switch(String),
    /// `-key value` pair, e.g. `m 2048`.
    Value(String, String),
}

impl SpawnOpt {
    /// Parse a `key[=value]` spec; a bare key becomes a switch.
    pub fn parse(spec: &str) -> Self {
        match spec.split_once('=') {
            Some((key, value)) => SpawnOpt::Value(key.to_string(), value.to_string()),
            None => SpawnOpt::Switch(spec.to_string()),
        }
    }
}

/// Build the full argv for a direct QEMU spawn.
fn spawn_argv(qemu_bin: &str, name: &str, opts: &[SpawnOpt]) -> Vec<String> {
    let mut argv = vec![
        qemu_bin.to_string(),
        "-name".to_string(),
        format!("guest={}", name),
    ];
    for opt in opts {
        match opt {
            SpawnOpt::Switch(flag) => argv.push(format!("-{}", flag)),
            SpawnOpt::Value(key, value) => {
                argv.push(format!("-{}", key));
                argv.push(value.clone());
            }
        }
    }
    argv
}

/// Process-search pattern matching a named direct guest.
fn search_pattern(name: &str) -> String {
    format!("qemu.*{}", name)
}

/// First PID from process-search output.
fn parse_pid(stdout: &str) -> Option<libc::pid_t> {
    stdout.lines().next()?.trim().parse().ok()
}

/// Deliver a signal, logging delivery failure only.
fn send_signal(pid: libc::pid_t, signal: libc::c_int) {
    let rc = unsafe { libc::kill(pid, signal) };
    if rc != 0 {
        tracing::debug!(
            pid,
            signal,
            error = %std::io::Error::last_os_error(),
            "signal delivery failed"
        );
    }
}

impl Controller {
    /// Query the current status of one VM.
    pub fn status(&self, name: &str, endpoint: &str) -> StatusReport {
        match Backend::resolve(endpoint) {
            Backend::Direct => self.direct_status(name),
            Backend::Managed { endpoint: uri } if self.daemon_available => {
                self.managed_status(name, uri)
            }
            Backend::Managed { .. } => StatusReport::unknown(),
        }
    }

    fn direct_status(&self, name: &str) -> StatusReport {
        let pattern = search_pattern(name);
        match self
            .runner
            .run(&[self.pgrep_bin.as_str(), "-f", &pattern])
        {
            Ok(out) if out.success() => {
                StatusReport::new(VmStatus::Running, Some(Backend::Direct))
            }
            Ok(_) => StatusReport::new(VmStatus::Stopped, Some(Backend::Direct)),
            Err(e) => {
                tracing::warn!(vm = %name, error = %e, "process search failed");
                StatusReport::new(VmStatus::Unknown, Some(Backend::Direct))
            }
        }
    }

    fn managed_status(&self, name: &str, uri: String) -> StatusReport {
        let result = self.run_virsh(&uri, &["domstate", name]);
        let backend = Some(Backend::Managed { endpoint: uri });
        match result {
            Ok(out) if out.success() => StatusReport::new(
                VmStatus::from_domstate(&out.stdout_text()),
                backend,
            ),
            Ok(out) => {
                tracing::debug!(
                    vm = %name,
                    code = ?out.code,
                    stderr = %out.stderr_text().trim(),
                    "domain state query exited nonzero"
                );
                StatusReport::new(VmStatus::Unknown, backend)
            }
            Err(e) => {
                tracing::warn!(vm = %name, error = %e, "domain state query failed");
                StatusReport::new(VmStatus::Unknown, backend)
            }
        }
    }

    /// Start a VM.
    ///
    /// Idempotent: an already-running VM is reported as success without any
    /// command being issued. `opts` applies to direct spawns only. Returns
    /// whether the VM reports `Running` after the settle delay.
    pub fn start(&self, name: &str, endpoint: &str, opts: &[SpawnOpt]) -> bool {
        let report = self.status(name, endpoint);
        if report.status.is_running() {
            tracing::info!(vm = %name, "already running");
            return true;
        }

        match Backend::resolve(endpoint) {
            Backend::Managed { endpoint: uri } if self.daemon_available => {
                self.start_managed(name, &uri)
            }
            Backend::Direct => self.start_direct(name, opts),
            Backend::Managed { .. } => {
                tracing::error!(vm = %name, endpoint = %endpoint, "no backend can start this vm");
                false
            }
        }
    }

    fn start_managed(&self, name: &str, uri: &str) -> bool {
        match self.run_virsh(uri, &["start", name]) {
            Ok(out) if out.success() => {
                thread::sleep(START_SETTLE);
                self.status(name, uri).status.is_running()
            }
            Ok(out) => {
                tracing::error!(
                    vm = %name,
                    stderr = %out.stderr_text().trim(),
                    "failed to start domain"
                );
                false
            }
            Err(e) => {
                tracing::error!(vm = %name, error = %e, "failed to start domain");
                false
            }
        }
    }

    fn start_direct(&self, name: &str, opts: &[SpawnOpt]) -> bool {
        let argv = spawn_argv(&self.qemu_bin, name, opts);
        if let Err(e) = self.runner.spawn_detached(&argv) {
            tracing::error!(vm = %name, error = %e, "failed to spawn qemu");
            return false;
        }
        thread::sleep(START_SETTLE);
        self.status(name, QEMU_ENDPOINT).status.is_running()
    }

    /// Stop a VM, gracefully unless `force`.
    ///
    /// Idempotent: an already-stopped VM is reported as success without any
    /// command being issued. A graceful stop polls for up to `timeout_secs`
    /// and escalates to a forced kill if the VM is still running when the
    /// timeout elapses; the escalation's own outcome is not checked, only
    /// the final re-read. The endpoint must match the backend the status
    /// query detected.
    pub fn stop(&self, name: &str, endpoint: &str, force: bool, timeout_secs: u64) -> bool {
        let report = self.status(name, endpoint);
        if report.status.is_stopped() {
            tracing::info!(vm = %name, "already stopped");
            return true;
        }

        tracing::info!(vm = %name, status = %report.status, force, "stopping vm");

        match (Backend::resolve(endpoint), report.backend.as_ref()) {
            (Backend::Managed { endpoint: uri }, Some(Backend::Managed { .. })) => {
                self.stop_managed(name, &uri, force, timeout_secs)
            }
            (Backend::Direct, Some(Backend::Direct)) => {
                self.stop_direct(name, force, timeout_secs)
            }
            (requested, detected) => {
                tracing::error!(
                    vm = %name,
                    requested = %requested,
                    detected = ?detected,
                    "endpoint does not match the vm's backend"
                );
                false
            }
        }
    }

    fn stop_managed(&self, name: &str, uri: &str, force: bool, timeout_secs: u64) -> bool {
        let subcommand = if force { "destroy" } else { "shutdown" };
        match self.run_virsh(uri, &[subcommand, name]) {
            Ok(out) if out.success() => {}
            Ok(out) => {
                tracing::error!(
                    vm = %name,
                    stderr = %out.stderr_text().trim(),
                    "failed to stop domain"
                );
                return false;
            }
            Err(e) => {
                tracing::error!(vm = %name, error = %e, "failed to stop domain");
                return false;
            }
        }

        if !force {
            if self.wait_for_stop(name, uri, timeout_secs) {
                return true;
            }
            if self.status(name, uri).status.is_running() {
                tracing::warn!(vm = %name, "graceful shutdown timed out, destroying");
                let _ = self.run_virsh(uri, &["destroy", name]);
            }
        }

        thread::sleep(MANAGED_STOP_SETTLE);
        self.status(name, uri).status.is_stopped()
    }

    fn stop_direct(&self, name: &str, force: bool, timeout_secs: u64) -> bool {
        let pattern = search_pattern(name);
        let pid = match self
            .runner
            .run(&[self.pgrep_bin.as_str(), "-f", &pattern])
        {
            Ok(out) if out.success() => match parse_pid(&out.stdout_text()) {
                Some(pid) => pid,
                None => {
                    tracing::error!(vm = %name, "unparseable process search output");
                    return false;
                }
            },
            // Process already gone.
            Ok(_) => return true,
            Err(e) => {
                tracing::error!(vm = %name, error = %e, "process search failed");
                return false;
            }
        };

        if force {
            send_signal(pid, libc::SIGKILL);
        } else {
            send_signal(pid, libc::SIGTERM);
            if self.wait_for_stop(name, QEMU_ENDPOINT, timeout_secs) {
                return true;
            }
            if self.status(name, QEMU_ENDPOINT).status.is_running() {
                tracing::warn!(vm = %name, pid, "graceful shutdown timed out, killing");
                send_signal(pid, libc::SIGKILL);
            }
        }

        thread::sleep(DIRECT_STOP_SETTLE);
        self.status(name, QEMU_ENDPOINT).status.is_stopped()
    }

    /// Flip a VM between running and stopped based on a fresh status query.
    ///
    /// Running VMs get a graceful stop with the default timeout; everything
    /// else gets a plain start.
    pub fn toggle(&self, name: &str, endpoint: &str) -> bool {
        if self.status(name, endpoint).status.is_running() {
            self.stop(name, endpoint, false, DEFAULT_STOP_TIMEOUT_SECS)
        } else {
            self.start(name, endpoint, &[])
        }
    }

    /// Poll until the VM reports `Stopped` or the timeout elapses.
    fn wait_for_stop(&self, name: &str, endpoint: &str, timeout_secs: u64) -> bool {
        let deadline = Instant::now() + Duration::from_secs(timeout_secs);
        loop {
            if self.status(name, endpoint).status.is_stopped() {
                return true;
            }
            if Instant::now() >= deadline {
                return false;
            }
            thread::sleep(POLL_INTERVAL);
        }
    }
}

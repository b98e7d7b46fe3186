//! Stop command implementation.

use clap::Args;
use qemuctl::{Controller, DEFAULT_STOP_TIMEOUT_SECS};

/// Stop a VM.
#[derive(Args, Debug)]
pub struct StopCmd {
    /// VM name.
    pub name: String,

    /// Endpoint: "qemu" for direct VMs, or a libvirt URI.
    pub endpoint: String,

    /// Kill immediately instead of requesting a graceful shutdown.
    #[arg(short, long)]
    pub force: bool,

    /// Seconds to wait for a graceful shutdown before force killing.
    #[arg(long, default_value_t = DEFAULT_STOP_TIMEOUT_SECS)]
    pub timeout: u64,
}

impl StopCmd {
    /// Execute the stop command.
    pub fn run(self, controller: &Controller) -> qemuctl::Result<()> {
        if !controller.stop(&self.name, &self.endpoint, self.force, self.timeout) {
            return Err(qemuctl::Error::lifecycle("stop", &self.name));
        }

        println!("Stopped VM: {}", self.name);
        Ok(())
    }
}

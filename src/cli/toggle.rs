//! Toggle command implementation.

use clap::Args;
use qemuctl::Controller;

/// Start a stopped VM or gracefully stop a running one.
#[derive(Args, Debug)]
pub struct ToggleCmd {
    /// VM name.
    pub name: String,

    /// Endpoint: "qemu" for direct VMs, or a libvirt URI.
    pub endpoint: String,
}

impl ToggleCmd {
    /// Execute the toggle command.
    pub fn run(self, controller: &Controller) -> qemuctl::Result<()> {
        if !controller.toggle(&self.name, &self.endpoint) {
            return Err(qemuctl::Error::lifecycle("toggle", &self.name));
        }

        println!("Toggled VM: {}", self.name);
        Ok(())
    }
}

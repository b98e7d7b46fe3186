//! Status command implementation.

use clap::Args;
use qemuctl::Controller;

/// Query the status of a single VM.
#[derive(Args, Debug)]
pub struct StatusCmd {
    /// VM name.
    pub name: String,

    /// Endpoint: "qemu" for direct VMs, or a libvirt URI.
    pub endpoint: String,

    /// Output as JSON.
    #[arg(long)]
    pub json: bool,
}

impl StatusCmd {
    /// Execute the status command.
    pub fn run(&self, controller: &Controller) -> qemuctl::Result<()> {
        let report = controller.status(&self.name, &self.endpoint);

        if self.json {
            println!("{}", serde_json::to_string_pretty(&report).unwrap());
        } else {
            match &report.backend {
                Some(backend) => println!("{}: {} [{}]", self.name, report.status, backend),
                None => println!("{}: {}", self.name, report.status),
            }
        }

        Ok(())
    }
}

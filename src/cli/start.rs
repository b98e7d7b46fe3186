//! Start command implementation.

use clap::Args;
use qemuctl::{Controller, SpawnOpt};

/// Start a VM.
#[derive(Args, Debug)]
pub struct StartCmd {
    /// VM name.
    pub name: String,

    /// Endpoint: "qemu" for direct VMs, or a libvirt URI.
    pub endpoint: String,

    /// Extra QEMU option for direct spawns, as key[=value].
    /// A bare key becomes a switch: `-o enable-kvm` adds `-enable-kvm`.
    #[arg(short = 'o', long = "opt", value_name = "KEY[=VALUE]")]
    pub opts: Vec<String>,
}

impl StartCmd {
    /// Execute the start command.
    pub fn run(self, controller: &Controller) -> qemuctl::Result<()> {
        let opts: Vec<SpawnOpt> = self.opts.iter().map(|o| SpawnOpt::parse(o)).collect();

        if !controller.start(&self.name, &self.endpoint, &opts) {
            return Err(qemuctl::Error::lifecycle("start", &self.name));
        }

        println!("Started VM: {}", self.name);
        Ok(())
    }
}

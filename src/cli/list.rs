//! List command implementation.

use clap::Args;
use qemuctl::Controller;

/// List VMs across both backends.
#[derive(Args, Debug)]
pub struct ListCmd {
    /// Query every known libvirt endpoint, not just the default.
    #[arg(short, long)]
    pub all: bool,

    /// Output as JSON.
    #[arg(long)]
    pub json: bool,
}

impl ListCmd {
    /// Execute the list command.
    pub fn run(&self, controller: &Controller) -> qemuctl::Result<()> {
        let inventory = controller.list_vms(self.all);

        if self.json {
            println!("{}", serde_json::to_string_pretty(&inventory).unwrap());
            return Ok(());
        }

        if inventory.is_empty() {
            println!("No VMs found");
            return Ok(());
        }

        // Table output
        println!("{:<24} {:<10} {:<32}", "NAME", "STATUS", "ENDPOINT");
        println!("{}", "-".repeat(66));

        for vm in inventory.flatten() {
            println!(
                "{:<24} {:<10} {:<32}",
                truncate(&vm.name, 22),
                vm.status.to_string(),
                truncate(&vm.endpoint, 30),
            );
        }

        Ok(())
    }
}

/// Truncate a string to max length, adding "..." if needed.
fn truncate(s: &str, max: usize) -> String {
    if s.len() <= max {
        s.to_string()
    } else {
        format!("{}...", &s[..max - 3])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("short", 22), "short");
        assert_eq!(truncate("a-very-long-vm-name-indeed", 10), "a-very-...");
    }
}

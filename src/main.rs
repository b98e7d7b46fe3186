//! qemuctl CLI entry point.

use clap::{Parser, Subcommand};
use qemuctl::{Controller, ControllerConfig};
use tracing_subscriber::EnvFilter;

mod cli;

/// qemuctl - unified QEMU/libvirt VM lifecycle control
#[derive(Parser, Debug)]
#[command(name = "qemuctl")]
#[command(about = "Control QEMU and libvirt virtual machines")]
#[command(version)]
struct Cli {
    /// QEMU binary used for direct spawns.
    #[arg(long, global = true, default_value = "qemu-system-x86_64")]
    qemu_bin: String,

    /// libvirt connection URI (defaults to the probed default).
    #[arg(short = 'c', long, global = true, value_name = "URI")]
    connect: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// List VMs across both backends.
    #[command(alias = "ls")]
    List(cli::list::ListCmd),

    /// Query the status of a single VM.
    Status(cli::status::StatusCmd),

    /// Start a VM.
    Start(cli::start::StartCmd),

    /// Stop a VM, gracefully unless forced.
    Stop(cli::stop::StopCmd),

    /// Start a stopped VM or stop a running one.
    Toggle(cli::toggle::ToggleCmd),
}

fn main() {
    let cli = Cli::parse();

    // Initialize logging based on RUST_LOG or default to warn
    init_logging();

    tracing::debug!(version = qemuctl::VERSION, "starting qemuctl");

    let controller = Controller::new(ControllerConfig {
        qemu_bin: cli.qemu_bin,
        endpoint: cli.connect,
        ..Default::default()
    });

    // Execute command
    let result = match cli.command {
        Commands::List(cmd) => cmd.run(&controller),
        Commands::Status(cmd) => cmd.run(&controller),
        Commands::Start(cmd) => cmd.run(&controller),
        Commands::Stop(cmd) => cmd.run(&controller),
        Commands::Toggle(cmd) => cmd.run(&controller),
    };

    // Handle errors
    if let Err(e) = result {
        tracing::error!(error = %e, "command failed");
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

/// Initialize the tracing subscriber.
fn init_logging() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("qemuctl=warn"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

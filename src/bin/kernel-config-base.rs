use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use clap::Parser;
use kernel_config_base::telemetry::init_tracing;
use kernel_config_base::{
    KojiCli, Pipeline, PipelineOptions, PipelineOutcome, Settings, SystemRunner,
};
use tracing::Level;

/// Fetch Fedora's kernel config from Koji builds and official repositories,
/// verify it, and regenerate it as config-base for a kernel source tree.
#[derive(Parser)]
#[command(name = "kernel-config-base")]
#[command(version = env!("CARGO_PKG_VERSION"))]
struct Cli {
    /// Consider release-candidate builds
    #[arg(long)]
    include_rc: bool,

    /// Consider updates-testing builds and enable the updates-testing repo
    #[arg(long)]
    include_testing: bool,

    /// Kernel directory containing `version` and `linux-<version>.tar`
    #[arg(long)]
    kerneldir: PathBuf,

    /// Directory holding RPM-GPG-KEY-fedora-<N>-primary key files
    #[arg(long)]
    keysdir: PathBuf,

    /// Settings file (TOML)
    #[arg(long, env = "KERNEL_CONFIG_BASE_SETTINGS")]
    config: Option<PathBuf>,

    /// Package architecture
    #[arg(long)]
    arch: Option<String>,

    /// Koji hub URL
    #[arg(long)]
    koji_server: Option<String>,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Emit JSON-formatted log lines
    #[arg(long)]
    json: bool,
}

fn load_settings(cli: &Cli) -> Result<Settings> {
    let mut settings = match &cli.config {
        Some(path) => Settings::load(path)?,
        None => Settings::default(),
    };
    if let Some(arch) = &cli.arch {
        settings.arch = arch.clone();
    }
    if let Some(server) = &cli.koji_server {
        settings.koji_server = server.clone();
    }
    Ok(settings)
}

fn run(cli: &Cli) -> Result<PipelineOutcome> {
    let settings = load_settings(cli)?;
    let runner = SystemRunner;
    let koji = KojiCli::new(&runner, settings.koji_server.clone());

    let outcome = Pipeline::new(&koji, &runner, &settings).run(&PipelineOptions {
        kernel_dir: cli.kerneldir.clone(),
        keys_dir: cli.keysdir.clone(),
        include_rc: cli.include_rc,
        include_testing: cli.include_testing,
        check_host_tools: true,
    })?;
    Ok(outcome)
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.json, if cli.verbose { Level::DEBUG } else { Level::INFO });

    match run(&cli) {
        Ok(PipelineOutcome::NoUpdate) => {
            println!("No new kernel config found.");
            ExitCode::SUCCESS
        }
        Ok(PipelineOutcome::Written { package, path, .. }) => {
            println!("Wrote {} from {}.rpm", path.display(), package);
            ExitCode::SUCCESS
        }
        Err(err) => {
            eprintln!("Fatal error: {err:#}");
            ExitCode::from(1)
        }
    }
}

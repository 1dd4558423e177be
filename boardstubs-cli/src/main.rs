//! Boardstubs CLI - CircuitPython board stub generation from the command line.

mod steps;

use boardstubs::{generate, GenerateOptions, RunSummary};
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use std::process;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "boardstubs")]
#[command(about = "CircuitPython board stub generation tool", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate per-board stub files and the metadata index
    Generate {
        /// Root of the stub repository
        #[arg(long, value_name = "DIR", default_value = ".")]
        repo_root: PathBuf,

        /// Firmware checkout (defaults to <repo-root>/circuitpython)
        #[arg(long, value_name = "DIR")]
        firmware: Option<PathBuf>,

        /// Output directory (defaults to <repo-root>/boards)
        #[arg(short, long, value_name = "DIR")]
        out: Option<PathBuf>,

        /// Generic stub template (defaults to <repo-root>/stubs/board/__init__.pyi)
        #[arg(long, value_name = "FILE")]
        template: Option<PathBuf>,

        /// Manufacturer listing URL
        #[arg(long)]
        url: Option<String>,

        /// Skip the manufacturer fetch (no network access)
        #[arg(long)]
        offline: bool,

        /// Summary output format
        #[arg(short, long, value_enum, default_value = "human")]
        format: OutputFormat,
    },

    /// Run one environment setup step, or all ordered steps
    Run {
        /// Step name (see `steps`), or "all"
        #[arg(value_name = "STEP", default_value = "all")]
        step: String,

        /// Root of the stub repository
        #[arg(long, value_name = "DIR", default_value = ".")]
        repo_root: PathBuf,

        /// Firmware version tag to check out
        #[arg(long, default_value = steps::DEFAULT_FIRMWARE_VERSION)]
        firmware_version: String,

        /// Firmware repository URL
        #[arg(long, default_value = steps::DEFAULT_FIRMWARE_REPO_URL)]
        repo_url: String,

        /// Python interpreter used for the virtualenv
        #[arg(long, default_value = steps::DEFAULT_PYTHON)]
        python: String,
    },

    /// List environment setup steps in execution order
    Steps {
        /// Show step details
        #[arg(short, long)]
        verbose: bool,
    },
}

#[derive(Clone, ValueEnum)]
enum OutputFormat {
    /// Human-readable summary
    Human,
    /// JSON summary for CI/CD
    Json,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let exit_code = match cli.command {
        Commands::Generate {
            repo_root,
            firmware,
            out,
            template,
            url,
            offline,
            format,
        } => handle_generate(repo_root, firmware, out, template, url, offline, format),
        Commands::Run {
            step,
            repo_root,
            firmware_version,
            repo_url,
            python,
        } => handle_run(&step, repo_root, firmware_version, repo_url, python),
        Commands::Steps { verbose } => {
            handle_steps(verbose);
            0
        }
    };

    process::exit(exit_code);
}

#[allow(clippy::too_many_arguments)]
fn handle_generate(
    repo_root: PathBuf,
    firmware: Option<PathBuf>,
    out: Option<PathBuf>,
    template: Option<PathBuf>,
    url: Option<String>,
    offline: bool,
    format: OutputFormat,
) -> i32 {
    let mut options = GenerateOptions::new(repo_root);
    if let Some(firmware) = firmware {
        options.firmware_root = firmware;
    }
    if let Some(out) = out {
        options.out_dir = out;
    }
    if let Some(template) = template {
        options.stub_template = template;
    }
    if let Some(url) = url {
        options.listing_url = url;
    }
    options.offline = offline;

    match generate(&options) {
        Ok(summary) => {
            output_summary(&summary, &format);
            0
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            1
        }
    }
}

fn output_summary(summary: &RunSummary, format: &OutputFormat) {
    match format {
        OutputFormat::Human => {
            println!("Boards written: {}", summary.boards_written);
            println!("Boards skipped: {}", summary.boards_skipped);
            println!("VID:PID collisions: {}", summary.collisions);
            for record in &summary.records {
                println!("  {} {} -> {}", record.vid, record.pid, record.site_path);
            }
        }
        OutputFormat::Json => match serde_json::to_string_pretty(summary) {
            Ok(json) => println!("{}", json),
            Err(e) => eprintln!("Error: {}", e),
        },
    }
}

fn handle_run(
    step: &str,
    repo_root: PathBuf,
    firmware_version: String,
    repo_url: String,
    python: String,
) -> i32 {
    let config = steps::StepConfig {
        repo_root,
        firmware_version,
        firmware_repo_url: repo_url,
        python,
    };

    match steps::run_step(step, &config) {
        Ok(()) => 0,
        Err(e) => {
            eprintln!("Error: {}", e);
            1
        }
    }
}

fn handle_steps(verbose: bool) {
    println!("Environment steps, in execution order:\n");
    for step in steps::steps() {
        println!("  {}", step.name);
        if verbose {
            println!("    {}", step.about);
            if !step.in_all {
                println!("    (runs only when named directly)");
            }
        }
        println!();
    }
}

pub mod commands;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use propkit_core::config::{AppConfig, ConfigOverrides, LogFormat, LoggingConfig};
use tracing_subscriber::EnvFilter;

use crate::commands::{build::BuildArgs, ConfigSource};

#[derive(Debug, Parser)]
#[command(
    name = "propkit",
    about = "Proposal assembly and costing CLI",
    long_about = "Assemble professional-services proposals from drafted sections, cost their bill of quantities, and inspect readiness.",
    after_help = "Examples:\n  propkit build --input sections.json --offline\n  propkit build --kind short --customer \"Wayne Enterprises\" --input sections.json\n  propkit fx\n  propkit doctor --json"
)]
pub struct Cli {
    #[arg(long, global = true, value_name = "PATH", help = "Config file; must exist when given")]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    #[command(about = "Assemble a detailed or short proposal and write it to disk")]
    Build(BuildArgs),
    #[command(about = "Resolve the USD to INR billing rate the next build would use")]
    Fx {
        #[arg(long, help = "Skip the provider and report the fallback rate")]
        offline: bool,
    },
    #[command(about = "Spell a rupee amount in Indian-system words")]
    Words {
        #[arg(help = "Amount such as 629766 or ₹6,29,766.00")]
        amount: String,
    },
    #[command(
        about = "Inspect effective configuration values with source attribution and redaction"
    )]
    Config,
    #[command(about = "Validate config, engine tables, and exchange rate provider reachability")]
    Doctor {
        #[arg(long, help = "Emit machine-readable JSON output")]
        json: bool,
    },
}

pub fn run() -> ExitCode {
    let cli = Cli::parse();
    let source = ConfigSource { path: cli.config };

    // A broken config is reported by the command itself; logging still needs a level.
    let logging = source
        .load(ConfigOverrides::default())
        .map(|config| config.logging)
        .unwrap_or_else(|_| AppConfig::default().logging);
    init_logging(&logging);

    let result = match cli.command {
        Command::Build(args) => commands::build::run(args, &source),
        Command::Fx { offline } => commands::fx::run(offline, &source),
        Command::Words { amount } => commands::words::run(&amount),
        Command::Config => commands::config::run(&source),
        Command::Doctor { json } => commands::doctor::run(json, &source),
    };

    println!("{}", result.output);
    ExitCode::from(result.exit_code)
}

/// Logs go to stderr so stdout carries only the command outcome.
fn init_logging(logging: &LoggingConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(logging.level.as_str()));
    let builder = tracing_subscriber::fmt()
        .with_target(false)
        .with_env_filter(filter)
        .with_writer(std::io::stderr);

    let _ = match logging.format {
        LogFormat::Compact => builder.compact().try_init(),
        LogFormat::Pretty => builder.pretty().try_init(),
        LogFormat::Json => builder.json().try_init(),
    };
}

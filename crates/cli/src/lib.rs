pub mod commands;

use std::process::ExitCode;

use clap::{Parser, Subcommand};

use charterly_core::config::{AppConfig, LoadOptions, LogFormat};

#[derive(Debug, Parser)]
#[command(
    name = "charterly",
    about = "Charterly operator CLI",
    long_about = "Operate Charterly readiness checks, migrations, config inspection, and an \
                  end-to-end conversation smoke run.",
    after_help = "Examples:\n  charterly doctor --json\n  charterly config\n  charterly smoke"
)]
pub struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    #[command(about = "Apply pending database migrations and return structured status output")]
    Migrate,
    #[command(about = "Validate config, intent-provider readiness, and database connectivity")]
    Doctor {
        #[arg(long, help = "Emit machine-readable JSON output")]
        json: bool,
    },
    #[command(about = "Inspect effective configuration values with secrets redacted")]
    Config,
    #[command(
        about = "Drive a scripted conversation end-to-end through the orchestrator and workers"
    )]
    Smoke,
    #[command(about = "Delete conversation state older than the configured retention window")]
    Cleanup {
        #[arg(long, help = "Override the configured TTL in days")]
        days: Option<i64>,
    },
}

fn init_logging(config: &AppConfig) {
    use tracing::Level;

    let log_level = config.logging.level.parse::<Level>().unwrap_or(Level::INFO);

    let builder = tracing_subscriber::fmt().with_target(false).with_max_level(log_level);
    // Ignore double-init: tests and repeated invocations share a process.
    let result = match config.logging.format {
        LogFormat::Compact => builder.compact().try_init(),
        LogFormat::Pretty => builder.pretty().try_init(),
        LogFormat::Json => builder.json().try_init(),
    };
    let _ = result;
}

pub fn run() -> ExitCode {
    let cli = Cli::parse();

    if let Ok(config) = AppConfig::load(LoadOptions::default()) {
        init_logging(&config);
    }

    let result = match cli.command {
        Command::Migrate => commands::migrate::run(),
        Command::Doctor { json } => {
            commands::CommandResult { exit_code: 0, output: commands::doctor::run(json) }
        }
        Command::Config => {
            commands::CommandResult { exit_code: 0, output: commands::config::run() }
        }
        Command::Smoke => commands::smoke::run(),
        Command::Cleanup { days } => commands::cleanup::run(days),
    };

    println!("{}", result.output);
    ExitCode::from(result.exit_code)
}

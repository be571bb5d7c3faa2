pub mod commands;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Args, Parser, Subcommand};
use shopchat_core::config::{AppConfig, LoadOptions};

#[derive(Debug, Parser)]
#[command(
    name = "shopchat",
    about = "Shopchat operator CLI",
    long_about = "Ask the storefront assistant, inspect classification and answer adaptation, and \
                  operate migrations, configuration and readiness checks.",
    after_help = "Examples:\n  shopchat ask --message \"áo thun giá bao nhiêu\"\n  shopchat classify --message \"chào shop\"\n  shopchat doctor --json"
)]
pub struct Cli {
    #[arg(long, global = true, help = "Path to a shopchat.toml file")]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    #[command(about = "Run one customer message through the full chat pipeline")]
    Ask(AskArgs),
    #[command(about = "Show detected categories, intent and product signals for a message")]
    Classify {
        #[arg(long, help = "Customer message to classify")]
        message: String,
    },
    #[command(about = "Adapt a stored answer to a new customer question")]
    Adapt(AdaptArgs),
    #[command(about = "Apply pending database migrations and return structured status output")]
    Migrate,
    #[command(
        about = "Inspect effective configuration values with source attribution and redaction"
    )]
    Config,
    #[command(about = "Validate config, database connectivity and generative endpoint readiness")]
    Doctor {
        #[arg(long, help = "Emit machine-readable JSON output")]
        json: bool,
    },
}

#[derive(Debug, Clone, Args)]
pub struct AskArgs {
    #[arg(long, help = "Customer message")]
    pub message: String,
    #[arg(long, help = "Continue an existing conversation")]
    pub conversation_id: Option<String>,
    #[arg(long, help = "Slug of the product page the customer is viewing")]
    pub page_slug: Option<String>,
    #[arg(long, help = "Tenant whose catalog and Q&A are visible")]
    pub owner: Option<String>,
    #[arg(long, help = "Newline-delimited prior turns; overrides stored history")]
    pub history: Option<String>,
}

#[derive(Debug, Clone, Args)]
pub struct AdaptArgs {
    #[arg(long, help = "The customer's question")]
    pub question: String,
    #[arg(long, help = "Stored question the answer was written for")]
    pub example_question: String,
    #[arg(long, help = "Stored answer to adapt")]
    pub example_answer: String,
    #[arg(long, help = "Skip the generative rewrite and use rule-based adaptation only")]
    pub no_llm: bool,
}

/// Installs the stderr subscriber. Later calls are no-ops so tests can run commands repeatedly.
pub fn init_logging(config: &AppConfig) {
    use shopchat_core::config::LogFormat::*;
    use tracing::Level;

    let log_level = config.logging.level.parse::<Level>().unwrap_or(Level::INFO);
    let builder = tracing_subscriber::fmt()
        .with_target(false)
        .with_max_level(log_level)
        .with_writer(std::io::stderr);

    let _ = match config.logging.format {
        Compact => builder.compact().try_init(),
        Pretty => builder.pretty().try_init(),
        Json => builder.json().try_init(),
    };
}

pub fn run() -> ExitCode {
    let cli = Cli::parse();
    let options = LoadOptions {
        require_file: cli.config.is_some(),
        config_path: cli.config,
        ..LoadOptions::default()
    };
    if let Ok(config) = AppConfig::load(options.clone()) {
        init_logging(&config);
    }

    let result = match cli.command {
        Command::Ask(args) => commands::ask::run(&args, options),
        Command::Classify { message } => commands::classify::run(&message),
        Command::Adapt(args) => commands::adapt::run(&args, options),
        Command::Migrate => commands::migrate::run(options),
        Command::Config => {
            commands::CommandResult { exit_code: 0, output: commands::config::run(options) }
        }
        Command::Doctor { json } => commands::doctor::run(json, options),
    };

    println!("{}", result.output);
    ExitCode::from(result.exit_code)
}

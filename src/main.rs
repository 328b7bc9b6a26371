use std::path::PathBuf;

use anyhow::Result;
use clap::{Args, Parser, Subcommand};

use llm_locale_sync::logging::{self, LogFormat};
use llm_locale_sync::settings::parse_locale_list;
use llm_locale_sync::{Config, Overrides};

#[derive(Parser, Debug)]
#[command(
    name = "llm-locale-sync",
    version,
    about = "Keep locale files in sync with extracted UI strings using an LLM"
)]
struct Cli {
    /// Enable debug logging
    #[arg(short = 'v', long = "verbose", global = true)]
    verbose: bool,

    /// Log output format (text or json)
    #[arg(long = "log-format", global = true, default_value = "text")]
    log_format: LogFormat,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Translate missing keys and write the locale files
    Sync(ConfigArgs),
    /// Show translated and missing key counts per locale
    Status(ConfigArgs),
    /// Print the resolved configuration
    ShowConfig(ConfigArgs),
}

#[derive(Args, Debug, Clone)]
struct ConfigArgs {
    /// Comma-separated target locales (e.g. pidgin,fr)
    #[arg(long = "locales")]
    locales: Option<String>,

    /// Messages per backend request
    #[arg(long = "batch-size")]
    batch_size: Option<usize>,

    /// Attempts per batch before the locale fails
    #[arg(long = "max-retries")]
    max_retries: Option<u32>,

    /// Model name or provider:model (e.g. openai:gpt-4o-mini)
    #[arg(short = 'm', long = "model")]
    model: Option<String>,

    /// API key (overrides environment variables)
    #[arg(short = 'k', long = "key")]
    key: Option<String>,

    /// Path to the extracted messages JSON
    #[arg(long = "messages")]
    messages: Option<PathBuf>,

    /// Directory holding <locale>.json files
    #[arg(long = "locales-dir")]
    locales_dir: Option<PathBuf>,

    /// Read extra settings from a local TOML file
    #[arg(short = 'r', long = "read-settings")]
    read_settings: Option<String>,
}

impl From<ConfigArgs> for Config {
    fn from(args: ConfigArgs) -> Self {
        Config {
            overrides: Overrides {
                locales: args.locales.as_deref().map(parse_locale_list),
                batch_size: args.batch_size,
                max_retries: args.max_retries,
                model: args.model,
                messages_path: args.messages,
                locales_dir: args.locales_dir,
            },
            key: args.key,
            settings_path: args.read_settings,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    logging::init(cli.verbose, cli.log_format)?;

    let output = match cli.command {
        Command::Sync(args) => llm_locale_sync::run_sync(args.into()).await?,
        Command::Status(args) => llm_locale_sync::run_status(args.into())?,
        Command::ShowConfig(args) => llm_locale_sync::show_config(args.into())?,
    };

    if !output.is_empty() {
        println!("{}", output);
    }
    Ok(())
}

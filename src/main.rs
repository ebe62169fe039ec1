// Module-specific lints configuration
#![allow(clippy::uninlined_format_args)]

use anyhow::{Context, Result, anyhow};
use clap::{CommandFactory, Parser, Subcommand, ValueEnum};
use clap_complete::{Shell, generate};
use log::{Level, LevelFilter, Log, Metadata, Record, SetLoggerError, warn};
use std::fs::File;
use std::io::{BufReader, Write};
use std::path::{Path, PathBuf};

use crate::app_config::{Config, TranslationProvider};
use app_controller::Controller;

mod app_config;
mod app_controller;
mod csv_processor;
mod errors;
mod file_utils;
mod language_utils;
mod progress;
mod providers;
mod storage;
mod translation;

/// CLI wrapper for TranslationProvider to implement ValueEnum
#[derive(Debug, Clone, ValueEnum)]
enum CliTranslationProvider {
    #[value(name = "deepseek")]
    DeepSeek,
    #[value(name = "openai")]
    OpenAI,
}

impl From<CliTranslationProvider> for TranslationProvider {
    fn from(cli_provider: CliTranslationProvider) -> Self {
        match cli_provider {
            CliTranslationProvider::DeepSeek => TranslationProvider::DeepSeek,
            CliTranslationProvider::OpenAI => TranslationProvider::OpenAI,
        }
    }
}

/// CLI wrapper for LogLevel to implement ValueEnum
#[derive(Debug, Clone, ValueEnum)]
enum CliLogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<CliLogLevel> for app_config::LogLevel {
    fn from(cli_level: CliLogLevel) -> Self {
        match cli_level {
            CliLogLevel::Error => app_config::LogLevel::Error,
            CliLogLevel::Warn => app_config::LogLevel::Warn,
            CliLogLevel::Info => app_config::LogLevel::Info,
            CliLogLevel::Debug => app_config::LogLevel::Debug,
            CliLogLevel::Trace => app_config::LogLevel::Trace,
        }
    }
}

fn level_filter(level: &app_config::LogLevel) -> LevelFilter {
    match level {
        app_config::LogLevel::Error => LevelFilter::Error,
        app_config::LogLevel::Warn => LevelFilter::Warn,
        app_config::LogLevel::Info => LevelFilter::Info,
        app_config::LogLevel::Debug => LevelFilter::Debug,
        app_config::LogLevel::Trace => LevelFilter::Trace,
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Translate CSV feed files (default command)
    Translate(TranslateArgs),

    /// Estimate translation cost without translating
    Estimate {
        /// Input CSV file or directory
        #[arg(value_name = "INPUT_PATH")]
        input_path: PathBuf,

        /// Configuration file path
        #[arg(short, long, default_value = "conf.json")]
        config_path: String,
    },

    /// List recent saved translations
    History,

    /// Generate shell completions for feedtrans
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Parser, Debug)]
struct TranslateArgs {
    /// Input CSV file or directory to process
    #[arg(value_name = "INPUT_PATH")]
    input_path: PathBuf,

    /// Output directory for translated files (defaults to the input's directory)
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    /// Translation provider to use
    #[arg(short, long, value_enum)]
    provider: Option<CliTranslationProvider>,

    /// Model name to use for translation
    #[arg(short, long)]
    model: Option<String>,

    /// Target language code (e.g., 'fr', 'de', 'es')
    #[arg(short, long)]
    target_language: Option<String>,

    /// Test mode: only translate the first N source lines per file
    #[arg(long, value_name = "N")]
    test_lines: Option<usize>,

    /// Configuration file path
    #[arg(short, long, default_value = "conf.json")]
    config_path: String,

    /// Set logging level
    #[arg(short, long, value_enum)]
    log_level: Option<CliLogLevel>,
}

/// feedtrans - CSV product-feed translation with AI
///
/// Translates a designated text column of CSV product feeds using LLM
/// providers (DeepSeek, OpenAI), preserving HTML markup and handle slugs.
#[derive(Parser, Debug)]
#[command(name = "feedtrans")]
#[command(version = "1.0.0")]
#[command(about = "AI-powered CSV product-feed translation tool")]
#[command(long_about = "feedtrans translates a designated text column of CSV product feeds using
LLM chat-completion providers, preserving row structure, HTML markup and
handle-style slugs.

EXAMPLES:
    feedtrans products.csv -t fr                # Translate to French
    feedtrans feeds/ -t de -o out/              # Translate a whole directory
    feedtrans -p openai -m gpt-4o-mini feed.csv # Use a specific provider and model
    feedtrans --test-lines 10 feed.csv -t es    # Quick test on the first 10 lines
    feedtrans estimate feeds/                   # Cost estimate, no translation
    feedtrans history                           # Recent saved translations
    feedtrans completions bash                  # Generate bash completions

CONFIGURATION:
    Configuration is stored in conf.json by default. If the config file does
    not exist, a default one is created automatically. API keys come from the
    config file or from DEEPSEEK_API_KEY / OPENAI_API_KEY.

SUPPORTED PROVIDERS:
    deepseek - DeepSeek API (default: deepseek-chat)
    openai   - OpenAI API (default: gpt-4o-mini)")]
struct CommandLineOptions {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Input CSV file or directory to process
    #[arg(value_name = "INPUT_PATH")]
    input_path: Option<PathBuf>,

    /// Output directory for translated files
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    /// Translation provider to use
    #[arg(short, long, value_enum)]
    provider: Option<CliTranslationProvider>,

    /// Model name to use for translation
    #[arg(short, long)]
    model: Option<String>,

    /// Target language code (e.g., 'fr', 'de', 'es')
    #[arg(short, long)]
    target_language: Option<String>,

    /// Test mode: only translate the first N source lines per file
    #[arg(long, value_name = "N")]
    test_lines: Option<usize>,

    /// Configuration file path
    #[arg(short, long, default_value = "conf.json")]
    config_path: String,

    /// Set logging level
    #[arg(short, long, value_enum)]
    log_level: Option<CliLogLevel>,
}

/// Custom logger implementation: timestamped, colored, to stderr
struct CustomLogger {
    level: LevelFilter,
}

impl CustomLogger {
    fn new(level: LevelFilter) -> Self {
        CustomLogger { level }
    }

    fn init(level: LevelFilter) -> Result<(), SetLoggerError> {
        let logger = Box::new(CustomLogger::new(level));
        log::set_boxed_logger(logger)?;
        log::set_max_level(level);
        Ok(())
    }

    fn color_for_level(level: Level) -> &'static str {
        match level {
            Level::Error => "\x1B[1;31m",
            Level::Warn => "\x1B[1;33m",
            Level::Info => "\x1B[1;32m",
            Level::Debug => "\x1B[1;36m",
            Level::Trace => "\x1B[1;35m",
        }
    }
}

impl Log for CustomLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.level
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            let now = chrono::Local::now().format("%H:%M:%S%.3f");
            let color = Self::color_for_level(record.level());
            let mut stderr = std::io::stderr();
            let _ = writeln!(stderr, "{}{} {}\x1B[0m", color, now, record.args());
        }
    }

    fn flush(&self) {
        let _ = std::io::stderr().flush();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize the logger once with info level by default; the level is
    // updated after the config is loaded
    CustomLogger::init(LevelFilter::Info)?;

    let cli = CommandLineOptions::parse();

    match cli.command {
        Some(Commands::Completions { shell }) => {
            let mut cmd = CommandLineOptions::command();
            generate(shell, &mut cmd, "feedtrans", &mut std::io::stdout());
            Ok(())
        }
        Some(Commands::History) => {
            let controller = Controller::with_config(Config::default())?;
            controller.show_history()
        }
        Some(Commands::Estimate { input_path, config_path }) => {
            let config = load_config(&config_path, None, None, None)?;
            let controller = Controller::with_config(config)?;
            let report = controller.estimate(&input_path)?;
            println!(
                "{} file(s), {} lines, {} chars\n~{} input tokens, ~{} output tokens\nEstimated cost: ${:.4}\nEstimated time: {} min",
                report.total_files,
                report.total_lines,
                report.total_chars,
                report.estimated_input_tokens,
                report.estimated_output_tokens,
                report.estimated_cost,
                report.estimated_minutes
            );
            Ok(())
        }
        Some(Commands::Translate(args)) => run_translate(args).await,
        None => {
            // Default behavior - use top-level args
            let input_path = cli
                .input_path
                .ok_or_else(|| anyhow!("INPUT_PATH is required when no subcommand is specified"))?;

            let translate_args = TranslateArgs {
                input_path,
                output_dir: cli.output_dir,
                provider: cli.provider,
                model: cli.model,
                target_language: cli.target_language,
                test_lines: cli.test_lines,
                config_path: cli.config_path,
                log_level: cli.log_level,
            };
            run_translate(translate_args).await
        }
    }
}

/// Load the configuration file (creating a default one if missing) and
/// layer CLI overrides on top
fn load_config(
    config_path: &str,
    provider: Option<CliTranslationProvider>,
    model: Option<String>,
    target_language: Option<String>,
) -> Result<Config> {
    let mut config = if Path::new(config_path).exists() {
        let file = File::open(config_path)
            .context(format!("Failed to open config file: {}", config_path))?;
        let reader = BufReader::new(file);
        serde_json::from_reader(reader)
            .context(format!("Failed to parse config file: {}", config_path))?
    } else {
        warn!("Config file not found at '{}', creating default config.", config_path);
        let config = Config::default();
        let config_json = serde_json::to_string_pretty(&config)
            .context("Failed to serialize default config to JSON")?;
        std::fs::write(config_path, config_json)
            .context(format!("Failed to write default config to file: {}", config_path))?;
        config
    };

    if let Some(provider) = provider {
        config.translation.provider = provider.into();
    }

    if let Some(model) = model {
        let provider_str = config.translation.provider.to_lowercase_string();
        if let Some(provider_config) = config
            .translation
            .available_providers
            .iter_mut()
            .find(|p| p.provider_type == provider_str)
        {
            provider_config.model = model;
        }
    }

    if let Some(target_language) = target_language {
        config.target_language = target_language;
    }

    Ok(config)
}

async fn run_translate(options: TranslateArgs) -> Result<()> {
    if let Some(cmd_log_level) = &options.log_level {
        let config_log_level: app_config::LogLevel = cmd_log_level.clone().into();
        log::set_max_level(level_filter(&config_log_level));
    }

    let mut config = load_config(
        &options.config_path,
        options.provider,
        options.model,
        options.target_language,
    )?;

    if let Some(log_level) = &options.log_level {
        config.log_level = log_level.clone().into();
    } else {
        log::set_max_level(level_filter(&config.log_level));
    }

    config.validate().context("Configuration validation failed")?;

    let output_dir = match &options.output_dir {
        Some(dir) => dir.clone(),
        None => {
            if options.input_path.is_dir() {
                options.input_path.clone()
            } else {
                options
                    .input_path
                    .parent()
                    .map(|p| p.to_path_buf())
                    .unwrap_or_else(|| PathBuf::from("."))
            }
        }
    };

    let controller = Controller::with_config(config)?;
    controller.run(options.input_path, output_dir, options.test_lines).await
}

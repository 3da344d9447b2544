use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;
use tokio::runtime::Runtime;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use scriptgenius::ai::provider::{ModelParams, ProviderKind};
use scriptgenius::cli::CommandContext;
use scriptgenius::{AnalysisRequest, ScriptContext};

/// Parse provider from string
fn parse_provider(s: &str) -> Result<ProviderKind, String> {
    s.parse::<ProviderKind>()
        .map_err(|_| format!("Invalid provider '{}'. Valid values: openai, anthropic, google", s))
}

#[derive(Parser)]
#[command(name = "scriptgenius")]
#[command(version, about = "AI-assisted screenplay analysis and coverage reports")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    #[arg(long, short, global = true, help = "Config file (defaults to global + ./scriptgenius.toml)")]
    config: Option<PathBuf>,

    #[arg(long, global = true)]
    verbose: bool,

    #[arg(long, short, global = true)]
    quiet: bool,
}

/// Report selection shared by `analyze` and `prompt`
#[derive(clap::Args)]
struct ReportArgs {
    #[arg(help = "Script file, or - for stdin")]
    file: PathBuf,
    #[arg(short = 'r', long = "report", help = "Report type (see `templates`)")]
    report_type: Option<String>,
    #[arg(short = 'p', long, help = "Reader persona (see `templates`)")]
    persona: Option<String>,
    #[arg(long, help = "Script title")]
    title: Option<String>,
    #[arg(long, help = "Script genre")]
    genre: Option<String>,
    #[arg(short = 'f', long, default_value = "text", help = "Output format: text, json")]
    format: String,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate an analysis report for a script
    Analyze {
        #[command(flatten)]
        report: ReportArgs,
        #[arg(long, value_parser = parse_provider, help = "LLM provider (openai, anthropic, google)")]
        provider: Option<ProviderKind>,
        #[arg(long, help = "Model to use")]
        model: Option<String>,
        #[arg(long, help = "Sampling temperature (0.0-2.0)")]
        temperature: Option<f32>,
        #[arg(long, help = "Maximum tokens to generate per part")]
        max_tokens: Option<u32>,
        #[arg(long, help = "Request timeout in milliseconds")]
        timeout_ms: Option<u64>,
        #[arg(long, help = "Print the report as it is generated")]
        stream: bool,
        #[arg(short = 'o', long, help = "Also write the report to a file")]
        output: Option<PathBuf>,
    },

    /// Show the prompts an analysis would send (dry run)
    Prompt {
        #[command(flatten)]
        report: ReportArgs,
    },

    /// Show scenes, characters and size of a script
    Outline {
        #[arg(help = "Script file, or - for stdin")]
        file: PathBuf,
        #[arg(short = 'f', long, default_value = "text", help = "Output format: text, json")]
        format: String,
    },

    /// Preview how a script is split into parts
    Chunk {
        #[arg(help = "Script file, or - for stdin")]
        file: PathBuf,
        #[arg(long, help = "Token budget per part")]
        max_chunk_size: Option<usize>,
        #[arg(long, help = "Tokens carried over between parts")]
        overlap: Option<usize>,
        #[arg(short = 'f', long, default_value = "text", help = "Output format: text, json")]
        format: String,
    },

    /// List report types and personas
    Templates {
        #[arg(short = 'f', long, default_value = "text", help = "Output format: text, json")]
        format: String,
    },

    /// Show provider availability
    Providers {
        #[arg(short = 'f', long, default_value = "text", help = "Output format: text, json")]
        format: String,
    },

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Show current configuration (merged from all sources)
    Show {
        #[arg(short = 'g', long, help = "Show global config file only")]
        global: bool,
        #[arg(short = 'f', long, default_value = "text", help = "Output format: text, json")]
        format: String,
    },
    /// Show configuration file paths
    Path,
    /// Initialize configuration
    Init {
        #[arg(long, short, help = "Initialize global config")]
        global: bool,
        #[arg(long, help = "Overwrite existing config")]
        force: bool,
    },
}

impl ReportArgs {
    fn request(&self, ctx: &CommandContext) -> AnalysisRequest {
        let defaults = &ctx.config.analysis;
        let mut context = ScriptContext::new();
        if let Some(title) = &self.title {
            context = context.with_title(title);
        }
        if let Some(genre) = &self.genre {
            context = context.with_genre(genre);
        }

        AnalysisRequest::new(String::new())
            .with_report_type(
                self.report_type
                    .clone()
                    .unwrap_or_else(|| defaults.report_type.clone()),
            )
            .with_persona(
                self.persona
                    .clone()
                    .unwrap_or_else(|| defaults.persona.clone()),
            )
            .with_context(context)
    }
}

/// Set up panic handler for graceful error reporting
fn setup_panic_handler() {
    let default_hook = std::panic::take_hook();

    std::panic::set_hook(Box::new(move |panic_info| {
        let message = if let Some(s) = panic_info.payload().downcast_ref::<&str>() {
            s.to_string()
        } else if let Some(s) = panic_info.payload().downcast_ref::<String>() {
            s.clone()
        } else {
            "Unknown panic".to_string()
        };

        eprintln!("\n\x1b[1;31m━━━ PANIC ━━━\x1b[0m");
        eprintln!("\x1b[31mScriptGenius encountered an unexpected error:\x1b[0m");
        eprintln!("  {}", message);

        if let Some(location) = panic_info.location() {
            eprintln!(
                "\x1b[90mLocation: {}:{}:{}\x1b[0m",
                location.file(),
                location.line(),
                location.column()
            );
        }
        eprintln!();

        // Call default hook for backtrace (if RUST_BACKTRACE=1)
        default_hook(panic_info);
    }));
}

fn main() -> ExitCode {
    setup_panic_handler();

    match run_cli() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("\x1b[31mError:\x1b[0m {}", e);
            ExitCode::FAILURE
        }
    }
}

fn run_cli() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet {
        "error"
    } else {
        "info"
    };

    // Logs go to stderr so report text on stdout stays pipeable
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    use scriptgenius::cli::commands;

    match cli.command {
        Commands::Analyze {
            report,
            provider,
            model,
            temperature,
            max_tokens,
            timeout_ms,
            stream,
            output,
        } => {
            let ctx = CommandContext::load(cli.config.as_deref())?;
            let request = report
                .request(&ctx)
                .with_provider(provider)
                .with_params(ModelParams {
                    model,
                    temperature,
                    max_tokens,
                    ..Default::default()
                })
                .with_timeout(timeout_ms.map(Duration::from_millis));
            let delivery = commands::analyze::AnalyzeOutput {
                stream,
                format: report.format.clone(),
                output,
            };

            let rt = Runtime::new()?;
            rt.block_on(commands::analyze::run(&ctx, &report.file, request, delivery))?;
        }
        Commands::Prompt { report } => {
            let ctx = CommandContext::load(cli.config.as_deref())?;
            let request = report.request(&ctx);
            commands::prompt::run(&ctx, &report.file, request, &report.format)?;
        }
        Commands::Outline { file, format } => {
            commands::outline::run(&file, &format)?;
        }
        Commands::Chunk {
            file,
            max_chunk_size,
            overlap,
            format,
        } => {
            let ctx = CommandContext::load(cli.config.as_deref())?;
            commands::chunk::run(&ctx, &file, max_chunk_size, overlap, &format)?;
        }
        Commands::Templates { format } => {
            commands::templates::run(&format)?;
        }
        Commands::Providers { format } => {
            let ctx = CommandContext::load(cli.config.as_deref())?;
            commands::providers::run(&ctx, &format)?;
        }
        Commands::Config { action } => match action {
            ConfigAction::Show { global, format } => {
                let ctx = CommandContext::load(cli.config.as_deref())?;
                commands::config::show(&ctx, global, &format)?;
            }
            ConfigAction::Path => {
                commands::config::path()?;
            }
            ConfigAction::Init { global, force } => {
                commands::config::init(global, force)?;
            }
        },
    }

    Ok(())
}

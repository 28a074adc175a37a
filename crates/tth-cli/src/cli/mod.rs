//! CLI entry and dispatch.

use std::num::NonZeroUsize;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::prelude::*;
use tth_core::config;
use tth_core::core::interrupt;

mod commands;

#[derive(Parser)]
#[command(name = "tth")]
#[command(version)]
#[command(about = "Streaming text-to-HTML transcoder for language model output")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Subcommand)]
enum Commands {
    /// Convert text (or a JSON Lines transcript) to HTML markup
    Render {
        /// Input file (default: stdin)
        #[arg(value_name = "FILE")]
        file: Option<PathBuf>,

        /// Feed the input in fragments of N characters
        #[arg(long, value_name = "N")]
        chunk_size: Option<NonZeroUsize>,

        /// Treat input as JSON Lines records of {"kind", "content"}
        #[arg(long)]
        transcript: bool,

        /// Wrap the output in a standalone HTML page
        #[arg(long)]
        page: bool,

        #[command(flatten)]
        style: StyleArgs,

        /// List bundled highlighting themes and exit
        #[arg(long)]
        list_themes: bool,
    },

    /// Ask an Ollama model and stream the conversation as HTML
    Ask {
        /// Prompt to send; repeat to run several in order (default: config questions)
        #[arg(short, long = "prompt", value_name = "PROMPT")]
        prompts: Vec<String>,

        /// Override the model from config
        #[arg(short, long)]
        model: Option<String>,

        /// Wait for each complete answer instead of streaming
        #[arg(long)]
        no_stream: bool,

        /// Wrap the output in a standalone HTML page
        #[arg(long)]
        page: bool,

        #[command(flatten)]
        style: StyleArgs,
    },

    /// Manage configuration
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

/// Highlighting overrides shared by rendering commands.
#[derive(clap::Args, Debug, Clone, Default)]
struct StyleArgs {
    /// Render code blocks as escaped plain text
    #[arg(long)]
    no_highlight: bool,

    /// Override the highlighting theme from config
    #[arg(long, value_name = "NAME")]
    theme: Option<String>,
}

impl StyleArgs {
    fn apply(&self, render: &mut config::RenderConfig) {
        if self.no_highlight {
            render.highlight = false;
        }
        if let Some(theme) = &self.theme {
            render.theme.clone_from(theme);
        }
    }
}

#[derive(clap::Subcommand)]
enum ConfigCommands {
    /// Show the path to the config file
    Path,
    /// Initialize a default config file (if not present)
    Init,
    /// Print a fresh config generated from defaults
    Generate,
}

/// Installs the stderr log subscriber (`RUST_LOG`, default `warn`).
fn init_logging() {
    let default_level = "warn";
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_level))
        .unwrap_or_else(|_| EnvFilter::new(default_level));

    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_filter(env_filter);

    let _ = tracing_subscriber::registry().with(fmt_layer).try_init();
}

pub fn run() -> Result<()> {
    let cli = Cli::parse();

    init_logging();
    interrupt::init()?;

    let rt = tokio::runtime::Runtime::new().context("create tokio runtime")?;

    rt.block_on(async move { dispatch(cli).await })
}

async fn dispatch(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Render {
            file,
            chunk_size,
            transcript,
            page,
            style,
            list_themes,
        } => {
            if list_themes {
                commands::render::list_themes();
                return Ok(());
            }
            let mut config = config::Config::load().context("load config")?;
            style.apply(&mut config.render);
            commands::render::run(&commands::render::RenderOptions {
                file: file.as_deref(),
                chunk_size: chunk_size.map(NonZeroUsize::get),
                transcript,
                page,
                render: &config.render,
            })
        }

        Commands::Ask {
            prompts,
            model,
            no_stream,
            page,
            style,
        } => {
            let mut config = config::Config::load().context("load config")?;
            style.apply(&mut config.render);
            commands::ask::run(commands::ask::AskOptions {
                prompts,
                config: &config,
                model_override: model.as_deref(),
                stream: !no_stream,
                page,
            })
            .await
        }

        Commands::Config { command } => match command {
            ConfigCommands::Path => commands::config::path(),
            ConfigCommands::Init => commands::config::init(),
            ConfigCommands::Generate => commands::config::generate(),
        },
    }
}

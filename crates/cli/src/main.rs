//! AskPaper CLI: the main entry point.
//!
//! Commands:
//! - `ask`      Answer a question about a paper
//! - `sections` List the section labels of a paper
//! - `render`   Print the text the model would read
//! - `doctor`   Diagnose system health
//! - `config`   Show, validate or locate the configuration

use std::path::PathBuf;

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(
    name = "askpaper",
    about = "AskPaper: question answering over scientific papers",
    version,
    author
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    json_logs: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Answer a question about a paper
    Ask {
        /// Paper in doc2json format
        #[arg(short, long)]
        paper: PathBuf,

        /// The question to answer
        #[arg(short, long)]
        question: String,

        /// 0 reads the whole paper; higher levels pre-select fewer sections
        #[arg(short, long, default_value_t = 0)]
        trade_off: usize,

        /// Join chunk answers instead of merging them with the model
        #[arg(long)]
        no_fuse: bool,
    },

    /// List the distinct section labels of a paper
    Sections {
        #[arg(short, long)]
        paper: PathBuf,
    },

    /// Print the rendered paper text
    Render {
        #[arg(short, long)]
        paper: PathBuf,

        /// Keep only sections whose label contains this fragment
        #[arg(long)]
        include: Vec<String>,

        /// Drop sections whose label contains this fragment
        #[arg(long)]
        exclude: Vec<String>,
    },

    /// Diagnose system health
    Doctor,

    /// Configuration management
    Config {
        #[command(subcommand)]
        action: Option<ConfigAction>,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Print the effective configuration, secrets redacted
    Show,
    /// Validate the configuration file
    Validate,
    /// Print the configuration file path
    Path,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize tracing
    let filter = if cli.verbose { "debug" } else { "info" };
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter));
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_writer(std::io::stderr);
    if cli.json_logs {
        subscriber.json().init();
    } else {
        subscriber.init();
    }

    match cli.command {
        Commands::Ask {
            paper,
            question,
            trade_off,
            no_fuse,
        } => commands::ask::run(&paper, &question, trade_off, !no_fuse).await?,
        Commands::Sections { paper } => commands::sections::run(&paper)?,
        Commands::Render {
            paper,
            include,
            exclude,
        } => commands::render::run(&paper, &include, &exclude)?,
        Commands::Doctor => commands::doctor::run().await?,
        Commands::Config { action } => match action.unwrap_or(ConfigAction::Show) {
            ConfigAction::Show => commands::config_cmd::show()?,
            ConfigAction::Validate => commands::config_cmd::validate()?,
            ConfigAction::Path => commands::config_cmd::path()?,
        },
    }

    Ok(())
}

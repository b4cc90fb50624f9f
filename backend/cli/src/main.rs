mod chat_cmd;
mod config;
mod config_cmd;
mod history_cmd;
mod page_cmd;
mod terminal_output;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing::info;

use studybuddy_core::{ChatEndpoint, ConversationStore};
use studybuddy_logging::init_logger;
use studybuddy_memory::SqliteStore;
use studybuddy_providers::HttpChatEndpoint;

use chat_cmd::AskArgs;
use config::Settings;
use page_cmd::PageArgs;

#[derive(Parser)]
#[command(name = "studybuddy")]
#[command(about = "StudyBuddy: ask questions about the page you are reading")]
#[command(version)]
struct Cli {
    /// Config file (defaults to ~/.studybuddy/config.yaml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the readable text extracted from an HTML page
    Extract(PageArgs),
    /// List question-like sentences found on an HTML page
    Questions(PageArgs),
    /// Open the assistant on an HTML page and send one message
    Ask(AskArgs),
    /// Show stored conversation turns for a page title
    History {
        /// Page title the turns were recorded under
        title: String,

        /// Number of most recent turns to show
        #[arg(short, long, default_value_t = 10)]
        limit: usize,
    },
    /// Queue "Explain this: <selection>" for the next `ask`
    Explain {
        /// Selected text to explain
        selection: String,
    },
    /// Show the effective configuration
    Config {
        /// Write it to the config file
        #[arg(long)]
        write: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let settings = Settings::load(cli.config.as_deref()).await?;
    init_logger(&settings.log_options());

    match cli.command {
        Commands::Extract(args) => page_cmd::run_extract(&args, settings.extraction_limits()).await,
        Commands::Questions(args) => {
            page_cmd::run_questions(&args, settings.extraction_limits()).await
        }
        Commands::Ask(args) => {
            let store = open_store(&settings)?;
            let endpoint: Arc<dyn ChatEndpoint> = Arc::new(HttpChatEndpoint::new(settings.api_url()));
            chat_cmd::run_ask(
                &args,
                store,
                endpoint,
                settings.extraction_limits(),
                settings.activation_settings(),
            )
            .await
        }
        Commands::History { title, limit } => {
            let store = open_store(&settings)?;
            history_cmd::run(store.as_ref(), &title, limit).await
        }
        Commands::Explain { selection } => {
            let store = open_store(&settings)?;
            chat_cmd::run_explain(store.as_ref(), &selection).await
        }
        Commands::Config { write } => config_cmd::run(&settings, write).await,
    }
}

fn open_store(settings: &Settings) -> Result<Arc<dyn ConversationStore>> {
    let path = settings.store_path();
    info!(path = %path.display(), "Opening conversation store");
    let store = SqliteStore::open(&path)?.with_capacity(settings.store_capacity());
    Ok(Arc::new(store))
}

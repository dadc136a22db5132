use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use dotenv::dotenv;
use log::info;
use std::io;

use wiki_rag_panels::client::PanelClient;
use wiki_rag_panels::config::PanelsConfig;
use wiki_rag_panels::console::ConsoleNotifier;
use wiki_rag_panels::document_browser::DocumentBrowser;
use wiki_rag_panels::rag_panel::RagPanel;
use wiki_rag_panels::shell::{run_pages_shell, run_rag_shell};

/// Terminal front end for the Wikipedia RAG web application
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Origin of the web application (overrides PANELS_SERVER_URL)
    #[arg(long)]
    server: Option<String>,

    #[command(subcommand)]
    panel: Panel,
}

#[derive(Subcommand, Debug)]
enum Panel {
    /// Configure retrieval, load the index and ask questions
    Rag,
    /// Browse and download the scraped Wikipedia pages
    Pages,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize environment
    dotenv().ok();
    env_logger::init();

    let args = Args::parse();

    let mut config = PanelsConfig::from_env().context("Invalid panel configuration")?;
    if let Some(server) = args.server {
        config = config.with_server_url(server);
    }
    info!("Using server {}", config.server_url);

    let client = PanelClient::new(&config).context("Failed to build HTTP client")?;

    let stdin = io::stdin();
    let stdout = io::stdout();

    match args.panel {
        Panel::Rag => {
            let panel = RagPanel::new(client, config.rag_base_path, ConsoleNotifier);
            run_rag_shell(&panel, stdin.lock(), stdout.lock())
                .await
                .context("Error in RAG panel")?;
        }
        Panel::Pages => {
            let browser = DocumentBrowser::new(client, config.pages_base_path);
            run_pages_shell(&browser, stdin.lock(), stdout.lock())
                .await
                .context("Error in document browser")?;
        }
    }

    Ok(())
}

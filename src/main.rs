use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use archchat_core::config::{Overrides, API_URL_ENV};
use archchat_core::{
    AddressClient, Config, DocumentClient, Environment, ResolvedConfig, SearchPhase, SearchView,
};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod app;
mod handler;
mod tui;
mod ui;

use app::App;

#[derive(Parser)]
#[command(name = "archchat")]
#[command(about = "Look up an address and preview the generated presentation")]
struct Cli {
    /// Base URL of the search backend (overrides the config file)
    #[arg(long, env = API_URL_ENV)]
    api_url: Option<String>,

    /// Deployment environment: development or production
    #[arg(long = "env", value_parser = parse_environment)]
    environment: Option<Environment>,

    /// Where downloaded documents are saved
    #[arg(long)]
    download_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a single address search and print the result
    Search {
        /// Address to look up
        address: String,
    },
    /// Write the resolved settings to the config file
    Config,
    /// Render a JSON document as a PDF through the backend
    Pdf {
        /// JSON file with the data to render
        data: PathBuf,
        /// Output file (defaults to the download directory)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Save a file the backend serves under /download/
    Fetch {
        /// Name of the generated file
        file_name: String,
    },
}

fn parse_environment(s: &str) -> Result<Environment, String> {
    s.parse().map_err(|err: anyhow::Error| err.to_string())
}

const GENERATED_PDF_FILENAME: &str = "generated.pdf";

const DEFAULT_LOG_FILTER: &str = "archchat=info,archchat_core=info";

/// TUI mode logs to a file so the screen stays clean; the one-shot search
/// logs to stderr.
fn init_logging(to_file: bool) -> Result<Option<tracing_appender::non_blocking::WorkerGuard>> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));

    if !to_file {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
        return Ok(None);
    }

    let log_dir = Config::get_config_dir()?;
    std::fs::create_dir_all(&log_dir)
        .with_context(|| format!("cannot create {}", log_dir.display()))?;
    let file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_dir.join("archchat.log"))?;

    let (non_blocking, guard) = tracing_appender::non_blocking(file);
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(non_blocking)
        .with_ansi(false)
        .init();

    Ok(Some(guard))
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let _log_guard = init_logging(cli.command.is_none())?;

    let config = Config::load().unwrap_or_else(|err| {
        tracing::warn!(error = %err, "could not read config, using defaults");
        Config::new()
    });
    let resolved = config.resolve(Overrides {
        api_url: cli.api_url,
        environment: cli.environment,
        download_dir: cli.download_dir,
    })?;
    tracing::info!(
        environment = resolved.environment.as_str(),
        api_url = %resolved.api_url,
        "archchat starting"
    );

    match cli.command {
        Some(Commands::Search { address }) => search_once(&resolved, address).await,
        Some(Commands::Config) => save_config(&resolved),
        Some(Commands::Pdf { data, output }) => generate_pdf(&resolved, &data, output).await,
        Some(Commands::Fetch { file_name }) => fetch_document(&resolved, &file_name).await,
        None => run_tui(&resolved).await,
    }
}

fn save_config(config: &ResolvedConfig) -> Result<()> {
    Config::from_resolved(config).save()?;
    println!(
        "Saved {} settings ({}) to {}",
        config.environment.as_str(),
        config.api_url,
        Config::get_config_dir()?.display()
    );
    Ok(())
}

async fn generate_pdf(config: &ResolvedConfig, data: &Path, output: Option<PathBuf>) -> Result<()> {
    let content = std::fs::read_to_string(data)
        .with_context(|| format!("cannot read {}", data.display()))?;
    let value: serde_json::Value = serde_json::from_str(&content)
        .with_context(|| format!("{} is not valid JSON", data.display()))?;

    let bytes = DocumentClient::new(&config.api_url).generate_pdf(&value).await?;

    let target = output.unwrap_or_else(|| config.download_dir.join(GENERATED_PDF_FILENAME));
    if let Some(parent) = target.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("cannot create {}", parent.display()))?;
    }
    std::fs::write(&target, bytes).with_context(|| format!("cannot write {}", target.display()))?;

    println!("Saved {}", target.display());
    Ok(())
}

async fn fetch_document(config: &ResolvedConfig, file_name: &str) -> Result<()> {
    let documents = DocumentClient::new(&config.api_url);
    let link = documents.download_link(file_name);

    match documents.save(&link, &config.download_dir).await? {
        Some(path) => println!("Saved {}", path.display()),
        None => println!("Nothing to download"),
    }
    Ok(())
}

async fn search_once(config: &ResolvedConfig, address: String) -> Result<()> {
    let mut view = SearchView::new(Arc::new(AddressClient::new(&config.api_url)));
    view.input = address;

    if !view.submit().await {
        println!("Nothing to search: the address is empty");
        return Ok(());
    }

    match view.phase() {
        SearchPhase::Failure => println!("{}", view.error().unwrap_or_default()),
        _ => match view.pptx_path() {
            Some(path) => println!("{}: {}", path.kind().display_name(), path),
            None => println!("Search finished, no document was generated"),
        },
    }

    Ok(())
}

async fn run_tui(config: &ResolvedConfig) -> Result<()> {
    tui::install_panic_hook();
    let mut terminal = tui::init()?;
    let mut events = tui::EventHandler::new(tui::TICK_RATE);
    let mut app = App::new(config);

    let result = async {
        while !app.should_quit {
            terminal.draw(|frame| ui::render(&mut app, frame))?;

            match events.next().await {
                Some(event) => handler::handle_event(&mut app, event).await?,
                None => break,
            }
        }
        Ok::<(), anyhow::Error>(())
    }
    .await;

    tui::restore()?;
    result
}

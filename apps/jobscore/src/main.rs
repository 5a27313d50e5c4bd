mod card;
mod config;
mod errors;
mod extraction;
mod llm_client;
mod navigation;
mod orchestrator;
mod page;
mod resume;
mod scoring;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use chrono::{TimeZone, Utc};
use clap::{Parser, Subcommand};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use url::Url;

use crate::card::{render_text, CardRenderer, MatchCardState, PageCardRenderer};
use crate::config::{Backend, Config};
use crate::extraction::{JobDetailExtractor, PageSelectors};
use crate::llm_client::{build_http_client, EndpointClient, GeminiClient};
use crate::navigation::{run_navigation_loop, PageNavigationSource};
use crate::orchestrator::{JobMatchOrchestrator, MatchPipeline, NavigationOutcome};
use crate::page::loader::PageLoader;
use crate::page::LivePage;
use crate::resume::library::ResumeLibrary;
use crate::resume::parser::{EndpointResumeParser, GeminiResumeParser, ResumeParser};
use crate::resume::{JsonFileResumeStore, ResumeStore};
use crate::scoring::{EndpointMatchScorer, GeminiMatchScorer, MatchScorer};

/// JobScore CLI.
#[derive(Parser)]
#[command(name = "jobscore")]
#[command(about = "Scores job postings against your stored resume")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Score a single job view and print the match card
    Score {
        /// Job page URL
        url: Url,

        /// Read the page from a saved HTML file instead of fetching it
        #[arg(long)]
        html: Option<PathBuf>,
    },

    /// Follow navigations read from stdin (`URL [FILE]` per line)
    Watch {
        /// Directory relative FILE arguments are resolved against
        #[arg(long)]
        html_dir: Option<PathBuf>,
    },

    /// Resume management commands
    Resume {
        #[command(subcommand)]
        action: ResumeAction,
    },
}

#[derive(Subcommand)]
enum ResumeAction {
    /// List stored resumes
    List,

    /// Parse a PDF and store it
    Add {
        /// Path to the PDF
        pdf: PathBuf,
    },

    /// Make a stored resume the default
    Default {
        /// Resume ID
        id: String,
    },

    /// Delete a stored resume
    Delete {
        /// Resume ID
        id: String,
    },

    /// Print the parsed text of the default resume
    Show,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = Config::from_env()?;

    // Logs go to stderr; stdout carries the cards.
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_PKG_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    info!("Starting JobScore v{}", env!("CARGO_PKG_VERSION"));

    let store: Arc<dyn ResumeStore> = Arc::new(JsonFileResumeStore::new(&config.store_path));
    info!("Resume store: {}", config.store_path.display());

    match cli.command {
        Commands::Score { url, html } => score(&config, store, url, html.as_deref()).await,
        Commands::Watch { html_dir } => watch(&config, store, html_dir.as_deref()).await,
        Commands::Resume { action } => manage_resumes(&config, store, action).await,
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Backends
// ────────────────────────────────────────────────────────────────────────────

fn http_client(config: &Config) -> Result<reqwest::Client> {
    build_http_client(config.http_timeout).context("Failed to build HTTP client")
}

fn build_scorer(config: &Config) -> Result<Arc<dyn MatchScorer>> {
    let http = http_client(config)?;
    let scorer: Arc<dyn MatchScorer> = match config.scorer {
        Backend::Endpoint => Arc::new(EndpointMatchScorer(EndpointClient::new(
            http,
            config.require_endpoint()?,
        ))),
        Backend::Gemini => Arc::new(GeminiMatchScorer(GeminiClient::new(
            http,
            config.require_gemini_key()?,
            config.gemini_model.clone(),
        ))),
    };
    info!("Match scorer initialized ({:?})", config.scorer);
    Ok(scorer)
}

fn build_parser(config: &Config) -> Result<Box<dyn ResumeParser>> {
    let http = http_client(config)?;
    let parser: Box<dyn ResumeParser> = match config.parser {
        Backend::Endpoint => Box::new(EndpointResumeParser(EndpointClient::new(
            http,
            config.require_endpoint()?,
        ))),
        Backend::Gemini => Box::new(GeminiResumeParser(GeminiClient::new(
            http,
            config.require_gemini_key()?,
            config.gemini_model.clone(),
        ))),
    };
    Ok(parser)
}

fn pipeline(config: &Config, page: LivePage, store: Arc<dyn ResumeStore>) -> Result<MatchPipeline> {
    Ok(MatchPipeline {
        page,
        resumes: store,
        scorer: build_scorer(config)?,
        extractor: JobDetailExtractor::new(PageSelectors::default(), config.wait_timeout),
    })
}

// ────────────────────────────────────────────────────────────────────────────
// Commands
// ────────────────────────────────────────────────────────────────────────────

async fn score(
    config: &Config,
    store: Arc<dyn ResumeStore>,
    url: Url,
    html: Option<&Path>,
) -> Result<()> {
    let loader = PageLoader::new(config.http_timeout)?;
    let page = loader
        .open(url.clone(), html)
        .await
        .with_context(|| format!("Failed to load {url}"))?;

    let mut orchestrator = JobMatchOrchestrator::new(pipeline(config, page.clone(), store)?);
    match orchestrator.handle_location(&url) {
        NavigationOutcome::Started { handle, .. } => {
            handle.await.context("Scoring task failed")?;
        }
        NavigationOutcome::NoJob | NavigationOutcome::Unchanged => {
            bail!("{url} is not a job view")
        }
    }

    match page.card() {
        Some(card) => println!("{}", card.text),
        None => warn!("No card was rendered"),
    }
    Ok(())
}

/// Prints every card to stdout as it is shown on the page.
struct PrintingRenderer(PageCardRenderer);

impl CardRenderer for PrintingRenderer {
    fn show(&self, state: &MatchCardState) {
        self.0.show(state);
        println!("{}\n", render_text(state));
    }

    fn remove(&self) {
        self.0.remove();
    }
}

fn parse_navigation(line: &str, html_dir: Option<&Path>) -> Result<Option<(Url, Option<PathBuf>)>> {
    let mut parts = line.split_whitespace();
    let Some(raw_url) = parts.next() else {
        return Ok(None);
    };
    let url = Url::parse(raw_url).with_context(|| format!("Invalid URL '{raw_url}'"))?;
    let file = parts.next().map(|file| match html_dir {
        Some(dir) => dir.join(file),
        None => PathBuf::from(file),
    });
    Ok(Some((url, file)))
}

async fn watch(config: &Config, store: Arc<dyn ResumeStore>, html_dir: Option<&Path>) -> Result<()> {
    let loader = PageLoader::new(config.http_timeout)?;
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    // The first navigation opens the page.
    let page = loop {
        let Some(line) = lines.next_line().await? else {
            return Ok(());
        };
        match parse_navigation(&line, html_dir) {
            Ok(Some((url, file))) => {
                break loader
                    .open(url.clone(), file.as_deref())
                    .await
                    .with_context(|| format!("Failed to load {url}"))?
            }
            Ok(None) => continue,
            Err(e) => warn!("{e:#}"),
        }
    };

    let pipeline = pipeline(config, page.clone(), store)?;
    let renderer = PrintingRenderer(PageCardRenderer::new(
        page.clone(),
        pipeline.extractor.selectors().card_anchor.clone(),
    ));
    let mut orchestrator = JobMatchOrchestrator::with_renderer(pipeline, Arc::new(renderer));
    let source = PageNavigationSource::new(page.clone());
    let navigation = tokio::spawn(async move {
        let runs = run_navigation_loop(source, &mut orchestrator).await;
        for run in runs {
            if let Err(e) = run.await {
                warn!("Scoring task failed: {e}");
            }
        }
    });

    while let Some(line) = lines.next_line().await? {
        match parse_navigation(&line, html_dir) {
            Ok(Some((url, file))) => {
                if let Err(e) = loader.navigate(&page, url.clone(), file.as_deref()).await {
                    warn!("Failed to load {url}: {e}");
                }
            }
            Ok(None) => {}
            Err(e) => warn!("{e:#}"),
        }
    }

    info!("Input closed; waiting for pending runs");
    page.close();
    navigation.await.context("Navigation task failed")?;
    Ok(())
}

async fn manage_resumes(config: &Config, store: Arc<dyn ResumeStore>, action: ResumeAction) -> Result<()> {
    let library = ResumeLibrary::new(store);
    match action {
        ResumeAction::List => {
            let resumes = library.list().await?;
            if resumes.is_empty() {
                println!("No resumes stored.");
            }
            for resume in resumes {
                let uploaded = Utc
                    .timestamp_millis_opt(resume.timestamp)
                    .single()
                    .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
                    .unwrap_or_else(|| "-".to_string());
                let marker = if resume.is_default { "*" } else { " " };
                println!("{marker} {}  {}  {uploaded}", resume.id, resume.name);
            }
        }
        ResumeAction::Add { pdf } => {
            let bytes = tokio::fs::read(&pdf)
                .await
                .with_context(|| format!("Failed to read {}", pdf.display()))?;
            let file_name = pdf
                .file_name()
                .and_then(|name| name.to_str())
                .context("PDF path has no file name")?;
            let parser = build_parser(config)?;
            let resume = library.add(file_name, &bytes, parser.as_ref()).await?;
            println!("Stored {} as {}", resume.name, resume.id);
        }
        ResumeAction::Default { id } => {
            library.set_default(&id).await?;
            println!("Default resume is now {id}");
        }
        ResumeAction::Delete { id } => {
            let removed = library.delete(&id).await?;
            println!("Deleted {}", removed.name);
        }
        ResumeAction::Show => match library.default_resume().await? {
            Some(resume) => println!("{}", resume.content),
            None => println!("{}", errors::NO_RESUME_MESSAGE),
        },
    }
    Ok(())
}

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use websumm::config::ClientConfig;
use websumm::models::job::JobKind;
use websumm::models::page::{ChatEntry, PageContent};
use websumm::services::api::ApiClient;
use websumm::services::auth::{AuthClient, TokenStore};
use websumm::services::extract;
use websumm::services::poller::{JobRegistry, PollConfig, Poller};
use websumm::services::router::{ChatSink, ResultRouter, SinkBinding, TextSink};
use websumm::services::submit::{SubmitPayload, Submitter};
use websumm::session::Session;

/// Web summarizer client.
#[derive(Parser)]
#[command(name = "websumm")]
#[command(about = "Summarize pages, detect image text and transcribe voice queries")]
#[command(version)]
struct Cli {
    /// Bearer token for API calls (or run `websumm login`).
    #[arg(long, global = true, env = "WEBSUMM_TOKEN")]
    token: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Log in and print a bearer token.
    Login {
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
    },
    /// Register a new account.
    Register {
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
    },
    /// Confirm the emailed verification code.
    VerifyEmail {
        #[arg(long)]
        email: String,
        #[arg(long)]
        code: String,
    },
    /// Resend the verification code.
    ResendCode {
        #[arg(long)]
        email: String,
    },
    /// Fetch a page, extract its text and summarize it.
    Summarize { url: String },
    /// Ask a question about a page.
    Ask {
        question: String,
        #[arg(long)]
        url: String,
    },
    /// Detect text in an image by URL.
    DetectText { image_url: String },
    /// Transcribe an audio recording.
    Transcribe { file: PathBuf },
    /// List saved summaries.
    History,
}

/// Writes detected text straight to stdout.
struct StdoutTextSink;

impl TextSink for StdoutTextSink {
    fn set_text(&self, text: &str) {
        println!("{text}");
    }
}

/// Prints chat entries with a role tag.
struct StdoutChatSink;

impl ChatSink for StdoutChatSink {
    fn push(&self, entry: ChatEntry) {
        println!("[{}] {}", entry.role, entry.text);
    }
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let config = ClientConfig::from_env().expect("failed to load configuration");

    if let Err(e) = run(cli, config).await {
        tracing::error!(error = %e, "command failed");
        std::process::exit(1);
    }
}

async fn run(cli: Cli, config: ClientConfig) -> Result<(), Box<dyn std::error::Error>> {
    let tokens = Arc::new(TokenStore::default());
    if let Some(token) = cli.token {
        tokens.set(token);
    }

    let api = Arc::new(ApiClient::new(
        config.api_base_url.clone(),
        config.request_timeout(),
    )?);
    let auth = AuthClient::new(
        config.auth_base(),
        config.client_id.clone(),
        config.request_timeout(),
        tokens.clone(),
    )?;

    let registry = Arc::new(JobRegistry::default());
    let router = Arc::new(ResultRouter::default());
    let session = Session::new(tokens.clone(), registry.clone());
    let submitter = Submitter::new(api.clone(), tokens.clone());
    let poller = Poller::new(
        api.clone(),
        tokens.clone(),
        router.clone(),
        registry.clone(),
        PollConfig {
            interval: config.poll_interval(),
            timeout: config.poll_timeout(),
        },
    );

    match cli.command {
        Command::Login { email, password } => {
            auth.login(&email, &password).await?;
            match tokens.get() {
                Some(token) => println!("{token}"),
                None => tracing::warn!("login succeeded but no token was stored"),
            }
        }
        Command::Register { email, password } => {
            let message = auth.register(&email, &password).await?;
            println!("{message}");
        }
        Command::VerifyEmail { email, code } => {
            let message = auth.verify(&email, &code).await?;
            println!("{message}");
        }
        Command::ResendCode { email } => {
            let message = auth.resend_code(&email).await?;
            println!("{message}");
        }
        Command::Summarize { url } => {
            let page = fetch_page(&url).await?;
            tracing::info!(
                url,
                title = page.title.as_deref().unwrap_or("<untitled>"),
                chars = page.text.len(),
                "page extracted"
            );
            session.set_page(page.clone());
            let token = require_token(&tokens)?;
            let summary = api.summarize(&page.text, &token).await?;
            println!("{summary}");
        }
        Command::Ask { question, url } => {
            let page = fetch_page(&url).await?;
            session.set_page(page.clone());
            let token = require_token(&tokens)?;
            let answer = api.query(&question, &page.text, &token).await?;
            println!("{answer}");
        }
        Command::DetectText { image_url } => {
            router.bind(
                JobKind::ImageTextDetection,
                SinkBinding::Text(Arc::new(StdoutTextSink)),
            );
            let job = submitter.submit(SubmitPayload::ImageUrl(image_url)).await?;
            if let Some(handle) = poller.dispatch(job)? {
                handle.join().await;
            }
        }
        Command::Transcribe { file } => {
            router.bind(
                JobKind::AudioTranscription,
                SinkBinding::Chat(Arc::new(StdoutChatSink)),
            );
            let audio = std::fs::read(&file)?;
            let job = submitter
                .submit(SubmitPayload::audio_from_bytes(&audio))
                .await?;
            if let Some(handle) = poller.dispatch(job)? {
                handle.join().await;
            }
        }
        Command::History => {
            let token = require_token(&tokens)?;
            for record in api.history(&token).await? {
                println!(
                    "{}  {}  {}",
                    record.created_at.format("%Y-%m-%d %H:%M"),
                    record.url,
                    record.summary.lines().next().unwrap_or("")
                );
            }
        }
    }

    Ok(())
}

fn require_token(tokens: &TokenStore) -> Result<String, Box<dyn std::error::Error>> {
    tokens
        .get()
        .ok_or_else(|| "not logged in; run `websumm login` or set WEBSUMM_TOKEN".into())
}

async fn fetch_page(url: &str) -> Result<PageContent, Box<dyn std::error::Error>> {
    let html = reqwest::get(url).await?.text().await?;
    Ok(extract::extract_page(&html, url))
}

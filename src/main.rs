//! Assistant Client - Terminal chat
//!
//! Interactive client for the assistant service.

use anyhow::{Context, Result};
use assistant_client::chat::{ChatSession, DispatchError, HistoryLoader, SubmitOutcome};
use assistant_client::render::{Renderer, TerminalRenderer};
use assistant_client::service::Registrar;
use assistant_client::{ClientState, Config};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Typed at the prompt to end the session
const QUIT_COMMAND: &str = "/quit";

#[derive(Parser)]
#[command(name = "assistant")]
#[command(about = "Chat with the assistant service from the terminal")]
struct Cli {
    /// Assistant service URL (overrides the config file)
    #[arg(long, env = "ASSISTANT_URL")]
    server: Option<String>,

    /// Path to the YAML config file
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start an interactive chat session (default)
    Chat,

    /// Print the stored conversation and exit
    History,

    /// Register this device with the service
    Register,

    /// Show the device identity and whether the service knows it
    Whoami,

    /// Forget the stored device identity
    ResetIdentity,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file
    dotenvy::dotenv().ok();

    // Logs go to stderr so they never interleave with the transcript
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "warn,assistant_client=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    let mut config = Config::from_yaml_and_env(cli.config.as_deref())?;
    if let Some(server) = cli.server {
        config.server_url = server;
    }
    let state = ClientState::new(config)?;

    match cli.command.unwrap_or(Commands::Chat) {
        Commands::Chat => run_chat(&state).await,
        Commands::History => run_history(&state).await,
        Commands::Register => run_register(&state).await,
        Commands::Whoami => run_whoami(&state).await,
        Commands::ResetIdentity => run_reset_identity(&state),
    }
}

async fn run_chat(state: &ClientState) -> Result<()> {
    let session = ChatSession::start(state, TerminalRenderer::stdout()).await?;
    println!(
        "Connected to {} (type {} to exit)",
        state.config.server_url, QUIT_COMMAND
    );

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        let line = tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            line = lines.next_line() => line.context("Failed to read from stdin")?,
        };
        let Some(line) = line else { break };
        if line.trim() == QUIT_COMMAND {
            break;
        }

        match session.submit(&line).await {
            Ok(SubmitOutcome::Started) | Ok(SubmitOutcome::Ignored) => {}
            Err(DispatchError::ExchangeInFlight) => {
                println!("(still waiting for the previous answer)");
            }
            Err(e @ DispatchError::SessionClosed) => return Err(e.into()),
        }
    }

    session.shutdown().await;
    Ok(())
}

async fn run_history(state: &ClientState) -> Result<()> {
    let ensured = state.identities.ensure_identity()?;
    if ensured.created {
        let _ = Registrar::new(state.service.clone())
            .register(&ensured.identity)
            .await;
    }

    let loaded = HistoryLoader::new(state.service.clone(), state.identities.clone())
        .load(ensured.identity)
        .await;
    if loaded.turns.is_empty() {
        println!("No stored conversation.");
        return Ok(());
    }

    let mut renderer = TerminalRenderer::stdout();
    for turn in &loaded.turns {
        renderer.append_turn(turn.role, &turn.content);
    }
    Ok(())
}

async fn run_register(state: &ClientState) -> Result<()> {
    let identity = state.identities.ensure_identity()?.identity;
    let ack = Registrar::new(state.service.clone())
        .register(&identity)
        .await
        .context("Registration failed")?;

    println!(
        "Registered {} ({})",
        ack.client_id.as_deref().unwrap_or(&identity.id),
        ack.status.as_deref().unwrap_or("ok")
    );
    Ok(())
}

async fn run_whoami(state: &ClientState) -> Result<()> {
    let Some(identity) = state.identities.current()? else {
        println!("No device identity yet; one is created on first chat.");
        return Ok(());
    };

    println!("Device: {}", identity.id);
    match state.service.verify(&identity).await {
        Ok(true) => println!("Known to {}", state.config.server_url),
        Ok(false) => println!("Not registered with {}", state.config.server_url),
        Err(e) => println!("Could not reach {}: {}", state.config.server_url, e),
    }
    Ok(())
}

fn run_reset_identity(state: &ClientState) -> Result<()> {
    state.identities.discard()?;
    println!(
        "Device identity removed from {}",
        state.config.identity_path.display()
    );
    Ok(())
}

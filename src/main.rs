#![warn(clippy::all, clippy::pedantic)]
#![allow(clippy::missing_errors_doc, clippy::missing_panics_doc)]

use anyhow::Result;
use clap::Parser;
use cognisim::gateway::{Gateway, OpenAiGateway, ScriptedGateway};
use cognisim::{Config, Orchestrator, Persona};
use std::io::Write as _;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

/// Built-in demo profile, used when no persona file is given.
const DEMO_PERSONA: &str = r#"
name = "Madam Chan"
background = "52-year-old mother of two, recently laid off from a hotel housekeeping job. Lives with her children in a small rented flat."
presenting_problem = "Referred to family services after a neighbour reported frequent shouting and the children missing school."
speech_style = "Short, clipped sentences. Deflects with practical details."

[[guarded_topics]]
topic = "family conflict"
keywords = ["husband", "shouting", "fight", "argument"]
unlocked_at = "tentatively_open"

[[guarded_topics]]
topic = "finances"
keywords = ["money", "debt", "rent", "loan"]
unlocked_at = "moderately_open"

[[guarded_topics]]
topic = "childhood trauma"
keywords = ["childhood", "trauma", "abuse", "father"]
unlocked_at = "significantly_open"
"#;

#[derive(Parser)]
#[command(
    name = "cognisim",
    version,
    about = "Interactive client-simulation session for dialogue training"
)]
struct Cli {
    /// Persona profile (TOML); omit to use the built-in demo persona
    #[arg(long)]
    persona: Option<PathBuf>,

    /// Config file (TOML); omit to use defaults
    #[arg(long)]
    config: Option<PathBuf>,

    /// Use the offline scripted gateway instead of a live endpoint
    #[arg(long)]
    scripted: bool,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose { Level::DEBUG } else { Level::INFO };
    let subscriber = FmtSubscriber::builder().with_max_level(level).finish();
    tracing::subscriber::set_global_default(subscriber)
        .expect("setting default subscriber failed");

    let config = match &cli.config {
        Some(path) => Config::load(path)?,
        None => Config::default(),
    };
    let persona = match &cli.persona {
        Some(path) => Persona::load(path)?,
        None => Persona::from_toml_str(DEMO_PERSONA)?,
    };

    let gateway: Arc<dyn Gateway> = if cli.scripted {
        Arc::new(ScriptedGateway::new())
    } else {
        let api_key = std::env::var("OPENAI_API_KEY").ok();
        if api_key.is_none() {
            tracing::warn!("OPENAI_API_KEY is not set; requests will be unauthenticated");
        }
        Arc::new(OpenAiGateway::new(&config.gateway, api_key.as_deref())?)
    };

    let orchestrator = Orchestrator::new(gateway, &config)?;
    let name = persona.name.clone();
    let session_id = orchestrator.create_session(Arc::new(persona));

    println!("Session with {name} started. Type 'quit' or 'exit' to end.");
    let stdin = std::io::stdin();
    loop {
        print!("worker> ");
        std::io::stdout().flush()?;

        let mut line = String::new();
        if stdin.read_line(&mut line)? == 0 {
            break;
        }
        let message = line.trim();
        if message.is_empty() {
            continue;
        }
        if matches!(message, "quit" | "exit") {
            break;
        }

        match orchestrator.submit_message(session_id, message).await {
            Ok(receipt) => {
                println!("{name} [{}]: {}", receipt.state.openness_level, receipt.reply);
            }
            Err(e) => {
                // A failed turn commits nothing; the session stays usable.
                tracing::error!("Turn failed: {e}");
            }
        }
    }

    let turns = orchestrator.export_turns(session_id).await?;
    if let Ok(state) = orchestrator.state(session_id).await {
        println!(
            "Session ended after {} turn(s) at openness '{}'.",
            turns.len(),
            state.openness_level
        );
    }
    orchestrator.end_session(session_id);
    Ok(())
}

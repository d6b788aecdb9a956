//! Command-line interface parsing and handling
//!
//! This module parses arguments, loads configuration, picks the storage
//! backends and dispatches to the interactive loop or a one-shot command.

use std::error::Error;
use std::io::IsTerminal;
use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};

use crate::core::access_code::{generate_code, AccessCode};
use crate::core::app::{replay_history, App, AppInit};
use crate::core::config::Config;
use crate::core::constants::{CODE_MIN_LENGTH, EMPTY_HISTORY_MESSAGE};
use crate::core::session_store::SessionStore;
use crate::core::storage::{FileStorage, MemoryStorage, Storage};
use crate::ui::chat_loop::{run_chat, ChatOptions};
use crate::ui::renderer::Renderer;
use crate::ui::terminal::TerminalRenderer;
use crate::utils::logging::init_tracing;

#[derive(Parser)]
#[command(name = "haream")]
#[command(version)]
#[command(about = "Send one message to several AI chat models at once")]
#[command(
    long_about = "Haream sends every message you type to all of your active models through \
OpenRouter and shows their answers side by side. Conversations, the API key, the system \
prompt and the model list are stored under an access code; enter the same code later to \
pick up where you left off.\n\n\
Type /help inside the chat for the list of commands."
)]
pub struct Args {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Read configuration from this file instead of the default location
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Enter this access code immediately
    #[arg(long, value_name = "CODE")]
    pub code: Option<String>,

    /// Do not save anything from this run
    #[arg(long)]
    pub incognito: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the chat interface (default)
    Chat,
    /// Print a fresh access code
    GenerateCode,
    /// List stored access codes
    Sessions,
    /// Print a stored conversation without contacting any model
    Replay {
        /// Access code of the conversation
        code: String,
    },
}

pub fn main() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();
    let config = Config::load(args.config.as_deref())?;
    init_tracing(config.log_level())?;

    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?
        .block_on(async_main(args, config))
}

async fn async_main(args: Args, config: Config) -> Result<(), Box<dyn Error>> {
    match args.command.unwrap_or(Commands::Chat) {
        Commands::Chat => {
            let durable = durable_storage(&config)?;
            let (mut app, mut rx) = App::new(AppInit {
                config,
                durable,
                tab: Arc::new(MemoryStorage::new()),
                renderer: Box::new(terminal_renderer()),
            });
            let options = ChatOptions {
                code: args.code,
                incognito: args.incognito,
            };
            run_chat(&mut app, &mut rx, &options).await
        }
        Commands::GenerateCode => {
            let code = generate_code(CODE_MIN_LENGTH)
                .map_err(|err| format!("Could not generate a code: {err}"))?;
            println!("{code}");
            Ok(())
        }
        Commands::Sessions => list_sessions(&config),
        Commands::Replay { code } => replay(&config, &code),
    }
}

fn terminal_renderer() -> TerminalRenderer<std::io::Stdout, std::io::Stderr> {
    TerminalRenderer::stdout(std::io::stdout().is_terminal())
}

fn durable_storage(config: &Config) -> Result<Arc<dyn Storage>, Box<dyn Error>> {
    let storage = match config.data_dir.as_ref() {
        Some(dir) => FileStorage::new(dir),
        None => FileStorage::default_location()
            .ok_or("Could not determine a data directory; set data_dir in the config file")?,
    };
    Ok(Arc::new(storage))
}

fn session_store(config: &Config) -> Result<SessionStore, Box<dyn Error>> {
    Ok(SessionStore::new(
        durable_storage(config)?,
        config.default_system_prompt(),
    ))
}

fn list_sessions(config: &Config) -> Result<(), Box<dyn Error>> {
    let store = session_store(config)?;
    let codes = store.list_codes()?;
    if codes.is_empty() {
        println!("No stored sessions.");
        return Ok(());
    }
    for code in codes {
        match store.load(&code)? {
            Some(session) => println!("{code}\t{} turn(s)", session.history.len()),
            None => println!("{code}\tunreadable"),
        }
    }
    Ok(())
}

fn replay(config: &Config, raw_code: &str) -> Result<(), Box<dyn Error>> {
    let code = AccessCode::parse(raw_code)?;
    let store = session_store(config)?;
    let session = store
        .load(&code)?
        .ok_or_else(|| format!("No session stored for {code}"))?;

    let mut renderer = terminal_renderer();
    renderer.apply_theme(session.theme);
    if session.history.is_empty() {
        renderer.show_welcome(EMPTY_HISTORY_MESSAGE);
    } else {
        replay_history(&session.history, &session.custom_models, &mut renderer);
    }
    Ok(())
}

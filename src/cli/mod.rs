//! Command-line interface parsing and dispatch.

use std::error::Error;
use std::io;
use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing::info;

use crate::core::config::{Config, Frontend, Profile, StoreKind};
use crate::core::session::ChatSession;
use crate::ui::repl::{print_history, run_repl};
use crate::ui::window::run_window;
use crate::utils::logging::{init_tracing, LogTarget};

/// Overrides the store location of whichever front end runs.
pub const STORE_PATH_ENV: &str = "CHATRELAY_STORE_PATH";

#[derive(Parser)]
#[command(name = "chatrelay")]
#[command(about = "Relay chat messages between two hosted AI models")]
#[command(
    long_about = "chatrelay sends each message to one AI model and hands the reply to a second \
model, printing both answers and keeping every exchange in a local history.\n\n\
Environment Variables (also read from a .env file):\n\
  XAI_API_KEY           API key for Grok\n\
  GEMINI_API_KEY        API key for Gemini\n\
  COHERE_API_KEY        API key for Cohere\n\
  CHATRELAY_STORE_PATH  History file to use instead of the configured one\n\
  CHATRELAY_LOG         Log filter, e.g. debug (default: warn)\n\n\
Use --store memory to chat without keeping any history.\n\n\
Terminal commands:\n\
  history               Print every stored exchange\n\
  exit                  Quit\n\n\
Window controls:\n\
  Enter                 Send the message / open the highlighted chat\n\
  Tab                   Switch between history and input\n\
  Ctrl+N                Start a new chat\n\
  PgUp/PgDn/Mouse       Scroll the conversation\n\
  Esc or Ctrl+C         Quit"
)]
pub struct Args {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Read configuration from this file instead of the default location
    #[arg(short = 'c', long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Write diagnostics to this file
    #[arg(short = 'l', long, global = true, value_name = "FILE")]
    pub log: Option<PathBuf>,

    /// Keep history in this kind of store instead of the configured one
    #[arg(short = 's', long, global = true, value_enum, value_name = "KIND")]
    pub store: Option<StoreKind>,
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
pub enum Commands {
    /// Line-by-line chat in the terminal (default)
    Terminal,
    /// Full-screen chat with a conversation sidebar
    Window,
    /// Print the stored history and exit
    History {
        /// Show the window front end's history instead of the terminal's
        #[arg(long)]
        window: bool,
    },
}

impl Commands {
    fn frontend(&self) -> Frontend {
        match self {
            Commands::Terminal => Frontend::Terminal,
            Commands::Window => Frontend::Window,
            Commands::History { window } => {
                if *window {
                    Frontend::Window
                } else {
                    Frontend::Terminal
                }
            }
        }
    }
}

pub fn main() -> Result<(), Box<dyn Error>> {
    tokio::runtime::Runtime::new()?.block_on(async_main())
}

async fn async_main() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();
    // A missing .env file is normal.
    let _ = dotenv::dotenv();

    let command = args.command.unwrap_or(Commands::Terminal);
    let owns_terminal = command == Commands::Window;
    init_tracing(&LogTarget::choose(args.log.as_deref(), owns_terminal))?;

    let config = match &args.config {
        Some(path) => Config::load_from_path(path)?,
        None => Config::load()?,
    };
    let mut profile = config.profile(command.frontend());
    if let Some(kind) = args.store {
        profile.store.kind = kind;
    }
    apply_store_override(&mut profile, std::env::var(STORE_PATH_ENV).ok());
    info!(?command, store = %profile.store.path.display(), "starting");

    let mut session = ChatSession::from_profile(&profile)?;
    match command {
        Commands::Terminal => {
            let stdin = io::stdin();
            run_repl(&mut session, stdin.lock(), &mut io::stdout()).await?;
        }
        Commands::Window => run_window(&mut session).await?,
        Commands::History { .. } => print_history(&session, &mut io::stdout())?,
    }
    Ok(())
}

fn apply_store_override(profile: &mut Profile, path: Option<String>) {
    if let Some(path) = path.filter(|p| !p.trim().is_empty()) {
        profile.store.path = PathBuf::from(path);
    }
}

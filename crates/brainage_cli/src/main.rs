//! Brain Age - terminal front end
//!
//! Plays the reaction, memory, and math tests on stdin/stdout, keeps a local
//! history and journal, and asks an optional coach for feedback.
//!
//! Storage locations:
//! - Linux: ~/.local/share/brainage/
//! - Windows: %APPDATA%\brainage\
//! - MacOS: ~/Library/Application Support/brainage/
//!
//! `BRAINAGE_DATA_DIR` overrides the location; logs go to `brainage.log` there.

use std::fs::OpenOptions;
use std::io::{self, Stdout};
use std::sync::{Arc, Mutex};

use brainage::time::unix_millis_now;
use clap::{Parser, Subcommand, ValueEnum};
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

mod coach;
mod config;
mod driver;
mod error;
mod game;
mod paths;
mod store;
mod terminal;

use coach::{Coach, Turn};
use config::AppConfig;
use error::AppError;
use paths::AppPaths;
use store::{FileStore, KeyValueStore};
use terminal::{Terminal, Theme};

#[derive(Parser)]
#[command(
    name = "brainage",
    about = "Brain age mini-game: reaction, digit memory, and mental arithmetic",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Play a session (the default)
    Play,
    /// Show the history dashboard
    History {
        #[command(subcommand)]
        action: Option<HistoryAction>,
    },
    /// Write or read journal notes
    Journal {
        #[command(subcommand)]
        action: JournalAction,
    },
    /// Ask the coach. With no question, summarises your trend.
    Coach { question: Vec<String> },
    /// Switch the colour theme
    Theme {
        #[arg(value_enum)]
        mode: ThemeArg,
    },
    /// Print where data, config, and logs live
    Paths,
}

#[derive(Subcommand)]
enum HistoryAction {
    /// Delete every recorded session
    Clear,
}

#[derive(Subcommand)]
enum JournalAction {
    /// Add a note, linked to your latest brain age
    Add {
        #[arg(required = true)]
        text: Vec<String>,
    },
    /// List notes, newest first
    List {
        #[arg(short, long, default_value_t = 20)]
        limit: usize,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum ThemeArg {
    Light,
    Dark,
}

fn init_tracing(paths: &AppPaths) {
    let filter = EnvFilter::try_from_env("BRAINAGE_LOG").unwrap_or_else(|_| EnvFilter::new("info"));
    let log_path = paths.log_file();

    match OpenOptions::new().create(true).append(true).open(&log_path) {
        Ok(file) => {
            tracing_subscriber::registry()
                .with(fmt::layer().with_ansi(false).with_writer(Mutex::new(file)))
                .with(filter)
                .init();
            tracing::debug!(path = %log_path.display(), "logging initialized");
        }
        // Stdout belongs to the game; go without logs rather than interleave them.
        Err(_) => tracing_subscriber::registry().with(filter).init(),
    }
}

fn stdin_lines() -> Lines<BufReader<Stdin>> {
    BufReader::new(tokio::io::stdin()).lines()
}

fn terminal(store: &impl KeyValueStore) -> Terminal<Stdout> {
    Terminal::new(io::stdout(), Theme::from_dark(store::load_dark_mode(store)))
}

async fn run_coach(
    cfg: &AppConfig,
    store: &FileStore,
    question: Vec<String>,
) -> Result<(), AppError> {
    let history = store::load_history(store, cfg.history_cap);
    let coach = Coach::new(cfg.coach.clone());
    let mut term = terminal(store);

    if question.is_empty() {
        let reply = coach.trend(&history).await;
        term.coach(&reply)?;
        return Ok(());
    }

    // Multi-turn chat: the first question comes from argv, follow-ups from stdin.
    let mut turns: Vec<Turn> = Vec::new();
    let mut input = stdin_lines();
    let mut question = question.join(" ");
    loop {
        let reply = coach.chat(&history, &turns, &question).await;
        term.coach(&reply)?;
        let coach::CoachReply::Text(text) = reply else {
            break;
        };
        turns.push(Turn::user(question));
        turns.push(Turn::model(text));

        term.line("(follow-up question, or empty line to finish)")?;
        match input.next_line().await? {
            Some(next) if !next.trim().is_empty() => question = next.trim().to_string(),
            _ => break,
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let paths = AppPaths::new()?;
    init_tracing(&paths);

    let cfg = AppConfig::load(&paths.config_file())?;
    cfg.validate()?;
    let mut store = FileStore::new(paths.clone());

    match cli.command.unwrap_or(Command::Play) {
        Command::Play => {
            let coach = Arc::new(Coach::new(cfg.coach.clone()));
            let mut term = terminal(&store);
            let mut input = stdin_lines();
            game::run(&cfg, &mut store, coach, &mut input, &mut term).await?;
        }
        Command::History { action: None } => {
            let history = store::load_history(&store, cfg.history_cap);
            terminal(&store).history(&history)?;
        }
        Command::History {
            action: Some(HistoryAction::Clear),
        } => {
            store.remove(store::HISTORY_KEY)?;
            tracing::info!("history cleared");
            println!("History cleared.");
        }
        Command::Journal {
            action: JournalAction::Add { text },
        } => {
            let history = store::load_history(&store, cfg.history_cap);
            let mut journal = store::load_journal(&store);
            let age = journal
                .write(&text.join(" "), unix_millis_now(), history.latest())?
                .brain_age;
            store::save_journal(&mut store, &journal)?;
            match age {
                Some(age) => println!("Noted (brain age {age})."),
                None => println!("Noted."),
            }
        }
        Command::Journal {
            action: JournalAction::List { limit },
        } => {
            let journal = store::load_journal(&store);
            terminal(&store).journal(&journal, limit)?;
        }
        Command::Coach { question } => run_coach(&cfg, &store, question).await?,
        Command::Theme { mode } => {
            let dark = matches!(mode, ThemeArg::Dark);
            store::save_dark_mode(&mut store, dark)?;
            println!("Theme set to {}.", if dark { "dark" } else { "light" });
        }
        Command::Paths => {
            println!("data:    {}", paths.data_dir().display());
            println!("config:  {}", paths.config_file().display());
            println!("log:     {}", paths.log_file().display());
            for key in [store::HISTORY_KEY, store::JOURNAL_KEY, store::DARK_MODE_KEY] {
                println!("{key}: {}", paths.store_file(key).display());
            }
        }
    }
    Ok(())
}

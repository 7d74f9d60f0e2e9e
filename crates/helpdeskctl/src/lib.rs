//! Helpdesk Control - command line front-end for the helpdesk assistant.
//!
//! Argument parsing, settings resolution and the session loop live here so
//! they can be tested; `main.rs` wires them to the terminal.

use anyhow::{Context, Result};
use clap::Parser;
use helpdesk_common::{HelpdeskConfig, Interaction, Pipeline};
use owo_colors::OwoColorize;
use std::future::Future;
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::thread;
use tokio::sync::mpsc;
use tracing::error;

// Version is embedded at build time
pub const VERSION: &str = env!("HELPDESK_VERSION");

/// Prompt shown before each question
pub const INPUT_PROMPT: &str = "Helpdesk> ";

#[derive(Parser, Debug)]
#[command(name = "helpdeskctl")]
#[command(about = "Offline IT helpdesk assistant backed by a local model", long_about = None)]
#[command(version = VERSION)]
pub struct Cli {
    /// Local model to load (overrides the config file)
    pub model: Option<String>,

    /// Config file to use instead of the default location
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Directory to write tickets to
    #[arg(long)]
    pub ticket_dir: Option<PathBuf>,

    /// Show debug logs on stderr
    #[arg(short, long)]
    pub verbose: bool,
}

impl Cli {
    /// Load the config file and apply command line overrides
    pub fn resolve_config(&self) -> Result<HelpdeskConfig> {
        let config = match &self.config {
            Some(path) => HelpdeskConfig::load_from_path(path)
                .with_context(|| format!("failed to load config {}", path.display()))?,
            None => HelpdeskConfig::load().context("failed to load config")?,
        };
        Ok(self.apply_overrides(config))
    }

    pub fn apply_overrides(&self, mut config: HelpdeskConfig) -> HelpdeskConfig {
        if let Some(model) = &self.model {
            config.model = model.clone();
        }
        if let Some(dir) = &self.ticket_dir {
            config.tickets.dir = Some(dir.clone());
        }
        config
    }
}

pub fn welcome_text() -> String {
    "Welcome to the Local IT Helpdesk Assistant. Type your question and press Enter.\n\
     Press Ctrl-C or enter an empty line to exit.\n"
        .to_string()
}

pub fn print_welcome(model: &str) {
    println!("{}", welcome_text());
    println!("{}", format!("model: {}  version: {}", model, VERSION).dimmed());
    println!();
}

pub fn write_interaction(out: &mut impl Write, interaction: &Interaction) -> io::Result<()> {
    writeln!(out)?;
    writeln!(out, "{}", "AI Response:".bold())?;
    writeln!(out, "{}", interaction.response)?;
    writeln!(out)?;
    writeln!(
        out,
        "{} {}",
        "Session logged to:".dimmed(),
        interaction.ticket_path.display()
    )?;
    writeln!(out)
}

/// Why a session ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEnd {
    EmptyLine,
    EndOfInput,
    Interrupted,
}

/// Run questions from `input` through the pipeline until an empty line, end
/// of input or `interrupt` completes.
///
/// `interrupt` is polled by every wait in the loop, so one that completes
/// while a response is being printed ends the session at the next wait.
/// Dropping an in-flight query kills the model process.
pub async fn run_session(
    pipeline: &Pipeline,
    model: &str,
    input: &mut mpsc::UnboundedReceiver<io::Result<String>>,
    interrupt: impl Future<Output = ()>,
    out: &mut impl Write,
) -> Result<SessionEnd> {
    tokio::pin!(interrupt);

    loop {
        write!(out, "{}", INPUT_PROMPT)?;
        out.flush()?;

        let line = tokio::select! {
            biased;
            _ = &mut interrupt => {
                writeln!(out, "\nExiting. Goodbye!")?;
                return Ok(SessionEnd::Interrupted);
            }
            line = input.recv() => line,
        };

        let query = match line {
            Some(line) => line.context("failed reading input")?,
            None => {
                writeln!(out, "\nNo input received. Exiting. Goodbye!")?;
                return Ok(SessionEnd::EndOfInput);
            }
        };
        if query.trim().is_empty() {
            writeln!(out, "No input received. Exiting. Goodbye!")?;
            return Ok(SessionEnd::EmptyLine);
        }

        let result = tokio::select! {
            biased;
            _ = &mut interrupt => {
                writeln!(out, "\nInterrupted. Goodbye!")?;
                return Ok(SessionEnd::Interrupted);
            }
            result = pipeline.handle(&query, model) => result,
        };

        match result {
            Ok(interaction) => write_interaction(out, &interaction)?,
            Err(e) => {
                error!("failed to save ticket: {}", e);
                eprintln!("Could not save this session: {}", e);
            }
        }
    }
}

/// Read stdin lines on a plain thread. The receiver yields `None` at end of
/// input. A blocking stdin read on the runtime would hold up shutdown after
/// Ctrl-C, so the thread is left detached.
pub fn spawn_input_reader() -> mpsc::UnboundedReceiver<io::Result<String>> {
    let (tx, rx) = mpsc::unbounded_channel();
    thread::spawn(move || {
        let stdin = io::stdin();
        let mut lock = stdin.lock();
        loop {
            let mut line = String::new();
            match lock.read_line(&mut line) {
                Ok(0) => break,
                Ok(_) => {
                    let line = line.trim_end_matches(['\n', '\r']).to_string();
                    if tx.send(Ok(line)).is_err() {
                        break;
                    }
                }
                Err(e) => {
                    let _ = tx.send(Err(e));
                    break;
                }
            }
        }
    });
    rx
}

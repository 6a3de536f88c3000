use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::PathBuf;

use clap::Parser;
use livechat::{ChatStore, Reducer};
use livechat::clock::{Clock, ManualClock, SystemClock};
use livechat::config::{ConfigError, SessionConfig};
use serde::Serialize;

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error("failed to open {path}: {source}")]
    Open { path: PathBuf, source: io::Error },
    #[error("failed to read input: {0}")]
    Read(#[from] io::Error),
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),
    #[error("failed to render JSON: {0}")]
    Render(#[from] serde_json::Error),
}

#[derive(Parser, Debug)]
#[command(name = "livechat", about = "Replay a JSON-lines chat event log and print the session state")]
struct Cli {
    /// Event log with one `{"type", "detail"}` envelope per line. Reads stdin when omitted.
    input: Option<PathBuf>,

    /// Use a manual clock starting at this many ms, advancing 1ms per event.
    #[arg(long, env = "LIVECHAT_CLOCK_START_MS")]
    clock_start: Option<i64>,

    /// Print each transcript entry as it is appended.
    #[arg(long)]
    follow: bool,

    /// Print only the transcript instead of the whole state.
    #[arg(long)]
    transcript_only: bool,
}

fn main() -> Result<(), CliError> {
    tracing_subscriber::fmt().with_writer(io::stderr).init();

    let cli = Cli::parse();
    let config = SessionConfig::from_env()?;

    let manual = cli.clock_start.map(ManualClock::new);
    let clock: Box<dyn Clock> = match &manual {
        Some(manual) => Box::new(manual.clone()),
        None => Box::new(SystemClock),
    };
    let mut store = ChatStore::with_reducer(Reducer::new(clock, config));
    tracing::info!(session = %store.session_id(), "replaying event log");

    if cli.follow {
        let mut seen = 0_usize;
        store.subscribe(move |state| {
            for entry in state.chats.iter().skip(seen) {
                match serde_json::to_string(entry) {
                    Ok(line) => println!("{line}"),
                    Err(e) => tracing::warn!(error = %e, "failed to render transcript entry"),
                }
            }
            seen = state.chats.len();
        });
    }

    let reader: Box<dyn BufRead> = match &cli.input {
        Some(path) => {
            let file = File::open(path).map_err(|source| CliError::Open {
                path: path.clone(),
                source,
            })?;
            Box::new(BufReader::new(file))
        }
        None => Box::new(BufReader::new(io::stdin())),
    };

    let mut applied = 0_usize;
    let mut skipped = 0_usize;
    for (idx, line) in reader.lines().enumerate() {
        let line = line?;
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        if store.dispatch_json(trimmed).is_ok() {
            applied += 1;
        } else {
            tracing::warn!(line = idx + 1, "skipped undecodable line");
            skipped += 1;
        }
        if let Some(manual) = &manual {
            manual.advance(1);
        }
    }
    tracing::info!(applied, skipped, "replay finished");

    if !cli.follow {
        if cli.transcript_only {
            print_json(&store.state().chats)?;
        } else {
            print_json(store.state())?;
        }
    }
    Ok(())
}

fn print_json(value: &impl Serialize) -> Result<(), CliError> {
    let rendered = serde_json::to_string_pretty(value)?;
    println!("{rendered}");
    Ok(())
}

//! clarity: terminal front-end for the journaling agent.
//! Reads config, opens the user's channel, submits entries from the command
//! line (or stdin, one per line) and prints the streamed replies to stdout.

use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{bail, Context};
use clap::Parser;
use clarity_client::config;
use clarity_client::{
    ChatSession, Config, ConversationLog, EntryId, PendingReplies, SessionSettings,
    SpoolSink, StaticIdentity, WsConnector,
};
use tracing::warn;
use tracing_subscriber::prelude::*;

#[derive(Debug, Parser)]
#[command(name = "clarity", about = "Send journal entries to the agent and stream its replies")]
struct Args {
    /// Config file (default: $CLARITY_CONFIG, then ~/.clarity/config.yaml)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Give up on outstanding replies after this many idle seconds
    #[arg(long, default_value_t = 30)]
    idle_timeout: u64,

    /// Entries to send. Read from stdin, one per line, when omitted.
    entries: Vec<String>,
}

fn init_tracing() {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn"));
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .with(env_filter)
        .init();
}

fn load_config(explicit: Option<&PathBuf>) -> anyhow::Result<Config> {
    let from_env = std::env::var_os(config::CONFIG_ENV).is_some();
    let Some(path) = config::resolve_config_path(explicit.map(PathBuf::as_path)) else {
        return Ok(Config::default());
    };
    // Only an explicitly chosen config has to exist.
    if explicit.is_none() && !from_env && !path.exists() {
        return Ok(Config::default());
    }
    config::load(&path).with_context(|| format!("failed to load config from {}", path.display()))
}

fn read_entries(args: &Args) -> io::Result<Vec<String>> {
    let raw = if args.entries.is_empty() {
        io::stdin().lock().lines().collect::<io::Result<Vec<_>>>()?
    } else {
        args.entries.clone()
    };
    Ok(raw
        .into_iter()
        .map(|line| line.trim().to_string())
        .filter(|line| !line.is_empty())
        .collect())
}

/// Prints replies in submission order, streaming the one being written.
struct ReplyPrinter {
    replies: Vec<EntryId>,
    current: usize,
    /// Text of the current reply already on screen.
    printed: String,
}

impl ReplyPrinter {
    fn new(replies: Vec<EntryId>) -> Self {
        Self {
            replies,
            current: 0,
            printed: String::new(),
        }
    }

    fn flush(
        &mut self,
        log: &ConversationLog,
        pending: &PendingReplies,
        out: &mut impl Write,
    ) -> io::Result<()> {
        while let Some(&id) = self.replies.get(self.current) {
            let text = log.get(id).map(|e| e.text.as_str()).unwrap_or_default();
            match text.strip_prefix(self.printed.as_str()) {
                Some(rest) => write!(out, "{rest}")?,
                // Replaced rather than appended; start the line over.
                None => write!(out, "\n{text}")?,
            }
            self.printed = text.to_string();
            if pending.iter().any(|p| p == id) {
                break;
            }
            writeln!(out)?;
            self.current += 1;
            self.printed.clear();
        }
        out.flush()
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    init_tracing();
    let args = Args::parse();

    let cfg = load_config(args.config.as_ref())?;
    let entries = read_entries(&args).context("failed to read entries from stdin")?;
    if entries.is_empty() {
        bail!("no entry provided");
    }

    let session = ChatSession::new(WsConnector, SessionSettings::from(&cfg))
        .with_identity(StaticIdentity(cfg.user.id.clone()));
    let mut session = match &cfg.audio.spool_dir {
        Some(dir) => session.with_audio(SpoolSink::new(dir)),
        None => session,
    };

    let replies: Vec<EntryId> = entries
        .iter()
        .map(|entry| session.submit(entry).reply_entry)
        .collect();

    let stdout = io::stdout();
    let mut out = stdout.lock();
    let mut printer = ReplyPrinter::new(replies.clone());
    printer.flush(session.log(), session.pending(), &mut out)?;

    let idle = Duration::from_secs(args.idle_timeout);
    while !session.pending().is_empty() {
        match tokio::time::timeout(idle, session.next_event()).await {
            Ok(Some(event)) => session.handle_event(event),
            Ok(None) => break,
            Err(_) => {
                warn!(seconds = args.idle_timeout, "no reply from agent, giving up");
                session.disconnect();
            }
        }
        printer.flush(session.log(), session.pending(), &mut out)?;
    }
    session.disconnect();
    printer.flush(session.log(), session.pending(), &mut out)?;

    let failure = session.settings().send_failure.clone();
    let undelivered = replies
        .iter()
        .filter(|id| session.log().get(**id).is_some_and(|e| e.text == failure))
        .count();
    if undelivered > 0 {
        bail!("{undelivered} of {} entries could not be delivered (connection error)", replies.len());
    }
    Ok(())
}

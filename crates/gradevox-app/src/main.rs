//! Gradevox application binary - composition root.
//!
//! Replays a transcript script through the dictation orchestrator:
//! 1. Load configuration from TOML
//! 2. Load the JSON roster (and correction memory, when given)
//! 3. Feed each script line to the orchestrator, printing one JSON line per result
//! 4. Write the edited roster and memory back

mod cli;
mod files;
mod script;

use clap::Parser;
use serde_json::json;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};

use gradevox_command::{GradebookSession, InMemoryRoster};
use gradevox_core::GradevoxConfig;
use gradevox_dictation::{DictationOutput, DualEngineOrchestrator};

use cli::CliArgs;
use script::ScriptLine;

/// Apply one script line and return the JSON to print, if any.
fn handle_line(
    orchestrator: &mut DualEngineOrchestrator,
    sink: &mut InMemoryRoster,
    line: ScriptLine,
) -> Option<serde_json::Value> {
    match line {
        ScriptLine::Start => match orchestrator.start_listening() {
            Ok(id) => Some(json!({ "event": "listening", "session_id": id })),
            Err(e) => Some(json!({ "event": "error", "message": e.to_string() })),
        },
        ScriptLine::Stop => orchestrator
            .stop()
            .map(|id| json!({ "event": "stopped", "session_id": id })),
        ScriptLine::SessionEnded => match orchestrator.session_ended() {
            Ok(listening) => Some(json!({ "event": "session_ended", "listening": listening })),
            Err(e) => Some(json!({ "event": "error", "message": e.to_string() })),
        },
        ScriptLine::EngineError(error) => orchestrator
            .handle_engine_error(error)
            .map(|surfaced| json!({ "event": "engine_error", "detail": surfaced })),
        ScriptLine::Event(event) => {
            // A script is a run of utterances; speaking implies listening.
            if !orchestrator.state().is_active() && event.is_final {
                if let Err(e) = orchestrator.start_listening() {
                    return Some(json!({ "event": "error", "message": e.to_string() }));
                }
            }
            let roster = sink.roster().clone();
            match orchestrator.handle_event(&event, &roster, sink) {
                Ok(Some(DictationOutput::Command(outcome))) => {
                    Some(json!({ "event": "command", "detail": outcome }))
                }
                Ok(Some(DictationOutput::SessionFinished { session_id })) => {
                    Some(json!({ "event": "finished", "session_id": session_id }))
                }
                Ok(None) => None,
                Err(e) => Some(json!({ "event": "error", "message": e.to_string() })),
            }
        }
    }
}

async fn replay<R: AsyncBufRead + Unpin>(
    reader: R,
    orchestrator: &mut DualEngineOrchestrator,
    sink: &mut InMemoryRoster,
) -> std::io::Result<usize> {
    let mut lines = reader.lines();
    let mut handled = 0;
    while let Some(line) = lines.next_line().await? {
        let Some(parsed) = script::parse_line(&line) else {
            continue;
        };
        handled += 1;
        if let Some(output) = handle_line(orchestrator, sink, parsed) {
            println!("{}", output);
        }
    }
    Ok(handled)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = CliArgs::parse();

    // Config.
    let config_file = args.resolve_config_path();
    let mut config = GradevoxConfig::load_or_default(&config_file);
    if args.continuous {
        config.dictation.continuous = true;
    }

    // Tracing. Logs go to stderr so stdout stays one JSON object per line.
    let log_level = args.resolve_log_level(&config.general.log_level);
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&log_level)),
        )
        .init();

    tracing::info!("Starting Gradevox v{}", env!("CARGO_PKG_VERSION"));
    tracing::info!(path = %config_file.display(), "Configuration resolved");

    // Roster and memory.
    let roster = files::read_roster(&args.roster)?;
    let mut sink = InMemoryRoster::new(roster);
    let mut session = GradebookSession::new(&config);
    if let Some(path) = &args.memory {
        session = session.with_memory(files::read_memory(path));
    }
    let mut orchestrator = DualEngineOrchestrator::with_session(&config, session);

    // Replay.
    let handled = match &args.script {
        Some(path) => {
            let file = tokio::fs::File::open(path).await?;
            replay(BufReader::new(file), &mut orchestrator, &mut sink).await?
        }
        None => replay(BufReader::new(tokio::io::stdin()), &mut orchestrator, &mut sink).await?,
    };
    orchestrator.stop();
    tracing::info!(lines = handled, "Script finished");

    // Persist.
    if let Some(path) = &args.memory {
        files::write_memory(path, orchestrator.session().memory())?;
    }
    files::write_roster(&args.resolve_output_path(), sink.roster())?;

    Ok(())
}

//! `mira chat`: interactive RAG chat.

use chrono::Local;
use mira_agent::{PipelineSettings, ResponsePipeline};
use mira_config::AppConfig;
use mira_core::Persona;
use mira_memory::TranscriptLogger;
use std::io::Write;
use std::pin::pin;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tracing::info;

/// Used when neither the prompt nor the config supplies a username.
const FALLBACK_USER_NAME: &str = "user";

pub async fn run(user: Option<String>) -> Result<(), Box<dyn std::error::Error>> {
    let config = super::load_config()?;

    // Check for an API key early to give a clear error
    if !config.has_api_key() {
        eprintln!();
        eprintln!("  ERROR: No API key configured!");
        eprintln!();
        eprintln!("  Set one of these environment variables:");
        eprintln!("    export GROQ_API_KEY='gsk_...'   (Groq, the default provider)");
        eprintln!("    export MIRA_API_KEY='...'       (any configured provider)");
        eprintln!();
        eprintln!("  Or add it to your config file:");
        eprintln!("    {}", AppConfig::config_dir().join("config.toml").display());
        eprintln!();
        return Err(mira_core::Error::config("No API key found. See above for setup instructions.").into());
    }

    let mut lines = spawn_line_reader();

    let user_name = match user {
        Some(name) => resolve_user_name(&name, config.default_user_name.as_deref()),
        None => {
            prompt("Your Username. Press enter for default: ")?;
            let typed = lines.recv().await.unwrap_or_default();
            resolve_user_name(&typed, config.default_user_name.as_deref())
        }
    };

    let persona = Persona::load(
        &config.persona.assistant_name,
        &config.persona.system_prompt_file,
        &config.persona.context_file,
    );

    let settings = PipelineSettings::from_config(&config);
    let router = mira_providers::router::build_from_config(&config);
    let provider = router.default().ok_or("No default provider configured")?;
    info!(
        provider = provider.name(),
        model = %settings.model,
        "LLM set up"
    );

    eprint!("  Indexing documents...");
    let embedder = super::build_embedder(&config)?;
    let (index, report) = super::build_index(&config, embedder).await?;
    eprint!("\r                        \r");
    if !report.skipped.is_empty() {
        eprintln!("  {} file(s) could not be loaded (see logs)", report.skipped.len());
    }

    let transcript = TranscriptLogger::create(
        &config.rag.docs_folder,
        &user_name,
        Local::now().naive_local(),
    )?;

    let assistant = persona.assistant_name.clone();
    let chunk_count = index.len();
    let mut pipeline = ResponsePipeline::new(
        provider,
        index,
        persona,
        transcript,
        &user_name,
        settings,
    );

    println!();
    println!(
        "{assistant} is initialized and ready to chat. Type your messages. Type 'exit' to end the conversation."
    );
    println!("  Documents: {} chunks from {} files", chunk_count, report.files_loaded);
    println!("  Transcript: {}", pipeline.transcript_path().display());
    println!("  Set a title with /title <text>");
    println!();

    let end = chat_loop(
        &mut pipeline,
        &mut lines,
        tokio::signal::ctrl_c(),
        &mut std::io::stdout(),
        &mut std::io::stderr(),
    )
    .await?;

    match end {
        LoopEnd::Interrupted => {
            println!();
            println!("Conversation ended by user interruption.");
        }
        LoopEnd::InputClosed => println!(),
        LoopEnd::Exit => {}
    }

    println!("{assistant}'s going offline now. The conversation has been saved!");
    Ok(())
}

/// Why the chat loop stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LoopEnd {
    /// The user typed `exit`
    Exit,
    /// stdin was closed
    InputClosed,
    /// Ctrl+C, while waiting for input or during a turn
    Interrupted,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LineOutcome {
    Continue,
    Exit,
}

/// Read lines and answer them until `exit`, end of input or `interrupt`.
///
/// `interrupt` is polled for the whole session, so a signal that arrives
/// mid-turn cancels the turn. A cancelled turn records nothing.
async fn chat_loop<F: Future>(
    pipeline: &mut ResponsePipeline,
    lines: &mut mpsc::Receiver<String>,
    interrupt: F,
    out: &mut impl Write,
    err: &mut impl Write,
) -> std::io::Result<LoopEnd> {
    let mut interrupt = pin!(interrupt);

    loop {
        write!(out, "You: ")?;
        out.flush()?;

        let line = tokio::select! {
            line = lines.recv() => line,
            _ = &mut interrupt => return Ok(LoopEnd::Interrupted),
        };

        let Some(line) = line else {
            return Ok(LoopEnd::InputClosed);
        };

        let outcome = tokio::select! {
            outcome = handle_line(pipeline, &line, out, err) => outcome?,
            _ = &mut interrupt => {
                info!("Turn cancelled by interrupt");
                return Ok(LoopEnd::Interrupted);
            }
        };

        if outcome == LineOutcome::Exit {
            return Ok(LoopEnd::Exit);
        }
    }
}

/// Handle one line of user input.
///
/// Per-turn failures are written to `err` and the session goes on.
async fn handle_line(
    pipeline: &mut ResponsePipeline,
    line: &str,
    out: &mut impl Write,
    err: &mut impl Write,
) -> std::io::Result<LineOutcome> {
    let input = line.trim();
    if input.is_empty() {
        return Ok(LineOutcome::Continue);
    }
    if input.eq_ignore_ascii_case("exit") {
        return Ok(LineOutcome::Exit);
    }

    if let Some(title) = title_command(input) {
        if title.is_empty() {
            writeln!(err, "Usage: /title <text>")?;
        } else {
            match pipeline.set_title(title) {
                Ok(()) => writeln!(out, "Conversation title updated: {title}")?,
                Err(e) => writeln!(err, "Error: {e}")?,
            }
        }
        return Ok(LineOutcome::Continue);
    }

    match pipeline.respond(input).await {
        Ok(reply) => {
            writeln!(out, "{}: {}", pipeline.persona().assistant_name, reply.answer)?;
            if let Some(e) = reply.transcript_error {
                writeln!(err, "Warning: this turn was not saved to the transcript: {e}")?;
            }
        }
        Err(e) => writeln!(err, "Error: {e}")?,
    }

    Ok(LineOutcome::Continue)
}

/// The trimmed argument of a `/title` command, if `input` is one.
fn title_command(input: &str) -> Option<&str> {
    let rest = input.strip_prefix("/title")?;
    if rest.is_empty() || rest.starts_with(char::is_whitespace) {
        Some(rest.trim())
    } else {
        None
    }
}

/// Lowercase the typed name; fall back to the configured default.
fn resolve_user_name(typed: &str, default: Option<&str>) -> String {
    let typed = typed.trim().to_lowercase();
    if !typed.is_empty() {
        return typed;
    }
    default
        .map(str::trim)
        .filter(|d| !d.is_empty())
        .unwrap_or(FALLBACK_USER_NAME)
        .to_string()
}

fn prompt(text: &str) -> std::io::Result<()> {
    print!("{text}");
    std::io::stdout().flush()
}

/// Read stdin line by line on a background task.
fn spawn_line_reader() -> mpsc::Receiver<String> {
    let (tx, rx) = mpsc::channel(32);

    tokio::spawn(async move {
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        while let Ok(Some(line)) = lines.next_line().await {
            if tx.send(line).await.is_err() {
                break;
            }
        }
    });

    rx
}

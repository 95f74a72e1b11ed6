// SPDX-FileCopyrightText: 2026 Fable Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `fable chat` command implementation.
//!
//! Loads (or generates) the persona, seeds a conversation with the corpus
//! summaries, and runs a readline REPL until `/quit`, Ctrl+C or Ctrl+D.

use std::sync::Arc;

use colored::Colorize;
use fable_agent::Conversation;
use fable_config::model::FableConfig;
use fable_core::{CompletionAdapter, FableError, SystemClock};
use fable_memory::MemoryServices;
use fable_openai::OpenAiAdapter;
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;
use tracing::{info, warn};

use crate::corpus::CorpusPaths;
use crate::persona::persona_with;

/// What the REPL should do with one input line.
#[derive(Debug, PartialEq, Eq)]
enum Input<'a> {
    Quit,
    Clear,
    Skip,
    Message(&'a str),
}

fn classify(line: &str) -> Input<'_> {
    match line.trim() {
        "/quit" | "/exit" => Input::Quit,
        "/clear" => Input::Clear,
        "" => Input::Skip,
        text => Input::Message(text),
    }
}

/// Runs the `fable chat` interactive REPL.
pub async fn run_chat(
    config: &FableConfig,
    corpus: &str,
    name: &str,
    force_refresh: bool,
) -> Result<(), FableError> {
    let adapter = Arc::new(OpenAiAdapter::new(&config.openai).inspect_err(|_| {
        eprintln!(
            "error: OpenAI API key required. Set it via config or the {} env var",
            fable_openai::API_KEY_ENV
        );
    })?);
    let completion: Arc<dyn CompletionAdapter> = adapter.clone();

    let paths = CorpusPaths::new(&config.storage.output_dir, corpus);
    let persona = persona_with(completion.clone(), &config.persona, &paths, name, force_refresh).await?;
    let summaries = paths.summaries().await?;

    let services = MemoryServices {
        completion,
        embedder: adapter,
        clock: Arc::new(SystemClock),
    };
    let mut conversation = Conversation::new(
        persona,
        config.memory.chatbot,
        &config.memory,
        services,
        summaries,
    )
    .await?;
    info!(session_id = conversation.session_id(), "chat session started");

    let mut rl = DefaultEditor::new()
        .map_err(|e| FableError::Internal(format!("failed to initialize readline: {e}")))?;

    let speaker = format!("{}:", conversation.persona().name).bold().cyan();
    println!(
        "Chatting with {} ({}). Type {} to start over, {} to exit.\n",
        conversation.persona().name.bold(),
        conversation.kind(),
        "/clear".yellow(),
        "/quit".yellow()
    );
    println!("{speaker} {}", conversation.greet());

    let prompt = format!("{} ", "You:".green());
    loop {
        match rl.readline(&prompt) {
            Ok(line) => match classify(&line) {
                Input::Quit => break,
                Input::Skip => continue,
                Input::Clear => {
                    conversation.clear().await?;
                    println!("{}", "conversation cleared".dimmed());
                    println!("{speaker} {}", conversation.greet());
                }
                Input::Message(text) => {
                    let _ = rl.add_history_entry(line.as_str());
                    match conversation.step(text).await {
                        Ok(reply) => println!("{speaker} {reply}"),
                        Err(e) if e.is_fatal() => return Err(e),
                        Err(e) => {
                            warn!(error = %e, "turn failed");
                            eprintln!("{} [{}]: {e}", "error".red(), e.kind());
                        }
                    }
                }
            },
            Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => break,
            Err(e) => {
                eprintln!("{}: {e}", "error".red());
                break;
            }
        }
    }

    println!(
        "{}",
        format!("{} turns this session", conversation.transcript().len()).dimmed()
    );
    Ok(())
}

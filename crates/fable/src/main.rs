// SPDX-FileCopyrightText: 2026 Fable Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Fable - chat with characters from any story.
//!
//! This is the binary entry point.

#[cfg(not(target_env = "msvc"))]
use tikv_jemallocator::Jemalloc;

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: Jemalloc = Jemalloc;

mod chat;
mod corpus;
mod persona;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use colored::Colorize;
use fable_config::model::FableConfig;
use fable_core::{ChatbotKind, FableError};

/// Fable - chat with characters from any story.
#[derive(Parser, Debug)]
#[command(name = "fable", version, about, long_about = None)]
struct Cli {
    /// Read configuration from this file instead of the standard locations.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Import rolling summaries for a corpus from a text file.
    ///
    /// Summaries in the file are separated by lines containing only `---`.
    Import {
        /// Corpus name; artifacts live under `<output_dir>/<corpus>/`.
        corpus: String,
        /// File holding the summaries.
        file: PathBuf,
    },
    /// List the most important characters of a corpus.
    Characters {
        corpus: String,
        /// Regenerate even if a cached list exists.
        #[arg(long)]
        force_refresh: bool,
    },
    /// Generate (or load) a character's persona and print it as JSON.
    Persona {
        corpus: String,
        name: String,
        #[arg(long)]
        force_refresh: bool,
    },
    /// Chat with a character.
    Chat {
        corpus: String,
        name: String,
        /// Chatbot flavour: summary, retrieval, summary_retrieval, or generative.
        #[arg(long)]
        chatbot: Option<String>,
        #[arg(long)]
        force_refresh: bool,
    },
    /// Validate and print the effective configuration.
    Config,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let loaded = match &cli.config {
        Some(path) => fable_config::load_and_validate_path(path),
        None => fable_config::load_and_validate(),
    };
    let config = match loaded {
        Ok(config) => config,
        Err(errors) => {
            fable_config::render_errors(&errors);
            std::process::exit(1);
        }
    };

    init_tracing(&config.agent.log_level);

    if let Err(e) = run(cli.command, config).await {
        eprintln!("{} [{}]: {e}", "error".red(), e.kind());
        std::process::exit(1);
    }
}

async fn run(command: Option<Commands>, mut config: FableConfig) -> Result<(), FableError> {
    match command {
        Some(Commands::Import { corpus, file }) => {
            let paths = corpus::CorpusPaths::new(&config.storage.output_dir, &corpus);
            let count = corpus::import_summaries(&paths, &file).await?;
            println!("imported {count} summaries into {}", paths.summaries_dir().display());
        }
        Some(Commands::Characters {
            corpus,
            force_refresh,
        }) => {
            let names = persona::list_characters(&config, &corpus, force_refresh).await?;
            for name in names {
                println!("{name}");
            }
        }
        Some(Commands::Persona {
            corpus,
            name,
            force_refresh,
        }) => {
            let persona = persona::load_persona(&config, &corpus, &name, force_refresh).await?;
            let json = serde_json::to_string_pretty(&persona)
                .map_err(|e| FableError::Internal(e.to_string()))?;
            println!("{json}");
        }
        Some(Commands::Chat {
            corpus,
            name,
            chatbot,
            force_refresh,
        }) => {
            if let Some(tag) = chatbot {
                config.memory.chatbot = ChatbotKind::parse(&tag)?;
            }
            chat::run_chat(&config, &corpus, &name, force_refresh).await?;
        }
        Some(Commands::Config) => {
            let rendered = fable_config::render_effective(&config)
                .map_err(|e| FableError::Config(e.to_string()))?;
            print!("{rendered}");
        }
        None => {
            println!("fable: use --help for available commands");
        }
    }
    Ok(())
}

/// Initializes the tracing subscriber with the given log level.
fn init_tracing(log_level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("fable={log_level},warn")));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    #[cfg(not(target_env = "msvc"))]
    fn jemalloc_is_active() {
        // Only jemalloc can advance the stats epoch.
        use tikv_jemalloc_ctl::{epoch, stats};
        epoch::advance().unwrap();
        let allocated = stats::allocated::read().unwrap();
        assert!(allocated > 0, "jemalloc should report non-zero allocation");
    }

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn chat_accepts_chatbot_override() {
        let cli = Cli::parse_from(["fable", "chat", "gatsby", "Nick", "--chatbot", "retrieval"]);
        match cli.command {
            Some(Commands::Chat { corpus, name, chatbot, .. }) => {
                assert_eq!(corpus, "gatsby");
                assert_eq!(name, "Nick");
                assert_eq!(chatbot.as_deref(), Some("retrieval"));
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[tokio::test]
    async fn unknown_chatbot_is_config_error() {
        let command = Commands::Chat {
            corpus: "gatsby".into(),
            name: "Nick".into(),
            chatbot: Some("telepathic".into()),
            force_refresh: false,
        };
        let err = run(Some(command), FableConfig::default()).await.unwrap_err();
        assert_eq!(err.kind(), "configuration");
    }

    #[test]
    fn default_config_renders() {
        let rendered = fable_config::render_effective(&FableConfig::default()).unwrap();
        assert!(rendered.contains("[memory]"));
    }
}

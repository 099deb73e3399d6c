//! pdfchat: ingest documents and ask questions about them from the terminal.

mod commands;
mod console;

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use pdfchat_service::{AppConfig, ChatService, DEFAULT_CONVERSATION_ID};
use pdfchat_telemetry::{TelemetryOptions, init_with_options};

/// Chat with your PDFs
#[derive(Parser, Debug)]
#[command(name = "pdfchat", version, about, long_about = None)]
struct Cli {
    /// Print results as JSON instead of text
    #[arg(long, global = true)]
    json: bool,

    /// Log filter used when RUST_LOG is unset
    #[arg(long, global = true, default_value = pdfchat_telemetry::DEFAULT_LOG_LEVEL)]
    log_level: String,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug, PartialEq)]
enum Command {
    /// Index a document, replacing any earlier version with the same name
    Ingest {
        /// File to index (.pdf, .txt or .md)
        path: PathBuf,
        /// Name to index the document under (defaults to the file name)
        #[arg(long)]
        name: Option<String>,
    },
    /// Replace an already indexed document
    Update {
        path: PathBuf,
        #[arg(long)]
        name: Option<String>,
    },
    /// Remove every chunk of a document
    Delete { filename: String },
    /// List indexed documents with their chunk counts
    List,
    /// Show one indexed document
    Info { filename: String },
    /// Show the passages nearest to a query
    Search {
        query: String,
        /// Number of passages (defaults to the configured top-k)
        #[arg(short, long)]
        k: Option<usize>,
    },
    /// Ask a single question
    Ask {
        message: String,
        #[arg(short, long, default_value = DEFAULT_CONVERSATION_ID)]
        conversation: String,
        /// Answer without consulting indexed documents
        #[arg(long)]
        no_context: bool,
    },
    /// Interactive chat session (the default)
    Chat {
        #[arg(short, long, default_value = DEFAULT_CONVERSATION_ID)]
        conversation: String,
        #[arg(long)]
        no_context: bool,
    },
    /// List conversation ids (stored next to the index unless
    /// PDFCHAT_CONVERSATION_DB says otherwise)
    Conversations,
    /// Print the turns of a conversation
    History { conversation: String },
    /// Forget a conversation
    Clear { conversation: String },
    /// Check the index and providers
    Health,
}

/// With a persistent index and no explicit `PDFCHAT_CONVERSATION_DB`,
/// conversations are kept next to the index so separate invocations share them.
fn default_conversation_db(index_path: Option<&Path>) -> Option<PathBuf> {
    if !cfg!(feature = "database") {
        return None;
    }
    let index_path = index_path?;
    let dir = index_path.parent().unwrap_or_else(|| Path::new(""));
    Some(dir.join(CONVERSATION_DB_FILE))
}

const CONVERSATION_DB_FILE: &str = "conversations.db";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config = AppConfig::from_env()?;
    if config.conversation_db.is_none() {
        config.conversation_db = default_conversation_db(config.index_path.as_deref());
    }
    init_with_options(
        TelemetryOptions::new("pdfchat")
            .with_format(config.log_format)
            .with_default_filter(cli.log_level.as_str()),
    )?;

    let service = ChatService::from_config(&config).await?;
    let output = commands::Output { json: cli.json };

    match cli.command.unwrap_or(Command::Chat {
        conversation: DEFAULT_CONVERSATION_ID.to_string(),
        no_context: false,
    }) {
        Command::Ingest { path, name } => commands::ingest(&service, &path, name, output).await,
        Command::Update { path, name } => commands::update(&service, &path, name, output).await,
        Command::Delete { filename } => commands::delete(&service, &filename, output).await,
        Command::List => commands::list(&service, output).await,
        Command::Info { filename } => commands::info(&service, &filename, output).await,
        Command::Search { query, k } => {
            let k = k.unwrap_or_else(|| service.top_k());
            commands::search(&service, &query, k, output).await
        }
        Command::Ask { message, conversation, no_context } => {
            commands::ask(&service, message, conversation, !no_context, output).await
        }
        Command::Chat { conversation, no_context } => {
            console::run_console(&service, conversation, !no_context).await
        }
        Command::Conversations => commands::conversations(&service, output).await,
        Command::History { conversation } => {
            commands::history(&service, &conversation, output).await
        }
        Command::Clear { conversation } => commands::clear(&service, &conversation).await,
        Command::Health => commands::health(&service, output).await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn ask_defaults_to_grounded_default_conversation() {
        let cli = Cli::try_parse_from(["pdfchat", "ask", "What is covered?"]).unwrap();
        assert_eq!(
            cli.command,
            Some(Command::Ask {
                message: "What is covered?".to_string(),
                conversation: "default".to_string(),
                no_context: false,
            })
        );
    }

    #[test]
    fn search_accepts_short_k_and_global_json() {
        let cli = Cli::try_parse_from(["pdfchat", "search", "leave policy", "-k", "3", "--json"])
            .unwrap();
        assert!(cli.json);
        assert_eq!(
            cli.command,
            Some(Command::Search { query: "leave policy".to_string(), k: Some(3) })
        );
    }

    #[test]
    #[cfg(feature = "database")]
    fn conversations_default_to_the_index_directory() {
        assert_eq!(
            default_conversation_db(Some(Path::new("./pdfchat_data/index.db"))),
            Some(PathBuf::from("./pdfchat_data/conversations.db"))
        );
        assert_eq!(default_conversation_db(None), None);
    }

    #[test]
    fn no_subcommand_means_interactive_chat() {
        let cli = Cli::try_parse_from(["pdfchat"]).unwrap();
        assert!(cli.command.is_none());
    }
}

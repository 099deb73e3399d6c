//! Interactive chat loop.

use pdfchat_service::{ChatRequest, ChatService};
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;
use tracing::warn;

use crate::commands::print_reply;

const HELP: &str = "Commands: /history, /clear, /sources on|off, /help, /exit";

#[derive(Debug, PartialEq, Eq)]
enum Input<'a> {
    Message(&'a str),
    History,
    Clear,
    Sources(bool),
    Help,
    Exit,
    Unknown(&'a str),
    Blank,
}

fn parse_input(line: &str) -> Input<'_> {
    let line = line.trim();
    if line.is_empty() {
        return Input::Blank;
    }
    let Some(command) = line.strip_prefix('/') else {
        return Input::Message(line);
    };
    match command.split_whitespace().collect::<Vec<_>>().as_slice() {
        ["exit"] | ["quit"] => Input::Exit,
        ["history"] => Input::History,
        ["clear"] => Input::Clear,
        ["help"] => Input::Help,
        ["sources", "on"] => Input::Sources(true),
        ["sources", "off"] => Input::Sources(false),
        _ => Input::Unknown(line),
    }
}

pub(crate) async fn run_console(
    service: &ChatService,
    conversation: String,
    mut use_context: bool,
) -> anyhow::Result<()> {
    let mut editor = DefaultEditor::new()?;
    println!("Chatting in conversation '{conversation}'. {HELP}");

    loop {
        let line = match editor.readline("You > ") {
            Ok(line) => line,
            Err(ReadlineError::Interrupted | ReadlineError::Eof) => break,
            Err(err) => return Err(err.into()),
        };
        let _ = editor.add_history_entry(line.as_str());

        match parse_input(&line) {
            Input::Blank => continue,
            Input::Exit => break,
            Input::Help => println!("{HELP}"),
            Input::Unknown(command) => println!("Unknown command {command}. {HELP}"),
            Input::Sources(enabled) => {
                use_context = enabled;
                println!("Document retrieval {}", if enabled { "enabled" } else { "disabled" });
            }
            Input::Clear => {
                service.clear_conversation(&conversation).await?;
                println!("Conversation cleared.");
            }
            Input::History => match service.conversation_history(&conversation).await {
                Ok(turns) => {
                    for turn in turns {
                        println!("{}: {}", turn.role, turn.content);
                    }
                }
                Err(err) if err.is_client_error() => println!("No messages yet."),
                Err(err) => return Err(err.into()),
            },
            Input::Message(message) => {
                let mut request = ChatRequest::new(message).in_conversation(conversation.as_str());
                request.use_context = use_context;
                match service.chat(request).await {
                    Ok(reply) => {
                        println!();
                        print_reply(&reply);
                        println!();
                    }
                    // A failed exchange leaves the conversation intact, so keep going.
                    Err(err) => {
                        warn!(error = %err, "chat request failed");
                        eprintln!("Error: {err}");
                    }
                }
            }
        }
    }

    Ok(())
}

//! Interactive chat client for a RAG-backed chat service.
//!
//! This binary provides a REPL that keeps a resilient session against the
//! service: health is polled in the background of the prompt loop, failed
//! sends surface as friendly assistant messages, and fenced code blocks in
//! replies can be expanded and collapsed in place.
//!
//! # Usage
//!
//! ```bash
//! # Talk to a local server
//! ragline-chat
//!
//! # Point at a remote server
//! ragline-chat --url http://chat.example.com:8000/
//!
//! # Disable colors (useful for piping output)
//! ragline-chat --no-color
//! ```
//!
//! # Commands
//!
//! While chatting, you can use slash commands:
//! - `/help` - Show available commands
//! - `/status` - Show connectivity and session details
//! - `/poll` - Probe the service's health now
//! - `/reset` - Drop the session token
//! - `/expand <id>` / `/collapse <id>` - Toggle code blocks
//! - `/quit` - Exit the application

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;

use arrrg::CommandLine;
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;

use ragline::commands::{ChatCommand, help_text, parse_command};
use ragline::parse::parse_message;
use ragline::render::{CollapseState, PlainTextRenderer, Renderer};
use ragline::store::FileTokenStore;
use ragline::{
    ChatArgs, ChatConfig, ConversationPipeline, HttpTransport, Message, MessageRole,
    SessionManager, SubmitOutcome,
};

/// Main entry point for the ragline-chat application.
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let (args, _) = ChatArgs::from_command_line_relaxed("ragline-chat [OPTIONS]");
    let config = ChatConfig::from(args);
    let use_color = config.use_color;

    let transport = Arc::new(HttpTransport::with_options(
        config.base_url.clone(),
        Some(config.send_timeout),
    )?);
    let store = Box::new(FileTokenStore::new(&config.session_file));
    let mut session = SessionManager::new(transport.clone(), store);
    let mut pipeline = ConversationPipeline::new(transport.clone(), config.clone());
    let mut renderer = PlainTextRenderer::with_color(use_color);
    let mut collapse = CollapseState::new();
    let mut rl = DefaultEditor::new()?;

    // Flag for exit requests arriving outside the prompt.
    let interrupted = Arc::new(AtomicBool::new(false));
    let interrupted_clone = interrupted.clone();
    ctrlc::set_handler(move || {
        interrupted_clone.store(true, Ordering::Relaxed);
    })?;

    println!("ragline chat (server: {})", transport.base_url());
    println!("Type /help for commands, /quit to exit\n");

    let resolved = session.initialize().await?;
    renderer.print_status(resolved, pipeline.placeholder(&session));

    let mut last_poll = Instant::now();
    let mut rendered = 0usize;

    loop {
        if interrupted.load(Ordering::Relaxed) {
            println!("\nGoodbye!");
            break;
        }

        // Cooperative stand-in for a timer: probe whenever the interval has
        // elapsed since the last probe.
        if last_poll.elapsed() >= config.poll_interval {
            if let Some(connectivity) = session.poll_health().await {
                renderer.print_status(connectivity, pipeline.placeholder(&session));
            }
            last_poll = Instant::now();
        }

        let readline = rl.readline("You: ");

        match readline {
            Ok(line) => {
                let line = line.trim();
                if line.is_empty() {
                    continue;
                }

                let _ = rl.add_history_entry(line);

                if let Some(cmd) = parse_command(line) {
                    match cmd {
                        ChatCommand::Quit => {
                            println!("Goodbye!");
                            break;
                        }
                        ChatCommand::Help => {
                            for line in help_text().lines() {
                                println!("    {}", line);
                            }
                        }
                        ChatCommand::Status => {
                            print_status(&session, &pipeline);
                        }
                        ChatCommand::Poll => {
                            match session.poll_health().await {
                                Some(connectivity) => renderer
                                    .print_info(&format!("Connectivity changed: {connectivity}")),
                                None => renderer.print_info(&format!(
                                    "Connectivity unchanged: {}",
                                    session.connectivity()
                                )),
                            }
                            last_poll = Instant::now();
                        }
                        ChatCommand::Reset => match session.reset() {
                            Ok(()) => renderer.print_info("Session token cleared."),
                            Err(err) => {
                                renderer.print_error(&format!("Failed to reset session: {}", err))
                            }
                        },
                        ChatCommand::Expand(id) => {
                            collapse.expand(&id);
                            rerender_block_message(&pipeline, &id, &mut renderer, &collapse);
                        }
                        ChatCommand::Collapse(id) => {
                            collapse.collapse(&id);
                            rerender_block_message(&pipeline, &id, &mut renderer, &collapse);
                        }
                        ChatCommand::Invalid(message) => {
                            renderer.print_error(&message);
                        }
                    }
                    continue;
                }

                // Regular message - send to the service.
                renderer.print_typing();
                let outcome = pipeline.submit(line, &mut session).await;
                render_new_messages(&pipeline, &mut renderer, &collapse, &mut rendered);

                match outcome {
                    SubmitOutcome::Delivered => {
                        if let Some(seconds) = pipeline.last_request_time() {
                            renderer.print_info(&format!("(answered in {seconds:.2}s)"));
                        }
                    }
                    SubmitOutcome::Rejected(_) => {
                        renderer
                            .print_status(session.connectivity(), pipeline.placeholder(&session));
                    }
                    SubmitOutcome::Failed(_) => {}
                }
            }
            Err(ReadlineError::Interrupted) => {
                // Ctrl+C at prompt - soft interrupt
                println!();
                continue;
            }
            Err(ReadlineError::Eof) => {
                // Ctrl+D - exit
                println!("\nGoodbye!");
                break;
            }
            Err(err) => {
                renderer.print_error(&format!("Input error: {}", err));
                break;
            }
        }
    }

    Ok(())
}

/// Renders log entries appended since the last render.
fn render_new_messages(
    pipeline: &ConversationPipeline<HttpTransport>,
    renderer: &mut PlainTextRenderer,
    collapse: &CollapseState,
    rendered: &mut usize,
) {
    let messages = pipeline.messages();
    for message in &messages[*rendered..] {
        render_message(message, renderer, collapse);
    }
    *rendered = messages.len();
}

fn render_message(message: &Message, renderer: &mut PlainTextRenderer, collapse: &CollapseState) {
    match message.role {
        // The user's own text was just typed; skip echoing it.
        MessageRole::User => {}
        MessageRole::Assistant => {
            let segments = parse_message(&message.content, message.sequence as usize);
            renderer.print_assistant(&segments, collapse);
        }
    }
}

/// Re-renders the message containing the given block id, if it exists.
fn rerender_block_message(
    pipeline: &ConversationPipeline<HttpTransport>,
    block_id: &str,
    renderer: &mut PlainTextRenderer,
    collapse: &CollapseState,
) {
    let Some(sequence) = block_id
        .split('-')
        .next()
        .and_then(|s| s.parse::<u64>().ok())
    else {
        renderer.print_error(&format!("Malformed block id: {}", block_id));
        return;
    };
    match pipeline.messages().iter().find(|m| m.sequence == sequence) {
        Some(message) => render_message(message, renderer, collapse),
        None => renderer.print_error(&format!("No message with block id: {}", block_id)),
    }
}

fn print_status(
    session: &SessionManager<HttpTransport>,
    pipeline: &ConversationPipeline<HttpTransport>,
) {
    println!("    Session Status:");
    println!("      Connectivity: {}", session.connectivity());
    match session.last_error() {
        Some(kind) => println!("      Last failure: {:?}", kind),
        None => println!("      Last failure: (none)"),
    }
    match session.session_token() {
        Some(token) => println!("      Session token: {}", token),
        None => println!("      Session token: (none)"),
    }
    println!("      Messages: {}", pipeline.message_count());
    println!(
        "      Pending request: {}",
        if pipeline.is_pending() { "yes" } else { "no" }
    );
    match pipeline.last_request_time() {
        Some(seconds) => println!("      Last request time: {seconds:.2}s"),
        None => println!("      Last request time: (none)"),
    }
}

//! Interactive loop
//!
//! One task multiplexes two sources: lines typed on stdin and messages from
//! running streams. Everything that touches [`App`] happens here, so state
//! changes are applied in arrival order without locking.

use std::error::Error;

use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tracing::debug;

use crate::commands::{process_input, CommandResult};
use crate::core::access_code::generate_code;
use crate::core::app::App;
use crate::core::chat_stream::StreamEnvelope;
use crate::core::constants::CODE_MIN_LENGTH;

const ACCESS_PROMPT: &str =
    "Enter your access code, or press Enter to generate a new one. Type /help for commands.";

#[derive(Debug, Clone, Default)]
pub struct ChatOptions {
    /// Enter this session immediately instead of prompting.
    pub code: Option<String>,
    pub incognito: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Flow {
    Continue,
    Quit,
}

/// Run the chat loop on stdin until `/quit` or end of input.
pub async fn run_chat(
    app: &mut App,
    rx: &mut mpsc::UnboundedReceiver<StreamEnvelope>,
    options: &ChatOptions,
) -> Result<(), Box<dyn Error>> {
    let stdin = BufReader::new(tokio::io::stdin());
    drive(app, rx, stdin, options).await?;
    Ok(())
}

/// The loop itself, over any line source. Once input ends, outstanding
/// streams are allowed to finish before returning.
pub async fn drive<R>(
    app: &mut App,
    rx: &mut mpsc::UnboundedReceiver<StreamEnvelope>,
    input: R,
    options: &ChatOptions,
) -> std::io::Result<()>
where
    R: AsyncBufRead + Unpin,
{
    start(app, options);

    let mut lines = input.lines();
    let mut input_open = true;
    loop {
        if !input_open && !app.has_pending_streams() {
            break;
        }
        tokio::select! {
            line = lines.next_line(), if input_open => match line? {
                Some(line) => {
                    if handle_line(app, &line) == Flow::Quit {
                        debug!("quit requested");
                        break;
                    }
                }
                None => input_open = false,
            },
            Some(envelope) = rx.recv() => app.handle_stream_message(envelope),
            else => break,
        }
    }
    Ok(())
}

fn start(app: &mut App, options: &ChatOptions) {
    if options.incognito {
        app.toggle_incognito(Some(true));
    }

    let entered = match options.code.as_deref() {
        Some(code) => Some(app.enter_session(code)),
        None => app.resume(),
    };
    match entered {
        Some(Ok(())) => announce_session(app),
        Some(Err(err)) => {
            app.notice(&err.to_string());
            app.notice(ACCESS_PROMPT);
        }
        None => app.notice(ACCESS_PROMPT),
    }
}

fn handle_line(app: &mut App, line: &str) -> Flow {
    if app.state().is_none() && !line.trim_start().starts_with('/') {
        enter_from_prompt(app, line);
        return Flow::Continue;
    }

    match process_input(app, line) {
        CommandResult::Quit => Flow::Quit,
        CommandResult::Continue => Flow::Continue,
        CommandResult::ProcessAsMessage(text) => {
            if let Err(err) = app.submit_turn(&text) {
                app.notice(&err.to_string());
            }
            Flow::Continue
        }
    }
}

fn enter_from_prompt(app: &mut App, line: &str) {
    let code = if line.trim().is_empty() {
        match generate_code(CODE_MIN_LENGTH) {
            Ok(code) => {
                app.notice(&format!(
                    "Your new access code is {code}. Keep it to return to this conversation."
                ));
                code.as_str().to_string()
            }
            Err(err) => {
                app.notice(&format!("Could not generate a code: {err}"));
                return;
            }
        }
    } else {
        line.to_string()
    };

    match app.enter_session(&code) {
        Ok(()) => announce_session(app),
        Err(err) => app.notice(&err.to_string()),
    }
}

fn announce_session(app: &mut App) {
    let Some(state) = app.state() else {
        return;
    };
    let mut message = format!("Session {}", state.code);
    if state.is_incognito {
        message.push_str(" (incognito)");
    }
    let needs_key = state.session.api_key.is_empty();
    message.push_str(" ready.");
    if needs_key {
        message.push_str(" Set your OpenRouter API key with /key.");
    }
    app.notice(&message);
}

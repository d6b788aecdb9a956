//! Slash commands typed at the chat prompt

mod registry;

pub use registry::{all_commands, CommandInvocation};

use crate::core::app::App;
use crate::core::errors::AppError;
use crate::core::session::Theme;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandResult {
    Continue,
    ProcessAsMessage(String),
    Quit,
}

pub fn process_input(app: &mut App, input: &str) -> CommandResult {
    let trimmed = input.trim();

    let Some(rest) = trimmed.strip_prefix('/') else {
        return CommandResult::ProcessAsMessage(input.to_string());
    };

    let mut parts = rest.splitn(2, char::is_whitespace);
    let command_name = match parts.next() {
        Some(name) if !name.is_empty() => name,
        _ => return CommandResult::ProcessAsMessage(input.to_string()),
    };
    let args = parts.next().unwrap_or("").trim();

    match registry::find_command(command_name) {
        Some(command) => {
            let invocation = CommandInvocation {
                input: trimmed,
                args,
            };
            (command.handler)(app, invocation)
        }
        None => {
            app.notice(&format!("Unknown command: /{command_name}. Try /help."));
            CommandResult::Continue
        }
    }
}

fn report(app: &mut App, result: Result<String, AppError>) -> CommandResult {
    match result {
        Ok(message) => app.notice(&message),
        Err(err) => app.notice(&err.to_string()),
    }
    CommandResult::Continue
}

fn usage(app: &mut App, invocation: CommandInvocation<'_>) -> CommandResult {
    let name = invocation
        .input
        .trim_start_matches('/')
        .split_whitespace()
        .next()
        .unwrap_or_default();
    if let Some(command) = registry::find_command(name) {
        app.notice(&format!("Usage: {}", command.usage));
    }
    CommandResult::Continue
}

pub(super) fn handle_help(app: &mut App, _invocation: CommandInvocation<'_>) -> CommandResult {
    let width = all_commands()
        .iter()
        .map(|c| c.usage.len())
        .max()
        .unwrap_or(0);
    let mut help = String::from("Commands:");
    for command in all_commands() {
        help.push_str(&format!("\n  {:width$}  {}", command.usage, command.help));
    }
    help.push_str("\nAnything else is sent to every active model.");
    app.notice(&help);
    CommandResult::Continue
}

pub(super) fn handle_key(app: &mut App, invocation: CommandInvocation<'_>) -> CommandResult {
    if invocation.args.is_empty() {
        let message = match app.state() {
            Some(state) if !state.session.api_key.is_empty() => "API key is set.",
            Some(_) => "No API key set. Use /key API_KEY.",
            None => "Enter an access code first.",
        };
        app.notice(message);
        return CommandResult::Continue;
    }
    let result = app
        .set_api_key(invocation.args)
        .map(|_| "API key saved.".to_string());
    report(app, result)
}

pub(super) fn handle_prompt(app: &mut App, invocation: CommandInvocation<'_>) -> CommandResult {
    if invocation.args.is_empty() {
        let message = match app.state() {
            Some(state) => format!("System prompt: {}", state.session.system_prompt),
            None => "Enter an access code first.".to_string(),
        };
        app.notice(&message);
        return CommandResult::Continue;
    }
    let result = app
        .set_system_prompt(invocation.args)
        .map(|_| "System prompt saved.".to_string());
    report(app, result)
}

pub(super) fn handle_models(app: &mut App, _invocation: CommandInvocation<'_>) -> CommandResult {
    let Some(state) = app.state() else {
        app.notice("Enter an access code first.");
        return CommandResult::Continue;
    };
    let mut listing = String::from("Models:");
    for (i, entry) in state.model_entries().iter().enumerate() {
        listing.push_str(&format!(
            "\n  {:>2}. [{}] {} ({}){}",
            i + 1,
            if entry.active { "x" } else { " " },
            entry.label.name,
            entry.label.id,
            if entry.custom { " custom" } else { "" },
        ));
    }
    app.notice(&listing);
    CommandResult::Continue
}

/// Resolve a 1-based index from `/models` to a model id; anything else is
/// taken as an id.
fn resolve_model_id(app: &App, arg: &str) -> String {
    let entries = app.state().map(|s| s.model_entries()).unwrap_or_default();
    arg.parse::<usize>()
        .ok()
        .and_then(|n| n.checked_sub(1))
        .and_then(|i| entries.get(i))
        .map(|entry| entry.label.id.clone())
        .unwrap_or_else(|| arg.to_string())
}

pub(super) fn handle_model(app: &mut App, invocation: CommandInvocation<'_>) -> CommandResult {
    if invocation.args.is_empty() {
        return usage(app, invocation);
    }
    let id = resolve_model_id(app, invocation.args);
    let result = app.toggle_model(&id).map(|active| {
        let name = app
            .state()
            .map(|s| s.model_name(&id).to_string())
            .unwrap_or_else(|| id.clone());
        if active {
            format!("{name} activated.")
        } else {
            format!("{name} deactivated.")
        }
    });
    report(app, result)
}

pub(super) fn handle_add_model(app: &mut App, invocation: CommandInvocation<'_>) -> CommandResult {
    if invocation.args.is_empty() {
        return usage(app, invocation);
    }
    let result = app
        .add_custom_model(invocation.args)
        .map(|model| format!("Added {} ({}).", model.name, model.id));
    report(app, result)
}

pub(super) fn handle_rename_model(
    app: &mut App,
    invocation: CommandInvocation<'_>,
) -> CommandResult {
    let Some((id, name)) = invocation.args.split_once(char::is_whitespace) else {
        return usage(app, invocation);
    };
    let id = resolve_model_id(app, id);
    let result = app
        .rename_custom_model(&id, name)
        .map(|_| format!("Renamed {id} to {}.", name.trim()));
    report(app, result)
}

pub(super) fn handle_remove_model(
    app: &mut App,
    invocation: CommandInvocation<'_>,
) -> CommandResult {
    if invocation.args.is_empty() {
        return usage(app, invocation);
    }
    let id = resolve_model_id(app, invocation.args);
    let result = app
        .remove_custom_model(&id)
        .map(|_| format!("Removed {id}."));
    report(app, result)
}

pub(super) fn handle_reset_models(
    app: &mut App,
    _invocation: CommandInvocation<'_>,
) -> CommandResult {
    let result = app
        .reset_models()
        .map(|_| "Models reset to the defaults.".to_string());
    report(app, result)
}

pub(super) fn handle_theme(app: &mut App, invocation: CommandInvocation<'_>) -> CommandResult {
    let theme = if invocation.args.is_empty() {
        match app.theme() {
            Theme::Light => Theme::Dark,
            Theme::Dark => Theme::Snow,
            Theme::Snow => Theme::Light,
        }
    } else {
        match invocation.args.parse::<Theme>() {
            Ok(theme) => theme,
            Err(_) => return usage(app, invocation),
        }
    };
    app.switch_theme(theme);
    app.notice(&format!("Theme set: {}", theme.short_name()));
    CommandResult::Continue
}

pub(super) fn handle_incognito(app: &mut App, invocation: CommandInvocation<'_>) -> CommandResult {
    let force = match invocation.args.to_ascii_lowercase().as_str() {
        "" => None,
        "on" | "true" | "1" => Some(true),
        "off" | "false" | "0" => Some(false),
        _ => return usage(app, invocation),
    };
    let incognito = app.toggle_incognito(force);
    let pending = app
        .state()
        .is_some_and(|state| state.is_incognito != incognito);
    let mut message = if incognito {
        "Incognito on: nothing from the next session will be saved.".to_string()
    } else {
        "Incognito off: sessions are saved again.".to_string()
    };
    if pending {
        message.push_str(" The current session is unchanged until you /logout and enter a code.");
    }
    app.notice(&message);
    CommandResult::Continue
}

pub(super) fn handle_logout(app: &mut App, _invocation: CommandInvocation<'_>) -> CommandResult {
    app.logout();
    app.notice("Logged out. Enter an access code to continue.");
    CommandResult::Continue
}

pub(super) fn handle_reset(app: &mut App, _invocation: CommandInvocation<'_>) -> CommandResult {
    let result = app
        .reset_session()
        .map(|_| "Session data removed. Enter an access code to continue.".to_string());
    report(app, result)
}

pub(super) fn handle_quit(_app: &mut App, _invocation: CommandInvocation<'_>) -> CommandResult {
    CommandResult::Quit
}

use super::CommandResult;
use crate::core::app::App;

pub type CommandHandler = fn(&mut App, CommandInvocation<'_>) -> CommandResult;

pub struct Command {
    pub name: &'static str,
    pub usage: &'static str,
    pub help: &'static str,
    pub handler: CommandHandler,
}

#[derive(Clone, Copy)]
pub struct CommandInvocation<'a> {
    pub input: &'a str,
    pub args: &'a str,
}

pub fn all_commands() -> &'static [Command] {
    COMMANDS
}

pub fn find_command(name: &str) -> Option<&'static Command> {
    all_commands().iter().find(|command| {
        command.name.eq_ignore_ascii_case(name)
            || ALIASES
                .iter()
                .any(|(alias, target)| alias.eq_ignore_ascii_case(name) && *target == command.name)
    })
}

const ALIASES: &[(&str, &str)] = &[("exit", "quit"), ("q", "quit"), ("?", "help")];

const COMMANDS: &[Command] = &[
    Command {
        name: "help",
        usage: "/help",
        help: "Show available commands.",
        handler: super::handle_help,
    },
    Command {
        name: "key",
        usage: "/key [API_KEY]",
        help: "Set the OpenRouter API key for this session, or show whether one is set.",
        handler: super::handle_key,
    },
    Command {
        name: "prompt",
        usage: "/prompt [TEXT]",
        help: "Set the system prompt, or show the current one.",
        handler: super::handle_prompt,
    },
    Command {
        name: "models",
        usage: "/models",
        help: "List built-in and custom models with their active state.",
        handler: super::handle_models,
    },
    Command {
        name: "model",
        usage: "/model ID|NUMBER",
        help: "Toggle whether a model receives new messages.",
        handler: super::handle_model,
    },
    Command {
        name: "add-model",
        usage: "/add-model ID",
        help: "Add and activate a custom model.",
        handler: super::handle_add_model,
    },
    Command {
        name: "rename-model",
        usage: "/rename-model ID NAME",
        help: "Change the display name of a custom model.",
        handler: super::handle_rename_model,
    },
    Command {
        name: "remove-model",
        usage: "/remove-model ID",
        help: "Delete a custom model.",
        handler: super::handle_remove_model,
    },
    Command {
        name: "reset-models",
        usage: "/reset-models",
        help: "Remove all custom models and activate every built-in model.",
        handler: super::handle_reset_models,
    },
    Command {
        name: "theme",
        usage: "/theme [light|dark|snow]",
        help: "Switch the color theme, or cycle to the next one.",
        handler: super::handle_theme,
    },
    Command {
        name: "incognito",
        usage: "/incognito [on|off]",
        help: "Stop (or resume) saving this session to disk.",
        handler: super::handle_incognito,
    },
    Command {
        name: "logout",
        usage: "/logout",
        help: "Leave the current session.",
        handler: super::handle_logout,
    },
    Command {
        name: "reset",
        usage: "/reset",
        help: "Delete every saved turn and setting for the current code, then log out.",
        handler: super::handle_reset,
    },
    Command {
        name: "quit",
        usage: "/quit",
        help: "Exit.",
        handler: super::handle_quit,
    },
];

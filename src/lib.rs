//! Haream is a terminal client that sends one message to several AI chat
//! models at once and keeps each conversation under an access code.
//!
//! The crate is organized around a small set of collaborating layers:
//! - [`core`] owns sessions and their storage, preferences, the model
//!   catalog, and streaming orchestration through the application context.
//! - [`ui`] renders transcripts in the terminal and runs the interactive
//!   loop that drives user input and stream updates.
//! - [`commands`] implements slash-command parsing and execution used by the
//!   chat loop.
//! - [`api`] defines the chat completion payloads.
//!
//! Runtime entrypoints live in the binary crate (`src/main.rs`) and route
//! through [`crate::cli::main`], which loads configuration and dispatches into
//! [`core::app`] and [`ui::chat_loop`] for interactive sessions.

pub mod api;
pub mod cli;
pub mod commands;
pub mod core;
pub mod ui;
pub mod utils;

//! The presentation collaborator driven by the application core
//!
//! The core decides *what* is shown and *when*; implementations decide how.
//! Every call is self-contained: `update_response` always carries the full
//! text so far, so an implementation can re-render idempotently from it.

use crate::core::session::Theme;

/// A model id together with its display name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelLabel {
    pub id: String,
    pub name: String,
}

/// Final content of one response block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseView<'a> {
    Text(&'a str),
    Error(&'a str),
    /// Replayed turn with nothing stored for this model.
    Missing,
}

pub trait Renderer {
    /// Empty transcript with a welcome line.
    fn show_welcome(&mut self, message: &str);

    /// A transient status or validation message.
    fn show_notice(&mut self, message: &str);

    fn clear_transcript(&mut self);

    /// User text plus one loading placeholder per model.
    fn begin_turn(&mut self, turn_id: u64, user_text: &str, models: &[ModelLabel]);

    fn update_response(&mut self, turn_id: u64, model_id: &str, text: &str);

    fn finish_response(&mut self, turn_id: u64, model_id: &str, view: ResponseView<'_>);

    /// Forget loading placeholders whose streams were cancelled.
    fn discard_pending(&mut self) {}

    fn apply_theme(&mut self, _theme: Theme) {}
}

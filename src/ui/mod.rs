//! Terminal presentation layer.
//!
//! - [`chat_loop`]: the interaction loop that dispatches typed lines to
//!   [`crate::commands`] and applies stream messages from
//!   [`crate::core::chat_stream`].
//! - [`renderer`]: the presentation contract the core drives.
//! - [`terminal`] and [`markdown`]: the line-oriented implementation.
//! - [`theme`]: color and style policy per session theme.
//!
//! Ownership boundary: this layer presents and captures interaction, while
//! [`crate::core`] owns domain logic and persistence.

pub mod chat_loop;
pub mod markdown;
pub mod renderer;
pub mod terminal;
pub mod theme;

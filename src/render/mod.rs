//! Rendering collaborator
//!
//! The chat core never formats anything itself: it tells a `Renderer` which
//! turns to append and when the loading indicator changes.

mod recording;
mod terminal;

pub use recording::{RecordingRenderer, RenderOp};
pub use terminal::TerminalRenderer;

use crate::chat::types::Role;

/// Presentation of the conversation
pub trait Renderer: Send {
    /// Append one turn at the end of the conversation
    fn append_turn(&mut self, role: Role, content: &str);

    fn show_loading(&mut self);

    fn hide_loading(&mut self);
}

impl<R: Renderer + ?Sized> Renderer for Box<R> {
    fn append_turn(&mut self, role: Role, content: &str) {
        (**self).append_turn(role, content)
    }

    fn show_loading(&mut self) {
        (**self).show_loading()
    }

    fn hide_loading(&mut self) {
        (**self).hide_loading()
    }
}

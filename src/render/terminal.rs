//! Line-oriented terminal renderer

use super::Renderer;
use crate::chat::types::Role;
use std::io::{self, Write};

/// Prints turns to stdout, one block per turn
pub struct TerminalRenderer<W: Write + Send = io::Stdout> {
    out: W,
    loading: bool,
}

impl TerminalRenderer {
    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }
}

impl<W: Write + Send> TerminalRenderer<W> {
    pub fn new(out: W) -> Self {
        Self {
            out,
            loading: false,
        }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn label(role: Role) -> &'static str {
        match role {
            Role::User => "you",
            Role::Assistant => "assistant",
        }
    }

    fn write_line(&mut self, line: &str) {
        // A closed stdout is not worth tearing the session down for
        let _ = writeln!(self.out, "{}", line);
        let _ = self.out.flush();
    }
}

impl<W: Write + Send> Renderer for TerminalRenderer<W> {
    fn append_turn(&mut self, role: Role, content: &str) {
        self.write_line(&format!("{}> {}", Self::label(role), content));
    }

    fn show_loading(&mut self) {
        if !self.loading {
            self.loading = true;
            self.write_line("  ...");
        }
    }

    fn hide_loading(&mut self) {
        self.loading = false;
    }
}

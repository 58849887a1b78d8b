//! Renderer that records every call, for tests and headless embedding

use super::Renderer;
use crate::chat::types::{ConversationTurn, Role};
use std::sync::{Arc, Mutex};

/// One renderer call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RenderOp {
    Turn(ConversationTurn),
    ShowLoading,
    HideLoading,
}

/// Records renderer calls; clones share the same log.
#[derive(Debug, Clone, Default)]
pub struct RecordingRenderer {
    ops: Arc<Mutex<Vec<RenderOp>>>,
    loading: Arc<Mutex<bool>>,
}

impl RecordingRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every call so far, in order
    pub fn ops(&self) -> Vec<RenderOp> {
        self.ops.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    /// Appended turns, in display order
    pub fn turns(&self) -> Vec<ConversationTurn> {
        self.ops()
            .into_iter()
            .filter_map(|op| match op {
                RenderOp::Turn(turn) => Some(turn),
                _ => None,
            })
            .collect()
    }

    /// Appended turns of one role
    pub fn turns_of(&self, role: Role) -> Vec<String> {
        self.turns()
            .into_iter()
            .filter(|turn| turn.role == role)
            .map(|turn| turn.content)
            .collect()
    }

    pub fn is_loading(&self) -> bool {
        *self.loading.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Number of times the loading indicator was shown
    pub fn loading_shown(&self) -> usize {
        self.count(|op| matches!(op, RenderOp::ShowLoading))
    }

    /// Number of times the loading indicator was hidden
    pub fn loading_hidden(&self) -> usize {
        self.count(|op| matches!(op, RenderOp::HideLoading))
    }

    fn count(&self, f: impl Fn(&RenderOp) -> bool) -> usize {
        self.ops().iter().filter(|op| f(op)).count()
    }

    fn record(&self, op: RenderOp) {
        self.ops.lock().unwrap_or_else(|e| e.into_inner()).push(op);
    }

    fn set_loading(&self, value: bool) {
        *self.loading.lock().unwrap_or_else(|e| e.into_inner()) = value;
    }
}

impl Renderer for RecordingRenderer {
    fn append_turn(&mut self, role: Role, content: &str) {
        self.record(RenderOp::Turn(ConversationTurn {
            role,
            content: content.to_string(),
        }));
    }

    fn show_loading(&mut self) {
        self.set_loading(true);
        self.record(RenderOp::ShowLoading);
    }

    fn hide_loading(&mut self) {
        self.set_loading(false);
        self.record(RenderOp::HideLoading);
    }
}

//! Debounced block selection with paired highlights.
//!
//! Selecting a block decorates both panes at once: a whole-line
//! highlight over the block's source range and a selected marker on the
//! rendered block. Rapid reselection bursts (cursor sweeps, repeated
//! clicks) are debounced so the decorations land once, on the final
//! target.

use crate::blocks::BlockIndex;
use crate::pane::{SourcePane, ViewPane};

use super::debounce::Debouncer;

/// Owns the selection state and its debounce window.
#[derive(Debug, Clone, Default)]
pub struct SelectionHighlighter {
    debounce: Debouncer<usize>,
    delay_ms: u64,
    selected: Option<usize>,
}

impl SelectionHighlighter {
    /// Create a highlighter with the given debounce window.
    pub const fn new(delay_ms: u64) -> Self {
        Self {
            debounce: Debouncer::new(),
            delay_ms,
            selected: None,
        }
    }

    /// The block currently holding the selection, if any.
    pub const fn selected(&self) -> Option<usize> {
        self.selected
    }

    /// Request selection of a block; applied after the quiet window.
    pub fn request(&mut self, index: usize, now_ms: u64) {
        self.debounce.queue(index, now_ms, self.delay_ms);
    }

    /// Apply a pending selection whose quiet window has elapsed.
    pub fn tick(
        &mut self,
        now_ms: u64,
        blocks: &BlockIndex,
        source: &mut impl SourcePane,
        view: &mut impl ViewPane,
    ) {
        if let Some(index) = self.debounce.take_ready(now_ms) {
            self.apply(index, blocks, source, view);
        }
    }

    /// Select `index` now: clear both panes' decorations, then apply
    /// exactly one highlight and one marker. A handle that names no
    /// block leaves the current selection untouched.
    pub fn apply(
        &mut self,
        index: usize,
        blocks: &BlockIndex,
        source: &mut impl SourcePane,
        view: &mut impl ViewPane,
    ) {
        let Some(block) = blocks.get(index) else {
            return;
        };
        source.clear_line_highlight();
        view.set_selected(None);
        source.set_line_highlight(block.start_line, block.end_line);
        view.set_selected(Some(index));
        self.selected = Some(index);
    }

    /// Drop the selection and both decorations, cancelling anything
    /// pending.
    pub fn clear(&mut self, source: &mut impl SourcePane, view: &mut impl ViewPane) {
        self.debounce.cancel();
        self.selected = None;
        source.clear_line_highlight();
        view.set_selected(None);
    }

    /// Re-apply the selection after a rebuild. The old handle may name
    /// a different or vanished block in the new pass; a vanished block
    /// drops the selection rather than decorating an arbitrary one.
    pub fn reapply(
        &mut self,
        blocks: &BlockIndex,
        source: &mut impl SourcePane,
        view: &mut impl ViewPane,
    ) {
        match self.selected {
            Some(index) if blocks.get(index).is_some() => {
                self.apply(index, blocks, source, view);
            }
            Some(_) => self.clear(source, view),
            None => {}
        }
    }
}

//! Block index: the ordered map from rendered blocks to source lines.
//!
//! The renderer tags every top-level renderable node with a marker
//! `"start:end"` (0-based start line, end line as emitted). The
//! [`BlockIndex`] parses those markers, in rendering order, into
//! [`Block`]s; the block's position in the sequence is its persistent
//! handle for the lifetime of one render pass.
//!
//! The index is destroyed and rebuilt wholesale on every render —
//! block count and boundaries can change arbitrarily between renders,
//! so there is no incremental update path.

use crate::pane::{SourcePane, ViewPane};

/// One top-level rendered block and its position in both panes.
///
/// `start_line`/`end_line` are 1-based inclusive source line numbers.
/// The vertical offsets are only meaningful after
/// [`BlockIndex::recompute_positions`] has run against live layout;
/// they are stale immediately after any content change.
#[derive(Debug, Clone, PartialEq)]
pub struct Block {
    /// Position in rendering order; the block's handle.
    pub index: usize,
    /// First source line covered by this block (1-based, inclusive).
    pub start_line: usize,
    /// Last source line covered by this block (1-based, inclusive).
    pub end_line: usize,
    /// Top edge offset within the view pane's scrollable content.
    pub view_offset: f64,
    /// Top edge offset within the source pane's scrollable content.
    pub source_offset: f64,
}

impl Block {
    /// Parse a block from a renderer marker.
    ///
    /// The marker format is `"start:end"` with a 0-based start line;
    /// the start is incremented by one to match 1-based editor line
    /// numbering, the end is taken as given. Malformed markers parse
    /// leniently: missing or garbage fields become zero, so a bad
    /// marker degrades to an inert block instead of failing the whole
    /// rebuild.
    fn from_marker(index: usize, marker: &str) -> Self {
        let mut parts = marker.splitn(2, ':');
        let start: usize = parts.next().and_then(|s| s.trim().parse().ok()).unwrap_or(0);
        let end: usize = parts.next().and_then(|s| s.trim().parse().ok()).unwrap_or(0);
        Self {
            index,
            start_line: start + 1,
            end_line: end,
            view_offset: 0.0,
            source_offset: 0.0,
        }
    }

    /// Whether `line` (1-based) falls within this block's source range.
    pub const fn contains_line(&self, line: usize) -> bool {
        line >= self.start_line && line <= self.end_line
    }
}

/// Ordered sequence of blocks for one render pass.
///
/// Owned by the session controller; sync and selection receive
/// read-only access. Blocks are produced in non-decreasing
/// `start_line` order and are non-overlapping by construction (one
/// block per top-level renderable node).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BlockIndex {
    blocks: Vec<Block>,
}

impl BlockIndex {
    /// Create an empty index.
    pub const fn new() -> Self {
        Self { blocks: Vec::new() }
    }

    /// Discard all blocks and repopulate from an ordered marker
    /// sequence. Marker order becomes block index order.
    pub fn rebuild<'a>(&mut self, markers: impl IntoIterator<Item = &'a str>) {
        self.blocks.clear();
        for (index, marker) in markers.into_iter().enumerate() {
            self.blocks.push(Block::from_marker(index, marker));
        }
    }

    /// Empty the index.
    pub fn clear(&mut self) {
        self.blocks.clear();
    }

    /// Get a block by its handle. Out-of-range is a normal miss.
    pub fn get(&self, index: usize) -> Option<&Block> {
        self.blocks.get(index)
    }

    /// Find the first block whose source range covers `line` (1-based).
    ///
    /// Lines outside any renderable node — blank lines between blocks,
    /// for instance — have no block; callers must treat that as a
    /// normal no-op, not a failure.
    pub fn get_by_line(&self, line: usize) -> Option<&Block> {
        self.blocks.iter().find(|b| b.contains_line(line))
    }

    /// Number of blocks in the current render pass.
    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    /// Whether the index holds no blocks.
    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    /// Iterate blocks in rendering order.
    pub fn iter(&self) -> std::slice::Iter<'_, Block> {
        self.blocks.iter()
    }

    /// Refresh every block's vertical offsets from live pane layout.
    ///
    /// Contract: the view pane's content must already be installed and
    /// laid out — this runs synchronously after `install_html`, never
    /// across an async gap, or the offsets race stale geometry. A block
    /// the view cannot measure keeps its previous offset; a stale
    /// mapping degrades gracefully where a zeroed one would jump.
    pub fn recompute_positions(&mut self, source: &impl SourcePane, view: &impl ViewPane) {
        let viewport_top = view.viewport_top();
        for block in &mut self.blocks {
            block.source_offset = source.top_for_line(block.start_line);
            if let Some(top) = view.block_top(block.index) {
                block.view_offset = top - viewport_top;
            }
        }
    }

    /// Anchor pairs `(source_offset, view_offset)` in block order.
    pub(crate) fn source_to_view(&self) -> impl Iterator<Item = (f64, f64)> + '_ {
        self.blocks.iter().map(|b| (b.source_offset, b.view_offset))
    }

    /// Anchor pairs `(view_offset, source_offset)` in block order.
    pub(crate) fn view_to_source(&self) -> impl Iterator<Item = (f64, f64)> + '_ {
        self.blocks.iter().map(|b| (b.view_offset, b.source_offset))
    }
}

impl<'a> IntoIterator for &'a BlockIndex {
    type Item = &'a Block;
    type IntoIter = std::slice::Iter<'a, Block>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

//! Pane abstractions: the seam between the engine and the GUI chrome.
//!
//! The sync engine never touches a widget toolkit. It sees the source
//! editor and the rendered preview through the [`SourcePane`] and
//! [`ViewPane`] traits, which expose exactly what block mapping and
//! scroll sync consume: scroll offsets, line and block tops, content,
//! cursor, and highlight state.
//!
//! [`MemorySourcePane`] and [`MemoryViewPane`] are deterministic
//! layout models (fixed line height, recorded block tops) used by the
//! test suite and by headless embedding.

mod memory;

pub use memory::{MemorySourcePane, MemoryViewPane};

/// A pane's on-screen rectangle, in the shared window coordinate space.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    /// Create a rectangle from origin and size.
    pub const fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Whether a point lies inside this rectangle (half-open edges).
    pub fn contains(&self, x: f64, y: f64) -> bool {
        x >= self.x && x < self.x + self.width && y >= self.y && y < self.y + self.height
    }
}

/// Cursor position in the source pane, 1-based line and column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cursor {
    pub line: usize,
    pub col: usize,
}

impl Default for Cursor {
    fn default() -> Self {
        Self { line: 1, col: 1 }
    }
}

/// The text-editor side of the split.
pub trait SourcePane {
    /// The pane's rectangle, for pointer-over tests.
    fn frame(&self) -> Rect;

    /// Current vertical scroll offset of the editor content.
    fn scroll_top(&self) -> f64;

    /// Set the scroll offset absolutely.
    ///
    /// Programmatic sets must not be re-reported as user scrolls, or
    /// the two panes chase each other; the pointer-over guard in the
    /// synchronizer depends on this.
    fn set_scroll_top(&mut self, top: f64);

    /// Height of the visible editor area.
    fn viewport_height(&self) -> f64;

    /// Top edge offset of a 1-based line within the scrollable content.
    fn top_for_line(&self, line: usize) -> f64;

    /// Full editor text.
    fn content(&self) -> &str;

    /// Replace the editor text.
    fn set_content(&mut self, text: &str);

    /// Current cursor position.
    fn cursor(&self) -> Cursor;

    /// Move the cursor, clamped to the content.
    fn set_cursor(&mut self, cursor: Cursor);

    /// Apply a whole-line highlight decoration over `[start, end]`.
    fn set_line_highlight(&mut self, start_line: usize, end_line: usize);

    /// Remove any line highlight.
    fn clear_line_highlight(&mut self);

    /// Scroll the given line into view if it is outside the viewport.
    fn reveal_line(&mut self, line: usize);
}

/// The rendered-preview side of the split.
pub trait ViewPane {
    /// The pane's rectangle, for pointer-over tests.
    fn frame(&self) -> Rect;

    /// Current vertical scroll offset of the rendered content.
    fn scroll_top(&self) -> f64;

    /// Set the scroll offset absolutely (same non-reentrancy contract
    /// as [`SourcePane::set_scroll_top`]).
    fn set_scroll_top(&mut self, top: f64);

    /// Height of the visible preview area.
    fn viewport_height(&self) -> f64;

    /// Install freshly rendered HTML with `block_count` marked blocks.
    ///
    /// Implementations must have flushed layout by the time this
    /// returns: `block_top` is called synchronously afterwards.
    fn install_html(&mut self, html: &str, block_count: usize);

    /// Top edge of the pane's scrollable container, in the same
    /// coordinate space as `block_top`.
    fn viewport_top(&self) -> f64;

    /// Measured top edge of a block, or `None` when the block cannot
    /// be found in the current layout.
    fn block_top(&self, index: usize) -> Option<f64>;

    /// Mark a block as selected, clearing any previous marker.
    /// `None` clears without selecting.
    fn set_selected(&mut self, index: Option<usize>);
}

/// Tracks the pointer position so sync can tell which pane the user is
/// actually scrolling.
///
/// Without this guard, pane A's programmatic scroll (driven by pane
/// B's user scroll) would fire a scroll event back into pane B and the
/// two would oscillate. The position is an owned value queried by the
/// synchronizer — not a process-wide global.
#[derive(Debug, Clone, Copy, Default)]
pub struct InputTracker {
    position: Option<(f64, f64)>,
}

impl InputTracker {
    /// Create a tracker with no known pointer position.
    pub const fn new() -> Self {
        Self { position: None }
    }

    /// Record the latest pointer position.
    pub const fn set_position(&mut self, x: f64, y: f64) {
        self.position = Some((x, y));
    }

    /// Whether the pointer is currently over `rect`. Unknown position
    /// counts as "not over" — no sync until the pointer has moved.
    pub fn is_over(&self, rect: &Rect) -> bool {
        self.position.is_some_and(|(x, y)| rect.contains(x, y))
    }
}

//! In-memory pane implementations with deterministic layout.
//!
//! These back the test suite and headless embedding: the source pane
//! lays out lines at a fixed height, the view pane records block tops
//! handed to it (or derives them from a fixed block height on
//! `install_html`). No widget toolkit, no asynchrony — layout is
//! "flushed" the moment content is installed, which satisfies the
//! measure-after-install contract trivially.

use super::{Cursor, Rect, SourcePane, ViewPane};

/// Deterministic [`SourcePane`]: every line is `line_height` tall.
#[derive(Debug, Clone)]
pub struct MemorySourcePane {
    text: String,
    line_height: f64,
    scroll_top: f64,
    cursor: Cursor,
    highlight: Option<(usize, usize)>,
    frame: Rect,
}

impl MemorySourcePane {
    /// Create a pane holding `text` with a 20px line height and a
    /// default 800×600 frame at the window origin.
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            line_height: 20.0,
            scroll_top: 0.0,
            cursor: Cursor::default(),
            highlight: None,
            frame: Rect::new(0.0, 0.0, 800.0, 600.0),
        }
    }

    /// Override the per-line layout height.
    #[must_use]
    pub const fn with_line_height(mut self, line_height: f64) -> Self {
        self.line_height = line_height;
        self
    }

    /// Override the pane's window rectangle.
    #[must_use]
    pub const fn with_frame(mut self, frame: Rect) -> Self {
        self.frame = frame;
        self
    }

    /// Number of lines in the content (at least 1, like real editors).
    pub fn line_count(&self) -> usize {
        self.text.lines().count().max(1)
    }

    /// The active whole-line highlight, if any.
    pub const fn line_highlight(&self) -> Option<(usize, usize)> {
        self.highlight
    }
}

impl SourcePane for MemorySourcePane {
    fn frame(&self) -> Rect {
        self.frame
    }

    fn scroll_top(&self) -> f64 {
        self.scroll_top
    }

    fn set_scroll_top(&mut self, top: f64) {
        self.scroll_top = top.max(0.0);
    }

    fn viewport_height(&self) -> f64 {
        self.frame.height
    }

    fn top_for_line(&self, line: usize) -> f64 {
        #[allow(clippy::cast_precision_loss)]
        let line_idx = line.saturating_sub(1) as f64;
        line_idx * self.line_height
    }

    fn content(&self) -> &str {
        &self.text
    }

    fn set_content(&mut self, text: &str) {
        self.text = text.to_string();
        let max_line = self.line_count();
        if self.cursor.line > max_line {
            self.cursor.line = max_line;
        }
    }

    fn cursor(&self) -> Cursor {
        self.cursor
    }

    fn set_cursor(&mut self, cursor: Cursor) {
        let line = cursor.line.clamp(1, self.line_count());
        self.cursor = Cursor {
            line,
            col: cursor.col.max(1),
        };
    }

    fn set_line_highlight(&mut self, start_line: usize, end_line: usize) {
        self.highlight = Some((start_line, end_line));
    }

    fn clear_line_highlight(&mut self) {
        self.highlight = None;
    }

    fn reveal_line(&mut self, line: usize) {
        let top = self.top_for_line(line);
        let bottom = self.scroll_top + self.viewport_height();
        if top < self.scroll_top || top + self.line_height > bottom {
            self.scroll_top = top;
        }
    }
}

/// Deterministic [`ViewPane`]: block tops are either derived from a
/// fixed block height on install or set explicitly by a test.
#[derive(Debug, Clone)]
pub struct MemoryViewPane {
    html: String,
    block_tops: Vec<f64>,
    block_height: f64,
    scroll_top: f64,
    selected: Option<usize>,
    frame: Rect,
}

impl Default for MemoryViewPane {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryViewPane {
    /// Create an empty pane with a 40px block height and a default
    /// 800×600 frame to the right of the source pane.
    pub fn new() -> Self {
        Self {
            html: String::new(),
            block_tops: Vec::new(),
            block_height: 40.0,
            scroll_top: 0.0,
            selected: None,
            frame: Rect::new(800.0, 0.0, 800.0, 600.0),
        }
    }

    /// Override the uniform block layout height.
    #[must_use]
    pub const fn with_block_height(mut self, block_height: f64) -> Self {
        self.block_height = block_height;
        self
    }

    /// Override the pane's window rectangle.
    #[must_use]
    pub const fn with_frame(mut self, frame: Rect) -> Self {
        self.frame = frame;
        self
    }

    /// Replace the measured block tops (simulates a layout pass with
    /// uneven block heights).
    pub fn set_block_tops(&mut self, tops: Vec<f64>) {
        self.block_tops = tops;
    }

    /// The HTML most recently installed.
    pub fn html(&self) -> &str {
        &self.html
    }

    /// The block currently carrying the selected marker.
    pub const fn selected(&self) -> Option<usize> {
        self.selected
    }
}

impl ViewPane for MemoryViewPane {
    fn frame(&self) -> Rect {
        self.frame
    }

    fn scroll_top(&self) -> f64 {
        self.scroll_top
    }

    fn set_scroll_top(&mut self, top: f64) {
        self.scroll_top = top.max(0.0);
    }

    fn viewport_height(&self) -> f64 {
        self.frame.height
    }

    fn install_html(&mut self, html: &str, block_count: usize) {
        self.html = html.to_string();
        #[allow(clippy::cast_precision_loss)]
        {
            self.block_tops = (0..block_count).map(|i| i as f64 * self.block_height).collect();
        }
    }

    fn viewport_top(&self) -> f64 {
        0.0
    }

    fn block_top(&self, index: usize) -> Option<f64> {
        self.block_tops.get(index).copied()
    }

    fn set_selected(&mut self, index: Option<usize>) {
        self.selected = index;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_source_top_for_line_is_line_height_multiple() {
        let pane = MemorySourcePane::new("a\nb\nc\n").with_line_height(18.0);
        assert!((pane.top_for_line(1) - 0.0).abs() < f64::EPSILON);
        assert!((pane.top_for_line(3) - 36.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_source_cursor_clamps_to_content() {
        let mut pane = MemorySourcePane::new("a\nb\n");
        pane.set_cursor(Cursor { line: 99, col: 0 });
        assert_eq!(pane.cursor(), Cursor { line: 2, col: 1 });
    }

    #[test]
    fn test_source_reveal_scrolls_only_when_outside_viewport() {
        let mut pane = MemorySourcePane::new(&"x\n".repeat(100))
            .with_line_height(20.0)
            .with_frame(Rect::new(0.0, 0.0, 800.0, 200.0));
        pane.reveal_line(3);
        assert!((pane.scroll_top() - 0.0).abs() < f64::EPSILON);
        pane.reveal_line(50);
        assert!((pane.scroll_top() - 980.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_view_install_lays_out_uniform_blocks() {
        let mut pane = MemoryViewPane::new().with_block_height(32.0);
        pane.install_html("<p>hi</p>", 3);
        assert_eq!(pane.block_top(0), Some(0.0));
        assert_eq!(pane.block_top(2), Some(64.0));
        assert_eq!(pane.block_top(3), None);
    }

    #[test]
    fn test_view_scroll_floor_is_zero() {
        let mut pane = MemoryViewPane::new();
        pane.set_scroll_top(-20.0);
        assert!((pane.scroll_top() - 0.0).abs() < f64::EPSILON);
    }
}

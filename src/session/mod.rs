//! The edit-session controller.
//!
//! [`EditSession`] owns everything one open document needs — the two
//! panes, the renderer, the block index, the synchronizer, the payload
//! pool, and an optional host bridge — and drives them from a single
//! message stream. GUI chrome translates its native events into
//! [`Message`]s, calls [`EditSession::handle`], and pumps
//! [`EditSession::tick`] so debounced work fires.
//!
//! The rebuild pipeline lives here: every render pass goes render →
//! install → index rebuild → payload reconcile → position recompute →
//! selection re-apply, in that order, synchronously. Nothing observes
//! a half-rebuilt state.

mod debounce;
mod select;

pub use debounce::Debouncer;
pub use select::SelectionHighlighter;

use anyhow::{Context, Result};
use tracing::{debug, info, warn};

use crate::blocks::BlockIndex;
use crate::bridge::{HostBridge, HostEvent};
use crate::config::SyncConfig;
use crate::datapool::DataPool;
use crate::pane::{InputTracker, SourcePane, ViewPane};
use crate::render::MdRenderer;
use crate::sync::ScrollSynchronizer;

/// Everything the GUI can tell the session.
#[derive(Debug, Clone, PartialEq)]
pub enum Message {
    /// The source text changed; re-render after the quiet window.
    TextChanged(String),
    /// A pane was resized; recompute positions after the quiet window.
    Resized,
    /// The pointer moved, in window coordinates.
    PointerMoved(f64, f64),
    /// The user scrolled the source pane.
    SourceScrolled,
    /// The user scrolled the view pane.
    ViewScrolled,
    /// The source cursor moved to a 1-based line.
    CursorMoved(usize),
    /// A rendered block was clicked.
    ViewClicked(usize),
    /// The source pane took keyboard focus.
    SourceFocused,
    /// Save the document through the host.
    Save,
}

/// Controller for one open document.
pub struct EditSession<S: SourcePane, V: ViewPane> {
    config: SyncConfig,
    renderer: MdRenderer,
    blocks: BlockIndex,
    sync: ScrollSynchronizer,
    input: InputTracker,
    pool: DataPool,
    highlighter: SelectionHighlighter,
    render_debounce: Debouncer<()>,
    resize_debounce: Debouncer<()>,
    source: S,
    view: V,
    bridge: Option<HostBridge>,
    file_path: Option<String>,
    saved_content: String,
}

impl<S: SourcePane, V: ViewPane> EditSession<S, V> {
    /// Create a session over the given panes with the default renderer.
    pub fn new(source: S, view: V, config: SyncConfig) -> Self {
        Self {
            sync: ScrollSynchronizer::new(config.anchor),
            highlighter: SelectionHighlighter::new(config.select_debounce_ms),
            config,
            renderer: MdRenderer::with_default_handlers(),
            blocks: BlockIndex::new(),
            input: InputTracker::new(),
            pool: DataPool::new(),
            render_debounce: Debouncer::new(),
            resize_debounce: Debouncer::new(),
            source,
            view,
            bridge: None,
            file_path: None,
            saved_content: String::new(),
        }
    }

    /// Attach a host bridge for file and window operations.
    #[must_use]
    pub fn with_bridge(mut self, bridge: HostBridge) -> Self {
        self.bridge = Some(bridge);
        self
    }

    /// Replace the renderer (custom fenced handlers, options).
    #[must_use]
    pub fn with_renderer(mut self, renderer: MdRenderer) -> Self {
        self.renderer = renderer;
        self
    }

    /// The source pane.
    pub const fn source(&self) -> &S {
        &self.source
    }

    /// Mutable access to the source pane, for embedders that feed it
    /// directly.
    pub const fn source_mut(&mut self) -> &mut S {
        &mut self.source
    }

    /// The view pane.
    pub const fn view(&self) -> &V {
        &self.view
    }

    /// Mutable access to the view pane.
    pub const fn view_mut(&mut self) -> &mut V {
        &mut self.view
    }

    /// The current block index.
    pub const fn blocks(&self) -> &BlockIndex {
        &self.blocks
    }

    /// The block currently selected, if any.
    pub const fn selected(&self) -> Option<usize> {
        self.highlighter.selected()
    }

    /// Path of the open file, once known.
    pub fn file_path(&self) -> Option<&str> {
        self.file_path.as_deref()
    }

    /// Whether the document differs from its last saved state.
    pub fn has_change(&self) -> bool {
        self.pool.patch(self.source.content()) != self.saved_content
    }

    /// Feed one event into the session.
    pub fn handle(&mut self, message: Message, now_ms: u64) -> Result<()> {
        match message {
            Message::TextChanged(text) => {
                self.source.set_content(&text);
                self.render_debounce
                    .queue((), now_ms, self.config.render_debounce_ms);
            }
            Message::Resized => {
                self.resize_debounce
                    .queue((), now_ms, self.config.resize_debounce_ms);
            }
            Message::PointerMoved(x, y) => self.input.set_position(x, y),
            Message::SourceScrolled => {
                self.sync
                    .sync_from_source(&self.blocks, &self.input, &self.source, &mut self.view);
            }
            Message::ViewScrolled => {
                self.sync
                    .sync_from_view(&self.blocks, &self.input, &self.view, &mut self.source);
            }
            Message::CursorMoved(line) => {
                // Lines between blocks have no mapping; the current
                // selection stands.
                if let Some(block) = self.blocks.get_by_line(line) {
                    self.highlighter.request(block.index, now_ms);
                }
            }
            Message::ViewClicked(index) => {
                if let Some(block) = self.blocks.get(index) {
                    let start_line = block.start_line;
                    self.highlighter.request(index, now_ms);
                    self.source.set_cursor(crate::pane::Cursor {
                        line: start_line,
                        col: 1,
                    });
                    self.source.reveal_line(start_line);
                } else {
                    debug!(index, "click on unindexed block ignored");
                }
            }
            Message::SourceFocused => {
                self.highlighter.clear(&mut self.source, &mut self.view);
            }
            Message::Save => self.save()?,
        }
        Ok(())
    }

    /// Fire any debounced work whose quiet window has elapsed. Call
    /// from the embedder's timer or frame loop.
    pub fn tick(&mut self, now_ms: u64) -> Result<()> {
        if self.render_debounce.take_ready(now_ms).is_some() {
            self.refresh()?;
        }
        if self.resize_debounce.take_ready(now_ms).is_some() {
            self.blocks.recompute_positions(&self.source, &self.view);
        }
        self.highlighter
            .tick(now_ms, &self.blocks, &mut self.source, &mut self.view);
        Ok(())
    }

    /// Run the full rebuild pipeline immediately.
    ///
    /// Pool tokens and their payloads are both single-line, so the
    /// patched text the renderer sees has the same line numbering as
    /// the simplified text in the editor; markers transfer directly.
    pub fn refresh(&mut self) -> Result<()> {
        let raw = self.source.content().to_string();
        let full = self.pool.patch(&raw);
        let rendered = self.renderer.render(&full);
        debug!(blocks = rendered.markers.len(), "rendered document");

        self.view.install_html(&rendered.html, rendered.markers.len());
        self.blocks
            .rebuild(rendered.markers.iter().map(String::as_str));

        // Swap freshly pasted payloads for short tokens without moving
        // the cursor.
        let simplified = self.pool.simplify(&raw);
        if simplified != raw {
            let cursor = self.source.cursor();
            self.source.set_content(&simplified);
            self.source.set_cursor(cursor);
        }

        self.blocks.recompute_positions(&self.source, &self.view);
        self.highlighter
            .reapply(&self.blocks, &mut self.source, &mut self.view);
        Ok(())
    }

    /// Load a document through the host bridge and render it.
    pub fn open(&mut self, path: &str) -> Result<()> {
        let bridge = self.bridge.as_mut().context("no host bridge attached")?;
        let content = bridge
            .read_file(path)
            .with_context(|| format!("reading {path}"))?;
        info!(path, bytes = content.len(), "opened document");
        self.saved_content.clone_from(&content);
        let simplified = self.pool.simplify(&content);
        self.source.set_content(&simplified);
        self.file_path = Some(path.to_string());
        if let Some(bridge) = self.bridge.as_mut() {
            bridge.set_title(path).context("setting window title")?;
        }
        self.refresh()
    }

    /// Save through the host bridge. The bridge resolves an empty path
    /// via its save dialog and replies with wherever the file landed,
    /// which becomes the session's path from then on.
    pub fn save(&mut self) -> Result<()> {
        if self.file_path.is_some() && !self.has_change() {
            debug!("save skipped, no changes");
            return Ok(());
        }
        let bridge = self.bridge.as_mut().context("no host bridge attached")?;
        let content = self.pool.patch(self.source.content());
        let path = self.file_path.clone().unwrap_or_default();
        let resolved = bridge
            .write_file(&path, &content)
            .with_context(|| format!("saving {path:?}"))?;
        bridge
            .set_title(&resolved)
            .context("setting window title")?;
        info!(path = %resolved, bytes = content.len(), "saved document");
        self.file_path = Some(resolved);
        self.saved_content = content;
        Ok(())
    }

    /// Drain host-initiated events and react to them: reload the file
    /// when it changed on disk, flush unsaved work before a close.
    pub fn poll_host_events(&mut self) -> Result<()> {
        let Some(bridge) = self.bridge.as_mut() else {
            return Ok(());
        };
        let events = bridge.poll_events();
        for event in events {
            match event {
                HostEvent::Reload => {
                    let Some(path) = self.file_path.clone() else {
                        warn!("reload event with no open file");
                        continue;
                    };
                    if self.has_change() {
                        // Unsaved edits win over the on-disk change.
                        debug!(%path, "skipping reload, document has unsaved edits");
                        continue;
                    }
                    self.open(&path)?;
                }
                HostEvent::Closing => {
                    if self.has_change() {
                        self.save().context("saving before close")?;
                    }
                    if let Some(bridge) = self.bridge.as_mut() {
                        bridge.close_form().context("completing window close")?;
                    }
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pane::{MemorySourcePane, MemoryViewPane, Rect};

    fn session() -> EditSession<MemorySourcePane, MemoryViewPane> {
        let source = MemorySourcePane::new("").with_frame(Rect::new(0.0, 0.0, 100.0, 100.0));
        let view = MemoryViewPane::new().with_frame(Rect::new(100.0, 0.0, 100.0, 100.0));
        EditSession::new(source, view, SyncConfig::default())
    }

    #[test]
    fn test_text_change_renders_after_quiet_window() {
        let mut session = session();
        session
            .handle(Message::TextChanged("# A\n\nB\n".into()), 1000)
            .unwrap();
        session.tick(1100).unwrap();
        assert!(session.blocks().is_empty(), "still inside quiet window");
        session.tick(1200).unwrap();
        assert_eq!(session.blocks().len(), 2);
        assert!(session.view().html().contains("x-block='0'"));
    }

    #[test]
    fn test_keystroke_burst_renders_once_with_final_text() {
        let mut session = session();
        session
            .handle(Message::TextChanged("# A".into()), 1000)
            .unwrap();
        session
            .handle(Message::TextChanged("# AB".into()), 1100)
            .unwrap();
        session.tick(1250).unwrap();
        assert!(session.blocks().is_empty(), "burst extended the window");
        session.tick(1300).unwrap();
        assert_eq!(session.blocks().len(), 1);
        assert!(session.view().html().contains("AB"));
    }

    #[test]
    fn test_cursor_move_selects_covering_block() {
        let mut session = session();
        session
            .handle(Message::TextChanged("# A\n\nB\n".into()), 0)
            .unwrap();
        session.tick(200).unwrap();

        session.handle(Message::CursorMoved(3), 300).unwrap();
        session.tick(400).unwrap();
        assert_eq!(session.selected(), Some(1));
        assert_eq!(session.source().line_highlight(), Some((3, 3)));
        assert_eq!(session.view().selected(), Some(1));
    }

    #[test]
    fn test_cursor_on_blank_line_keeps_selection() {
        let mut session = session();
        session
            .handle(Message::TextChanged("# A\n\nB\n".into()), 0)
            .unwrap();
        session.tick(200).unwrap();

        session.handle(Message::CursorMoved(1), 300).unwrap();
        session.tick(400).unwrap();
        assert_eq!(session.selected(), Some(0));

        // Line 2 is the blank between blocks.
        session.handle(Message::CursorMoved(2), 500).unwrap();
        session.tick(600).unwrap();
        assert_eq!(session.selected(), Some(0));
    }

    #[test]
    fn test_focus_clears_selection() {
        let mut session = session();
        session
            .handle(Message::TextChanged("# A\n".into()), 0)
            .unwrap();
        session.tick(200).unwrap();
        session.handle(Message::CursorMoved(1), 300).unwrap();
        session.tick(400).unwrap();
        assert_eq!(session.selected(), Some(0));

        session.handle(Message::SourceFocused, 500).unwrap();
        assert_eq!(session.selected(), None);
        assert_eq!(session.source().line_highlight(), None);
    }

    #[test]
    fn test_view_click_reveals_source_line() {
        let text = "# Top\n\n".to_string() + &"para\n\n".repeat(40);
        let mut session = session();
        session.handle(Message::TextChanged(text), 0).unwrap();
        session.tick(200).unwrap();
        let last = session.blocks().len() - 1;
        let start_line = session.blocks().get(last).unwrap().start_line;

        session.handle(Message::ViewClicked(last), 300).unwrap();
        session.tick(400).unwrap();
        assert_eq!(session.selected(), Some(last));
        // 20px lines, 100px viewport: the line must now be visible.
        let top = session.source().top_for_line(start_line);
        let scroll = session.source().scroll_top();
        assert!(top >= scroll && top < scroll + 100.0);
    }

    #[test]
    fn test_scroll_sync_respects_pointer_guard() {
        let mut session = session();
        session
            .handle(Message::TextChanged("a\n\nb\n\nc\n".into()), 0)
            .unwrap();
        session.tick(200).unwrap();

        // Pointer over the view pane: source scrolls do not sync.
        session.handle(Message::PointerMoved(150.0, 50.0), 300).unwrap();
        session.source_mut().set_scroll_top(40.0);
        session.handle(Message::SourceScrolled, 300).unwrap();
        assert!((session.view().scroll_top() - 0.0).abs() < f64::EPSILON);

        // Pointer over the source pane: now it does.
        session.handle(Message::PointerMoved(50.0, 50.0), 400).unwrap();
        session.handle(Message::SourceScrolled, 400).unwrap();
        assert!(session.view().scroll_top() > 0.0);
    }

    #[test]
    fn test_resize_recomputes_positions_after_quiet_window() {
        let mut session = session();
        session
            .handle(Message::TextChanged("a\n\nb\n".into()), 0)
            .unwrap();
        session.tick(200).unwrap();
        let before = session.blocks().get(1).unwrap().view_offset;

        // Simulate a relayout that moved the second block.
        session.view.set_block_tops(vec![0.0, 90.0]);
        session.handle(Message::Resized, 300).unwrap();
        session.tick(350).unwrap();
        let unchanged = session.blocks().get(1).unwrap().view_offset;
        assert!((unchanged - before).abs() < f64::EPSILON);
        session.tick(400).unwrap();
        let after = session.blocks().get(1).unwrap().view_offset;
        assert!((after - 90.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_selection_survives_render_of_same_shape() {
        let mut session = session();
        session
            .handle(Message::TextChanged("# A\n\nB\n".into()), 0)
            .unwrap();
        session.tick(200).unwrap();
        session.handle(Message::CursorMoved(3), 300).unwrap();
        session.tick(400).unwrap();
        assert_eq!(session.selected(), Some(1));

        session
            .handle(Message::TextChanged("# A\n\nB changed\n".into()), 500)
            .unwrap();
        session.tick(700).unwrap();
        assert_eq!(session.selected(), Some(1));
        assert_eq!(session.view().selected(), Some(1));
    }

    #[test]
    fn test_selection_dropped_when_block_vanishes() {
        let mut session = session();
        session
            .handle(Message::TextChanged("# A\n\nB\n\nC\n".into()), 0)
            .unwrap();
        session.tick(200).unwrap();
        session.handle(Message::CursorMoved(5), 300).unwrap();
        session.tick(400).unwrap();
        assert_eq!(session.selected(), Some(2));

        session
            .handle(Message::TextChanged("# A\n".into()), 500)
            .unwrap();
        session.tick(700).unwrap();
        assert_eq!(session.selected(), None);
        assert_eq!(session.view().selected(), None);
    }

    #[test]
    fn test_refresh_simplifies_pasted_payload_and_preserves_cursor() {
        let mut session = session();
        let text = "![i](data:image/png;base64,AAAA=)\n\nend\n";
        session
            .handle(Message::TextChanged(text.into()), 0)
            .unwrap();
        session
            .source_mut()
            .set_cursor(crate::pane::Cursor { line: 3, col: 2 });
        session.tick(200).unwrap();

        assert!(session.source().content().contains("--data:image/1--"));
        assert!(!session.source().content().contains("base64"));
        assert_eq!(session.source().cursor().line, 3);
        // The saved-state comparison sees the patched text.
        assert!(session.has_change());
    }

    #[test]
    fn test_save_without_bridge_is_an_error() {
        let mut session = session();
        assert!(session.handle(Message::Save, 0).is_err());
    }
}

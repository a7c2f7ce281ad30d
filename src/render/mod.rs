//! Markdown rendering with source-position markers.
//!
//! [`MdRenderer`] turns markdown into HTML in which every top-level
//! renderable node — paragraph, heading, table, list, fenced code —
//! carries an `x-src="start:end"` attribute (0-based start line) and
//! an `x-block` attribute with its rendering-order index. The ordered
//! marker list is returned alongside the HTML so the block index can
//! be rebuilt without re-parsing the output.
//!
//! Fenced code blocks whose info-string matches a registered handler
//! are dispatched to it; a handler failure is contained to that block,
//! which renders as an error-classed block holding the escaped raw
//! content. Sync never breaks for the rest of the document because one
//! block failed.

mod handlers;

pub use handlers::csv_table;

use std::fmt::Write as _;

use anyhow::Result;
use comrak::nodes::{AstNode, NodeValue};
use comrak::{Arena, Options, format_html, parse_document};
use tracing::warn;

/// A fenced-code handler: `(content, block_index) -> html`.
///
/// Errors are caught by the renderer and surfaced as an error block;
/// they never abort the render pass.
pub type HandlerFn = Box<dyn Fn(&str, usize) -> Result<String>>;

struct FencedHandler {
    language: String,
    handle: HandlerFn,
}

/// Result of one render pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RenderedDoc {
    /// Annotated HTML ready to install into the view pane.
    pub html: String,
    /// Ordered `"start:end"` markers, one per annotated block.
    /// Marker order is rendering order is block index order.
    pub markers: Vec<String>,
}

/// Markdown renderer with pluggable fenced-code handlers.
pub struct MdRenderer {
    options: Options,
    handlers: Vec<FencedHandler>,
}

impl std::fmt::Debug for MdRenderer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MdRenderer")
            .field(
                "handlers",
                &self.handlers.iter().map(|h| &h.language).collect::<Vec<_>>(),
            )
            .finish_non_exhaustive()
    }
}

impl Default for MdRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl MdRenderer {
    /// Create a renderer with tables, task lists, and strikethrough
    /// enabled and no fenced handlers registered.
    pub fn new() -> Self {
        let mut options = Options::default();
        options.extension.table = true;
        options.extension.tasklist = true;
        options.extension.strikethrough = true;
        Self {
            options,
            handlers: Vec::new(),
        }
    }

    /// Create a renderer with the built-in handlers registered
    /// (`TABLE` and `csv` render CSV content as an HTML table).
    pub fn with_default_handlers() -> Self {
        let mut renderer = Self::new();
        renderer.add_handler("TABLE", Box::new(|content, _| csv_table(content)));
        renderer.add_handler("csv", Box::new(|content, _| csv_table(content)));
        renderer
    }

    /// Register a handler for fenced blocks with the given info-string.
    pub fn add_handler(&mut self, language: impl Into<String>, handle: HandlerFn) {
        self.handlers.push(FencedHandler {
            language: language.into(),
            handle,
        });
    }

    /// Info-strings with a registered handler, in registration order.
    pub fn handler_languages(&self) -> impl Iterator<Item = &str> {
        self.handlers.iter().map(|h| h.language.as_str())
    }

    /// Render markdown to annotated HTML plus the ordered marker list.
    pub fn render(&self, markdown: &str) -> RenderedDoc {
        let arena = Arena::new();
        let root = parse_document(&arena, markdown, &self.options);

        let mut doc = RenderedDoc::default();
        for node in root.children() {
            self.render_top_level(node, &mut doc);
        }
        doc
    }

    /// Render one top-level node, annotating it when it is a
    /// renderable block kind.
    fn render_top_level<'a>(&self, node: &'a AstNode<'a>, doc: &mut RenderedDoc) {
        let marker = {
            let ast = node.data.borrow();
            if let NodeValue::CodeBlock(code) = &ast.value {
                if code.fenced {
                    let marker = source_marker(node);
                    let language = code.info.trim().split_whitespace().next().unwrap_or("");
                    let index = doc.markers.len();
                    doc.html
                        .push_str(&self.render_fence(language, &code.literal, index, &marker));
                    doc.html.push('\n');
                    doc.markers.push(marker);
                    return;
                }
                // Indented code: pass through unannotated, like any
                // other non-renderable top-level node.
                None
            } else if is_renderable(&ast.value) {
                Some(source_marker(node))
            } else {
                None
            }
        };

        let mut html = Vec::new();
        if format_html(node, &self.options, &mut html).is_err() {
            warn!("failed to format markdown node, skipping");
            return;
        }
        let html = String::from_utf8_lossy(&html);

        if let Some(marker) = marker {
            let index = doc.markers.len();
            let _ = write!(
                doc.html,
                "<div class='block' x-src='{marker}' x-block='{index}'>\n{html}</div>\n"
            );
            doc.markers.push(marker);
        } else {
            doc.html.push_str(&html);
        }
    }

    /// Render a fenced block, dispatching to a handler when one is
    /// registered for its info-string.
    fn render_fence(&self, language: &str, content: &str, index: usize, marker: &str) -> String {
        let handler = self.handlers.iter().find(|h| h.language == language);
        let Some(handler) = handler else {
            // Unrecognized info-string: plain escaped code block, still
            // carrying its marker.
            return format!(
                "<pre x-src='{marker}' x-block='{index}' class='code language-{language}'>\
                 <code>{}</code></pre>",
                escape_html(content)
            );
        };

        match (handler.handle)(content, index) {
            Ok(html) => format!(
                "<div class='code custom language-{language}' x-src='{marker}' \
                 x-block='{index}'>\n{html}\n</div>"
            ),
            Err(err) => {
                warn!(language, %err, "fenced handler failed, rendering error block");
                format!(
                    "<div class='code custom language-{language} error' x-src='{marker}' \
                     x-block='{index}'>\n<pre>{}</pre>\n</div>",
                    escape_html(content)
                )
            }
        }
    }
}

/// Whether a top-level node kind gets a block marker.
const fn is_renderable(value: &NodeValue) -> bool {
    matches!(
        value,
        NodeValue::Paragraph | NodeValue::Heading(_) | NodeValue::Table(_) | NodeValue::List(_)
    )
}

/// Build the `"start:end"` marker for a node: 0-based start line, end
/// line as the 1-based inclusive end (which equals a 0-based exclusive
/// end, the convention the block index expects).
fn source_marker<'a>(node: &'a AstNode<'a>) -> String {
    let sourcepos = node.data.borrow().sourcepos;
    format!(
        "{}:{}",
        sourcepos.start.line.saturating_sub(1),
        sourcepos.end.line
    )
}

/// Minimal HTML escaping for raw code content.
fn escape_html(unsafe_text: &str) -> String {
    let mut out = String::with_capacity(unsafe_text.len());
    for ch in unsafe_text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#039;"),
            _ => out.push(ch),
        }
    }
    out
}

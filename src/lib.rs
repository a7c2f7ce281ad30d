// Only allow lints that are either transitive-dependency noise or
// genuinely opinionated style choices that don't indicate real issues.
#![allow(
    // Transitive dependency version mismatches we can't control
    clippy::multiple_crate_versions,
    // module_name_repetitions is pure style preference (e.g. pane::PaneRect)
    clippy::module_name_repetitions
)]

//! # Splitmark
//!
//! The block-mapping and scroll-synchronization engine of a two-pane
//! markdown editing surface: a text source pane and a rendered preview
//! pane kept in visual lock-step.
//!
//! Splitmark does not own a GUI. It renders markdown to HTML annotated
//! with source-line markers, maps those markers to vertical offsets in
//! both panes, and translates scroll, cursor, and click events from one
//! pane into position changes in the other. The GUI chrome talks to the
//! engine through the [`pane`] traits and (optionally) a [`bridge`] to
//! the native host process.
//!
//! ## Architecture
//!
//! - **Render**: markdown → annotated HTML + ordered block markers
//! - **Index**: markers → [`blocks::BlockIndex`] (line ranges)
//! - **Position**: index + live pane layout → per-block offsets
//! - **Sync/Select**: scroll and selection events consume the offsets
//!
//! The rebuild order render → index → positions is a hard invariant:
//! handlers never observe an index from one render paired with offsets
//! from another.
//!
//! ## Modules
//!
//! - [`session`]: the edit-session controller and its message loop
//! - [`render`]: markdown rendering with pluggable fenced-code handlers
//! - [`blocks`]: block index and position map
//! - [`sync`]: bidirectional scroll synchronization
//! - [`pane`]: pane traits and in-memory implementations
//! - [`bridge`]: request/response channel to the native host
//! - [`datapool`]: embedded-payload simplify/patch

pub mod blocks;
pub mod bridge;
pub mod config;
pub mod datapool;
pub mod pane;
pub mod render;
pub mod session;
pub mod sync;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::blocks::{Block, BlockIndex};
    pub use crate::config::{AnchorPolicy, SyncConfig};
    pub use crate::pane::{SourcePane, ViewPane};
    pub use crate::render::MdRenderer;
    pub use crate::session::{EditSession, Message};
    pub use crate::sync::ScrollSynchronizer;
}

//! Session tuning knobs.
//!
//! Everything that was an inline magic number in earlier revisions of
//! the sync engine (debounce delays, the scroll anchor, the host-bridge
//! timeout) lives here so embedders can adjust it in one place.

use std::time::Duration;

/// Which point of the viewport is held in correspondence when syncing.
///
/// The source history of this engine flip-flopped between aligning the
/// top edges of the panes and aligning their centers; both are valid UX
/// choices, so the anchor is a policy rather than a constant. `Top` is
/// the default: it is exact at block boundaries and matches the
/// forward-search variant that survived the most rewrites.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum AnchorPolicy {
    /// Map the top edge of one viewport to the top edge of the other.
    #[default]
    Top,
    /// Map viewport centers instead of top edges.
    Center,
}

/// Tuning parameters for an edit session.
#[derive(Debug, Clone, PartialEq)]
pub struct SyncConfig {
    /// Scroll anchor policy for both sync directions.
    pub anchor: AnchorPolicy,
    /// Quiet window after the last edit before re-rendering.
    pub render_debounce_ms: u64,
    /// Quiet window after the last resize before repositioning.
    pub resize_debounce_ms: u64,
    /// Quiet window collapsing rapid reselection bursts.
    pub select_debounce_ms: u64,
    /// Upper bound on a single host-bridge round trip.
    pub bridge_timeout: Duration,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            anchor: AnchorPolicy::Top,
            render_debounce_ms: 200,
            resize_debounce_ms: 100,
            select_debounce_ms: 100,
            bridge_timeout: Duration::from_secs(5),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_anchor_is_top() {
        assert_eq!(SyncConfig::default().anchor, AnchorPolicy::Top);
    }

    #[test]
    fn test_default_timings() {
        let config = SyncConfig::default();
        assert_eq!(config.render_debounce_ms, 200);
        assert_eq!(config.resize_debounce_ms, 100);
        assert_eq!(config.select_debounce_ms, 100);
        assert_eq!(config.bridge_timeout, Duration::from_secs(5));
    }
}

//! Bidirectional scroll synchronization.
//!
//! Source and view panes are two independently laid-out coordinate
//! spaces that share a set of anchor points: the top edges of rendered
//! blocks. [`ScrollSynchronizer`] maps a scroll offset in one space to
//! the other by piecewise-linear interpolation over those anchors —
//! exact at every block boundary, linearly approximate inside a
//! block's span (a block's internal line-height/rendering-density
//! ratio is not modeled).
//!
//! Each direction is guarded by "the pointer is over the pane being
//! scrolled": only the pane under the pointer is treated as the
//! user-driven side, so the programmatic scroll applied to the other
//! pane can never echo back and oscillate.

use crate::blocks::BlockIndex;
use crate::config::AnchorPolicy;
use crate::pane::{InputTracker, SourcePane, ViewPane};

/// Maps scroll positions between the two panes over block anchors.
#[derive(Debug, Clone, Copy, Default)]
pub struct ScrollSynchronizer {
    anchor: AnchorPolicy,
}

impl ScrollSynchronizer {
    /// Create a synchronizer with the given anchor policy.
    pub const fn new(anchor: AnchorPolicy) -> Self {
        Self { anchor }
    }

    /// The active anchor policy.
    pub const fn anchor(&self) -> AnchorPolicy {
        self.anchor
    }

    /// Reposition the view pane after a user scroll in the source pane.
    ///
    /// No-op unless the pointer is over the source pane; no-op when
    /// the scroll position is beyond the last anchor (there is no
    /// defined mapping past the last block — the view stays put).
    pub fn sync_from_source(
        &self,
        blocks: &BlockIndex,
        input: &InputTracker,
        source: &impl SourcePane,
        view: &mut impl ViewPane,
    ) {
        if !input.is_over(&source.frame()) {
            return;
        }
        let target = self.map(
            blocks.source_to_view(),
            source.scroll_top(),
            source.viewport_height(),
            view.viewport_height(),
        );
        if let Some(target) = target {
            view.set_scroll_top(target);
        }
    }

    /// Reposition the source pane after a user scroll in the view pane.
    ///
    /// Mirror of [`Self::sync_from_source`].
    pub fn sync_from_view(
        &self,
        blocks: &BlockIndex,
        input: &InputTracker,
        view: &impl ViewPane,
        source: &mut impl SourcePane,
    ) {
        if !input.is_over(&view.frame()) {
            return;
        }
        let target = self.map(
            blocks.view_to_source(),
            view.scroll_top(),
            view.viewport_height(),
            source.viewport_height(),
        );
        if let Some(target) = target {
            source.set_scroll_top(target);
        }
    }

    /// Map a scroll offset through the anchor list under the active
    /// policy. `Top` probes and targets the viewport top edge; `Center`
    /// probes the viewport midpoint and aligns midpoints.
    fn map(
        &self,
        anchors: impl Iterator<Item = (f64, f64)>,
        scroll_top: f64,
        from_height: f64,
        to_height: f64,
    ) -> Option<f64> {
        match self.anchor {
            AnchorPolicy::Top => interpolate(anchors, scroll_top),
            AnchorPolicy::Center => {
                let probe = scroll_top + from_height / 2.0;
                interpolate(anchors, probe).map(|mapped| (mapped - to_height / 2.0).max(0.0))
            }
        }
    }
}

/// Piecewise-linear interpolation over `(from, to)` anchor pairs.
///
/// A synthetic `(0, 0)` anchor bounds the region before the first real
/// block, so that region interpolates like any other instead of being
/// special-cased. Returns `None` when `probe` lies beyond the last
/// anchor. The fraction is clamped to `[0, 1]` and coincident anchors
/// (zero span) yield fraction 0, so the result is always finite.
fn interpolate(anchors: impl Iterator<Item = (f64, f64)>, probe: f64) -> Option<f64> {
    let mut prev = (0.0_f64, 0.0_f64);
    for (from, to) in anchors {
        if from > probe {
            let span = from - prev.0;
            let t = if span > 0.0 {
                ((probe - prev.0) / span).clamp(0.0, 1.0)
            } else {
                0.0
            };
            return Some((to - prev.1).mul_add(t, prev.1));
        }
        prev = (from, to);
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pane::{MemorySourcePane, MemoryViewPane, Rect};

    /// Build an index whose offsets match `pairs` by recomputing
    /// against a 1px-line source pane and explicit view block tops.
    /// Source offsets in `pairs` must therefore be `0, 1, 2, ..`.
    fn index_with_offsets(pairs: &[(f64, f64)]) -> BlockIndex {
        let markers: Vec<String> = pairs
            .iter()
            .enumerate()
            .map(|(i, _)| format!("{i}:{}", i + 1))
            .collect();
        let mut index = BlockIndex::new();
        index.rebuild(markers.iter().map(String::as_str));

        let source = MemorySourcePane::new("x\n".repeat(pairs.len())).with_line_height(1.0);
        let mut view = MemoryViewPane::new();
        view.install_html("<p/>", pairs.len());
        view.set_block_tops(pairs.iter().map(|&(_, v)| v).collect());
        index.recompute_positions(&source, &view);
        index
    }

    fn panes() -> (MemorySourcePane, MemoryViewPane, InputTracker) {
        let source = MemorySourcePane::new("x\n".repeat(10))
            .with_line_height(1.0)
            .with_frame(Rect::new(0.0, 0.0, 100.0, 100.0));
        let view = MemoryViewPane::new().with_frame(Rect::new(100.0, 0.0, 100.0, 100.0));
        let tracker = InputTracker::new();
        (source, view, tracker)
    }

    #[test]
    fn test_interpolate_exact_at_anchor_boundaries() {
        let anchors = [(10.0, 100.0), (20.0, 300.0)];
        // Just below an anchor the mapping approaches its target.
        let at = interpolate(anchors.iter().copied(), 9.999_999).unwrap();
        assert!((at - 100.0).abs() < 1e-3);
        // Midway between anchors maps midway between targets.
        let mid = interpolate(anchors.iter().copied(), 15.0).unwrap();
        assert!((mid - 200.0).abs() < 1e-9);
    }

    #[test]
    fn test_interpolate_before_first_block_uses_sentinel() {
        let anchors = [(10.0, 50.0)];
        let mapped = interpolate(anchors.iter().copied(), 5.0).unwrap();
        assert!((mapped - 25.0).abs() < 1e-9);
    }

    #[test]
    fn test_interpolate_past_last_anchor_is_none() {
        let anchors = [(10.0, 50.0), (20.0, 80.0)];
        assert!(interpolate(anchors.iter().copied(), 20.0).is_none());
        assert!(interpolate(anchors.iter().copied(), 1000.0).is_none());
    }

    #[test]
    fn test_interpolate_coincident_anchors_no_nan() {
        let anchors = [(10.0, 50.0), (10.0, 90.0), (10.0, 120.0)];
        let mapped = interpolate(anchors.iter().copied(), 10.0);
        // probe == anchor: forward search requires strictly greater,
        // so all three coincident anchors are passed over.
        assert!(mapped.is_none());
        let mapped = interpolate(anchors.iter().copied(), 9.0).unwrap();
        assert!(mapped.is_finite());
        assert!((mapped - 45.0).abs() < 1e-9);
    }

    #[test]
    fn test_sync_from_source_moves_view() {
        let (mut source, mut view, mut tracker) = panes();
        let pairs: Vec<(f64, f64)> = (0..5).map(|i| (f64::from(i), f64::from(i) * 10.0)).collect();
        let index = index_with_offsets(&pairs);

        tracker.set_position(50.0, 50.0); // over source
        source.set_scroll_top(1.5);
        let sync = ScrollSynchronizer::new(AnchorPolicy::Top);
        sync.sync_from_source(&index, &tracker, &source, &mut view);
        assert!((view.scroll_top() - 15.0).abs() < 1e-9);
    }

    #[test]
    fn test_sync_from_view_moves_source() {
        let (mut source, mut view, mut tracker) = panes();
        let pairs: Vec<(f64, f64)> = (0..5).map(|i| (f64::from(i), f64::from(i) * 10.0)).collect();
        let index = index_with_offsets(&pairs);

        tracker.set_position(150.0, 50.0); // over view
        view.set_scroll_top(25.0);
        let sync = ScrollSynchronizer::new(AnchorPolicy::Top);
        sync.sync_from_view(&index, &tracker, &view, &mut source);
        assert!((source.scroll_top() - 2.5).abs() < 1e-9);
    }

    #[test]
    fn test_pointer_guard_blocks_echo() {
        let (mut source, mut view, mut tracker) = panes();
        let pairs: Vec<(f64, f64)> = (0..5).map(|i| (f64::from(i), f64::from(i) * 10.0)).collect();
        let index = index_with_offsets(&pairs);

        // Pointer over the view pane: a source scroll must not sync.
        tracker.set_position(150.0, 50.0);
        source.set_scroll_top(2.0);
        let sync = ScrollSynchronizer::new(AnchorPolicy::Top);
        sync.sync_from_source(&index, &tracker, &source, &mut view);
        assert!((view.scroll_top() - 0.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_scroll_past_last_block_leaves_other_pane() {
        let (mut source, mut view, mut tracker) = panes();
        let pairs: Vec<(f64, f64)> = (0..3).map(|i| (f64::from(i), f64::from(i) * 10.0)).collect();
        let index = index_with_offsets(&pairs);

        tracker.set_position(50.0, 50.0);
        view.set_scroll_top(7.0);
        source.set_scroll_top(999.0);
        let sync = ScrollSynchronizer::new(AnchorPolicy::Top);
        sync.sync_from_source(&index, &tracker, &source, &mut view);
        assert!((view.scroll_top() - 7.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_anchor_consistency_at_block_offsets() {
        // Scrolling the source to just under a block's source_offset
        // must land the view within tolerance of that block's
        // view_offset (exactness at anchor points).
        let (mut source, mut view, mut tracker) = panes();
        let pairs: Vec<(f64, f64)> = (0..6).map(|i| (f64::from(i), f64::from(i) * 7.0)).collect();
        let index = index_with_offsets(&pairs);
        tracker.set_position(50.0, 50.0);
        let sync = ScrollSynchronizer::new(AnchorPolicy::Top);

        for block in index.iter().skip(1) {
            source.set_scroll_top(block.source_offset - 1e-6);
            sync.sync_from_source(&index, &tracker, &source, &mut view);
            assert!(
                (view.scroll_top() - block.view_offset).abs() < 1e-3,
                "block {} mapped to {} instead of {}",
                block.index,
                view.scroll_top(),
                block.view_offset
            );
        }
    }

    #[test]
    fn test_center_policy_aligns_midpoints() {
        let sync = ScrollSynchronizer::new(AnchorPolicy::Center);
        // Anchors: source 0..100 maps to view 0..200 linearly.
        let anchors = [(100.0, 200.0)];
        // scroll_top 0, heights 50/50: probe 25 maps to 50, target 25.
        let target = sync
            .map(anchors.iter().copied(), 0.0, 50.0, 50.0)
            .unwrap();
        assert!((target - 25.0).abs() < 1e-9);
    }

    #[test]
    fn test_center_policy_floors_at_zero() {
        let sync = ScrollSynchronizer::new(AnchorPolicy::Center);
        let anchors = [(100.0, 100.0)];
        // Mapped midpoint smaller than half the target viewport.
        let target = sync
            .map(anchors.iter().copied(), 0.0, 10.0, 400.0)
            .unwrap();
        assert!((target - 0.0).abs() < f64::EPSILON);
    }

    mod property_tests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            /// The interpolated value is always finite and always lies
            /// between the targets of the bounding anchors.
            #[test]
            fn interpolation_is_finite_and_bounded(
                steps in proptest::collection::vec((0.0..50.0f64, 0.0..50.0f64), 1..20),
                probe in 0.0..2000.0f64,
            ) {
                // Monotone anchor lists built from non-negative steps;
                // repeated zero steps exercise the coincident case.
                let mut from = 0.0;
                let mut to = 0.0;
                let anchors: Vec<(f64, f64)> = steps
                    .iter()
                    .map(|&(df, dt)| {
                        from += df;
                        to += dt;
                        (from, to)
                    })
                    .collect();

                if let Some(mapped) = interpolate(anchors.iter().copied(), probe) {
                    prop_assert!(mapped.is_finite());
                    prop_assert!(mapped >= 0.0);
                    prop_assert!(mapped <= to + 1e-9);
                } else {
                    // None only when the probe is at/past the last anchor.
                    let last = anchors.last().copied().unwrap_or((0.0, 0.0)).0;
                    prop_assert!(probe >= last);
                }
            }
        }
    }
}

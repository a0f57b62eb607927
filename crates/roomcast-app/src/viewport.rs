//! Scroll/viewport coordination.
//!
//! Bridges reducer mutations to the visual viewport so neither append nor
//! prepend surprises the reader. The coordinator never touches layout
//! itself: it tracks the metrics the UI reports and answers with scroll
//! targets ("measure, mutate, re-measure, correct").

/// How close to the bottom (in pixels) still counts as "reading the tail".
pub const NEAR_BOTTOM_THRESHOLD: f64 = 200.0;

/// Layout metrics reported by the UI after each scroll or render.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ViewportMetrics {
    /// Scroll offset from the top of the content, in pixels.
    pub scroll_top: f64,
    /// Total content height, in pixels.
    pub scroll_height: f64,
    /// Visible viewport height, in pixels.
    pub viewport_height: f64,
}

/// Scroll correction for the driver to apply after a render.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ScrollTarget {
    /// Pin the viewport to the new bottom.
    Bottom,

    /// Keep previously-visible content exactly in place after a prepend:
    /// set `scroll_top = prior_top + (new_height - prior_height)` once the
    /// new height is known.
    Anchor {
        /// Scroll offset captured before the mutation.
        prior_top: f64,
        /// Content height captured before the mutation.
        prior_height: f64,
    },
}

/// Viewport state for one room view.
#[derive(Debug, Clone, Default)]
pub struct Viewport {
    metrics: ViewportMetrics,
}

impl Viewport {
    /// Record the metrics the UI last reported.
    pub fn update(&mut self, metrics: ViewportMetrics) {
        self.metrics = metrics;
    }

    /// Last reported metrics.
    pub fn metrics(&self) -> ViewportMetrics {
        self.metrics
    }

    /// Whether the reader is at (or within threshold of) the bottom.
    pub fn is_near_bottom(&self) -> bool {
        let ViewportMetrics { scroll_top, scroll_height, viewport_height } = self.metrics;
        scroll_height - (scroll_top + viewport_height) <= NEAR_BOTTOM_THRESHOLD
    }

    /// Whether the viewport has reached the top edge (backfill trigger).
    pub fn at_top(&self) -> bool {
        self.metrics.scroll_top <= 0.0
    }

    /// Scroll target for a live append.
    ///
    /// `Some(Bottom)` only when the reader was already near the bottom
    /// before the append; a reader scrolled up into history must not be
    /// yanked down.
    pub fn append_target(&self) -> Option<ScrollTarget> {
        self.is_near_bottom().then_some(ScrollTarget::Bottom)
    }

    /// Scroll target preserving the current anchor across a prepend.
    ///
    /// Captures the pre-mutation measurements; the driver applies the
    /// correction after the prepend has rendered.
    pub fn prepend_anchor(&self) -> ScrollTarget {
        ScrollTarget::Anchor {
            prior_top: self.metrics.scroll_top,
            prior_height: self.metrics.scroll_height,
        }
    }
}

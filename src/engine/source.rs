use std::cell::Cell;
use std::rc::Rc;

use crate::foundation::core::Size;
use crate::foundation::math::clamp01;

/// Raw scroll-container measurements for one sample.
///
/// `viewport_extent` and `content_extent` are measured along the scroll axis; `cross_extent` is
/// the viewport size on the perpendicular axis.
#[derive(Clone, Copy, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ScrollMetrics {
    pub scroll_offset: f64,
    #[serde(default)]
    pub cross_extent: f64,
    pub content_extent: f64,
    pub viewport_extent: f64,
}

impl ScrollMetrics {
    /// Scrollable distance; `0` when the content fits the viewport.
    pub fn max_scroll(&self) -> f64 {
        (self.content_extent - self.viewport_extent).max(0.0)
    }

    /// `scroll_offset / (content − viewport)` clamped to `[0, 1]`, or `0` for a degenerate range.
    pub fn raw_progress(&self) -> f64 {
        if self.content_extent <= self.viewport_extent {
            return 0.0;
        }
        clamp01(self.scroll_offset / (self.content_extent - self.viewport_extent))
    }

    /// Viewport size as `width = cross_extent`, `height = viewport_extent`.
    pub fn viewport(&self) -> Size {
        Size::new(self.cross_extent, self.viewport_extent)
    }
}

/// Scroll collaborator polled once per tick.
///
/// `None` means the scroll target is missing or torn down; the engine skips that tick.
pub trait ScrollSource {
    fn metrics(&self) -> Option<ScrollMetrics>;
}

impl ScrollSource for ScrollMetrics {
    fn metrics(&self) -> Option<ScrollMetrics> {
        Some(*self)
    }
}

impl<F> ScrollSource for F
where
    F: Fn() -> Option<ScrollMetrics>,
{
    fn metrics(&self) -> Option<ScrollMetrics> {
        self()
    }
}

/// Push-style scroll source: the host writes the latest metrics, the engine reads them on tick.
///
/// Repeated writes between ticks coalesce to the last value.
#[derive(Clone, Debug, Default)]
pub struct SharedScroll {
    latest: Rc<Cell<Option<ScrollMetrics>>>,
}

impl SharedScroll {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&self, metrics: ScrollMetrics) {
        self.latest.set(Some(metrics));
    }

    /// Update only the scroll offset, keeping the last known extents.
    pub fn set_offset(&self, offset: f64) {
        if let Some(mut m) = self.latest.get() {
            m.scroll_offset = offset;
            self.latest.set(Some(m));
        }
    }

    /// Mark the scroll target as gone.
    pub fn clear(&self) {
        self.latest.set(None);
    }
}

impl ScrollSource for SharedScroll {
    fn metrics(&self) -> Option<ScrollMetrics> {
        self.latest.get()
    }
}

#[cfg(test)]
#[path = "../../tests/unit/engine/source.rs"]
mod tests;

//! Scroll-driven parallax offsets.
//!
//! Each registered layer measures a reference box once through a [`LayoutProbe`] and then maps
//! the scroll position to a visibility progress `p ∈ [0, 1]` relative to that box. The progress
//! drives either a straight offset along a direction or a walk along a motion path.

use std::rc::Rc;
use std::time::Duration;

use crate::animation::ease::{Easing, EasingDef};
use crate::engine::source::ScrollMetrics;
use crate::foundation::core::{Affine, Vec2};
use crate::foundation::error::{ScrollPathError, ScrollPathResult};
use crate::foundation::math::{clamp01, lerp, normalize_or_zero};
use crate::geometry::path::{PathGeometry, SvgPath};

/// Measured position of a layer along the scroll axis.
#[derive(Clone, Copy, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct LayoutBox {
    /// Distance from the scroll origin to the top of the element.
    pub offset: f64,
    pub height: f64,
}

/// Measures a layer's reference box. `None` while the element is not laid out.
pub trait LayoutProbe {
    fn measure(&self) -> Option<LayoutBox>;
}

impl LayoutProbe for LayoutBox {
    fn measure(&self) -> Option<LayoutBox> {
        Some(*self)
    }
}

impl<F> LayoutProbe for F
where
    F: Fn() -> Option<LayoutBox>,
{
    fn measure(&self) -> Option<LayoutBox> {
        self()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Axis {
    X,
    Y,
}

/// Direction of a straight parallax offset: `"x"`, `"y"` or an explicit `[dx, dy]`.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(untagged)]
pub enum ParallaxDirection {
    Axis(Axis),
    Vector([f64; 2]),
}

impl Default for ParallaxDirection {
    fn default() -> Self {
        Self::Axis(Axis::Y)
    }
}

impl ParallaxDirection {
    /// Unit direction; a zero vector stays zero.
    pub fn unit(&self) -> Vec2 {
        match *self {
            Self::Axis(Axis::X) => Vec2::new(1.0, 0.0),
            Self::Axis(Axis::Y) => Vec2::new(0.0, 1.0),
            Self::Vector([x, y]) => normalize_or_zero(Vec2::new(x, y)),
        }
    }
}

/// Path followed by a layer instead of a straight offset.
#[derive(Clone)]
pub struct MotionPath {
    pub geometry: Rc<dyn PathGeometry>,
    /// Added to the eased progress before sampling.
    pub offset: f64,
}

impl std::fmt::Debug for MotionPath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MotionPath")
            .field("offset", &self.offset)
            .finish_non_exhaustive()
    }
}

#[derive(Clone, Debug)]
pub struct ParallaxLayer {
    pub id: String,
    pub speed: f64,
    pub direction: ParallaxDirection,
    /// Shifts the start of the visibility window, in scroll units.
    pub scroll_offset: f64,
    pub easing: Easing,
    pub motion_path: Option<MotionPath>,
    pub auto_rotate: bool,
    pub rotation_offset_degrees: f64,
}

impl ParallaxLayer {
    pub fn new(id: impl Into<String>, speed: f64) -> Self {
        Self {
            id: id.into(),
            speed,
            direction: ParallaxDirection::default(),
            scroll_offset: 0.0,
            easing: Easing::default(),
            motion_path: None,
            auto_rotate: false,
            rotation_offset_degrees: 0.0,
        }
    }

    pub fn with_direction(mut self, direction: ParallaxDirection) -> Self {
        self.direction = direction;
        self
    }

    pub fn with_scroll_offset(mut self, offset: f64) -> Self {
        self.scroll_offset = offset;
        self
    }

    pub fn with_easing(mut self, easing: Easing) -> Self {
        self.easing = easing;
        self
    }

    pub fn with_motion_path(mut self, geometry: Rc<dyn PathGeometry>, offset: f64) -> Self {
        self.motion_path = Some(MotionPath { geometry, offset });
        self
    }

    /// Rotate along the motion path tangent, plus `offset_degrees`.
    pub fn with_auto_rotate(mut self, offset_degrees: f64) -> Self {
        self.auto_rotate = true;
        self.rotation_offset_degrees = offset_degrees;
        self
    }

    fn validate(&self) -> ScrollPathResult<()> {
        if self.id.is_empty() {
            return Err(ScrollPathError::validation("parallax layer id must not be empty"));
        }
        if !self.speed.is_finite() || !self.scroll_offset.is_finite() {
            return Err(ScrollPathError::validation(format!(
                "parallax layer \"{}\" has non-finite speed or scroll offset",
                self.id
            )));
        }
        Ok(())
    }

    /// Offset for visibility progress `p`, `tangent_delta` being the path tangent window.
    pub fn transform_at(&self, p: f64, viewport_extent: f64, tangent_delta: f64) -> ParallaxTransform {
        match &self.motion_path {
            Some(path) => {
                let t = clamp01(self.easing.evaluate(p) + path.offset);
                let sample = path.geometry.sample(t, tangent_delta);
                ParallaxTransform {
                    translate: sample.point.to_vec2() * self.speed,
                    rotation_degrees: self
                        .auto_rotate
                        .then(|| sample.tangent_angle_degrees + self.rotation_offset_degrees),
                    progress: p,
                }
            }
            None => ParallaxTransform {
                translate: self.direction.unit()
                    * (lerp(-0.5, 0.5, p) * viewport_extent * self.speed),
                rotation_degrees: None,
                progress: p,
            },
        }
    }
}

/// Serialized layer description used by scenario files.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ParallaxLayerDef {
    pub id: String,
    #[serde(default = "default_speed")]
    pub speed: f64,
    #[serde(default)]
    pub direction: ParallaxDirection,
    #[serde(default)]
    pub scroll_offset: f64,
    #[serde(default)]
    pub easing: EasingDef,
    /// SVG path data for a motion path.
    #[serde(default)]
    pub path: Option<String>,
    #[serde(default)]
    pub path_offset: f64,
    #[serde(default)]
    pub auto_rotate: bool,
    #[serde(default)]
    pub rotation_offset_degrees: f64,
    /// Static reference box; scenarios have no live layout.
    pub layout: LayoutBox,
}

fn default_speed() -> f64 {
    0.5
}

impl ParallaxLayerDef {
    pub fn compile(&self) -> ScrollPathResult<ParallaxLayer> {
        let mut layer = ParallaxLayer::new(self.id.clone(), self.speed)
            .with_direction(self.direction)
            .with_scroll_offset(self.scroll_offset)
            .with_easing(Easing::from_def(&self.easing)?);
        if let Some(d) = &self.path {
            layer = layer.with_motion_path(Rc::new(SvgPath::parse(d)?), self.path_offset);
        }
        if self.auto_rotate {
            layer = layer.with_auto_rotate(self.rotation_offset_degrees);
        }
        layer.validate()?;
        Ok(layer)
    }
}

/// Computed offset for one layer.
#[derive(Clone, Copy, Debug, Default, PartialEq, serde::Serialize)]
pub struct ParallaxTransform {
    pub translate: Vec2,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rotation_degrees: Option<f64>,
    /// Visibility progress the offset was computed from.
    pub progress: f64,
}

impl ParallaxTransform {
    /// Translation followed by the optional rotation about the layer origin.
    pub fn to_affine(&self) -> Affine {
        let rotate = self
            .rotation_degrees
            .map_or(Affine::IDENTITY, |deg| Affine::rotate(deg.to_radians()));
        Affine::translate(self.translate) * rotate
    }
}

/// Visibility progress of a reference box for the given scroll position.
///
/// `0` when the box is just below the viewport, `1` once it has scrolled past the top. A zero
/// denominator yields `0.5`.
pub fn visibility_progress(
    scroll: f64,
    viewport_extent: f64,
    reference: LayoutBox,
    scroll_offset: f64,
) -> f64 {
    let start = reference.offset - viewport_extent;
    let end = reference.offset + reference.height;
    let denom = end - start;
    if denom == 0.0 {
        return 0.5;
    }
    clamp01((scroll - (start - scroll_offset)) / denom)
}

#[derive(Clone, Copy, Debug, PartialEq)]
enum Capture {
    /// First measurement taken at registration; retried once after the settle delay.
    Provisional {
        reference: Option<LayoutBox>,
        retry_at: Option<Duration>,
    },
    Settled(Option<LayoutBox>),
}

impl Capture {
    fn reference(&self) -> Option<LayoutBox> {
        match *self {
            Self::Provisional { reference, .. } | Self::Settled(reference) => reference,
        }
    }
}

struct Entry {
    layer: ParallaxLayer,
    probe: Box<dyn LayoutProbe>,
    capture: Capture,
    transform: Option<ParallaxTransform>,
}

/// Owned collection of parallax layers, updated once per engine tick.
pub struct ParallaxRegistry {
    entries: Vec<Entry>,
    settle_delay: Duration,
    tangent_delta: f64,
}

impl std::fmt::Debug for ParallaxRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ParallaxRegistry")
            .field("layers", &self.ids().collect::<Vec<_>>())
            .field("settle_delay", &self.settle_delay)
            .finish()
    }
}

impl ParallaxRegistry {
    pub fn new(settle_delay: Duration, tangent_delta: f64) -> Self {
        Self {
            entries: Vec::new(),
            settle_delay,
            tangent_delta,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|e| e.layer.id.as_str())
    }

    /// Register a layer and take its first measurement right away.
    pub fn register(
        &mut self,
        layer: ParallaxLayer,
        probe: impl LayoutProbe + 'static,
    ) -> ScrollPathResult<()> {
        layer.validate()?;
        if self.entries.iter().any(|e| e.layer.id == layer.id) {
            return Err(ScrollPathError::validation(format!(
                "duplicate parallax layer id \"{}\"",
                layer.id
            )));
        }
        let reference = probe.measure();
        tracing::debug!(id = %layer.id, ?reference, "parallax layer captured");
        self.entries.push(Entry {
            layer,
            probe: Box::new(probe),
            capture: Capture::Provisional {
                reference,
                retry_at: None,
            },
            transform: None,
        });
        Ok(())
    }

    pub fn unregister(&mut self, id: &str) -> bool {
        let before = self.entries.len();
        self.entries.retain(|e| e.layer.id != id);
        before != self.entries.len()
    }

    /// Re-measure every layer now, e.g. after a resize.
    pub fn recapture(&mut self) {
        for entry in &mut self.entries {
            let reference = entry.probe.measure().or(entry.capture.reference());
            entry.capture = Capture::Settled(reference);
        }
        tracing::debug!(layers = self.entries.len(), "parallax layouts re-captured");
    }

    /// Recompute every layer's transform for `metrics` at engine time `now`.
    ///
    /// The settle delay starts at the first update after registration.
    pub fn update(&mut self, metrics: &ScrollMetrics, now: Duration) {
        for entry in &mut self.entries {
            if let Capture::Provisional { reference, retry_at } = entry.capture {
                match retry_at {
                    None => {
                        entry.capture = Capture::Provisional {
                            reference,
                            retry_at: Some(now + self.settle_delay),
                        };
                    }
                    Some(at) if now >= at => {
                        let settled = entry.probe.measure().or(reference);
                        tracing::debug!(id = %entry.layer.id, reference = ?settled, "parallax layout settled");
                        entry.capture = Capture::Settled(settled);
                    }
                    Some(_) => {}
                }
            }

            entry.transform = entry.capture.reference().map(|reference| {
                let p = visibility_progress(
                    metrics.scroll_offset,
                    metrics.viewport_extent,
                    reference,
                    entry.layer.scroll_offset,
                );
                entry
                    .layer
                    .transform_at(p, metrics.viewport_extent, self.tangent_delta)
            });
        }
    }

    /// Latest transform of layer `id`; `None` for unknown or not yet measured layers.
    pub fn transform(&self, id: &str) -> Option<ParallaxTransform> {
        self.entries
            .iter()
            .find(|e| e.layer.id == id)
            .and_then(|e| e.transform)
    }

    /// Every computed transform in registration order.
    pub fn transforms(&self) -> impl Iterator<Item = (&str, ParallaxTransform)> {
        self.entries
            .iter()
            .filter_map(|e| e.transform.map(|t| (e.layer.id.as_str(), t)))
    }
}

#[cfg(test)]
#[path = "../../tests/unit/parallax/layer.rs"]
mod tests;

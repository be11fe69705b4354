//! Path geometry providers.
//!
//! Every provider exposes `sample_point(t)` over normalized `t ∈ [0, 1]` (clamped before use).
//! Tangent angles are derived numerically from two nearby samples rather than stored.

use kurbo::{ParamCurve, ParamCurveArclen, PathSeg};

use crate::foundation::core::{BezPath, Point};
use crate::foundation::error::{ScrollPathError, ScrollPathResult};
use crate::foundation::math::clamp01;

/// Default half-width of the tangent estimation window, in normalized units.
pub const DEFAULT_TANGENT_DELTA: f64 = 0.001;

const ARCLEN_ACCURACY: f64 = 1e-6;

/// Point plus direction of travel at a given parameter.
#[derive(Clone, Copy, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct PathSample {
    pub point: Point,
    pub tangent_angle_degrees: f64,
}

/// Capability interface over an arbitrary parametrized curve.
pub trait PathGeometry {
    /// Point at normalized parameter `t` (clamped to `[0, 1]`).
    fn sample_point(&self, t: f64) -> Point;

    /// Arc length for length-parametrized sources.
    fn total_length(&self) -> Option<f64> {
        None
    }

    /// Tangent angle in degrees, estimated from samples at `t − delta` and `t + delta`.
    fn tangent_angle(&self, t: f64, delta: f64) -> f64 {
        let t = clamp01(t);
        let a = self.sample_point(clamp01(t - delta));
        let b = self.sample_point(clamp01(t + delta));
        tangent_angle_degrees(a, b)
    }

    fn sample(&self, t: f64, delta: f64) -> PathSample {
        PathSample {
            point: self.sample_point(t),
            tangent_angle_degrees: self.tangent_angle(t, delta),
        }
    }
}

/// `atan2(Δy, Δx)` in degrees. Coincident points yield `0`.
pub fn tangent_angle_degrees(a: Point, b: Point) -> f64 {
    let d = b - a;
    if d.x == 0.0 && d.y == 0.0 {
        return 0.0;
    }
    d.y.atan2(d.x).to_degrees()
}

/// Explicit callable `t -> Point`.
pub struct FnPath<F> {
    f: F,
}

impl<F> FnPath<F>
where
    F: Fn(f64) -> Point,
{
    pub fn new(f: F) -> Self {
        Self { f }
    }
}

impl<F> PathGeometry for FnPath<F>
where
    F: Fn(f64) -> Point,
{
    fn sample_point(&self, t: f64) -> Point {
        (self.f)(clamp01(t))
    }
}

/// Pre-existing curve handle that can be sampled by arc length.
pub trait NativeCurve {
    fn total_length(&self) -> f64;

    /// Point at `length` along the curve, `0 ≤ length ≤ total_length`.
    fn point_at_length(&self, length: f64) -> Point;
}

/// Adapts a [`NativeCurve`] to [`PathGeometry`], parametrizing by arc length.
///
/// The tangent window is `delta · total_length` in length units so precision does not depend
/// on how long the curve is.
pub struct NativePath<C> {
    curve: C,
}

impl<C: NativeCurve> NativePath<C> {
    pub fn new(curve: C) -> Self {
        Self { curve }
    }

    pub fn curve(&self) -> &C {
        &self.curve
    }
}

impl<C: NativeCurve> PathGeometry for NativePath<C> {
    fn sample_point(&self, t: f64) -> Point {
        sample_by_length(&self.curve, t)
    }

    fn total_length(&self) -> Option<f64> {
        Some(self.curve.total_length())
    }

    fn tangent_angle(&self, t: f64, delta: f64) -> f64 {
        tangent_by_length(&self.curve, t, delta)
    }
}

fn sample_by_length<C: NativeCurve + ?Sized>(curve: &C, t: f64) -> Point {
    curve.point_at_length(clamp01(t) * curve.total_length())
}

fn tangent_by_length<C: NativeCurve + ?Sized>(curve: &C, t: f64, delta: f64) -> f64 {
    let total = curve.total_length();
    let at = clamp01(t) * total;
    let window = delta * total;
    let a = curve.point_at_length((at - window).clamp(0.0, total));
    let b = curve.point_at_length((at + window).clamp(0.0, total));
    tangent_angle_degrees(a, b)
}

/// SVG path data compiled once into an arc-length-parametrized sampler.
#[derive(Clone, Debug)]
pub struct SvgPath {
    path: BezPath,
    segments: Vec<PathSeg>,
    // Cumulative arc length at the end of each segment.
    ends: Vec<f64>,
}

impl SvgPath {
    /// Parse SVG path data (`M0 0 L600 0`, `M0 0 C...`).
    #[tracing::instrument(level = "debug")]
    pub fn parse(d: &str) -> ScrollPathResult<Self> {
        let d = d.trim();
        if d.is_empty() {
            return Err(ScrollPathError::geometry("svg path data must be non-empty"));
        }
        let path = BezPath::from_svg(d)
            .map_err(|e| ScrollPathError::geometry(format!("invalid svg path data: {e}")))?;
        Self::from_bez_path(path)
    }

    /// Compile an existing kurbo path.
    pub fn from_bez_path(path: BezPath) -> ScrollPathResult<Self> {
        let segments: Vec<PathSeg> = path.segments().collect();
        if segments.is_empty() {
            return Err(ScrollPathError::geometry("path has no drawable segments"));
        }

        let mut ends = Vec::with_capacity(segments.len());
        let mut acc = 0.0;
        for seg in &segments {
            acc += seg.arclen(ARCLEN_ACCURACY);
            ends.push(acc);
        }
        if !(acc.is_finite() && acc > 0.0) {
            return Err(ScrollPathError::geometry("path has zero length"));
        }

        tracing::debug!(segments = segments.len(), length = acc, "compiled path");
        Ok(Self {
            path,
            segments,
            ends,
        })
    }

    pub fn bez_path(&self) -> &BezPath {
        &self.path
    }

    pub fn length(&self) -> f64 {
        self.ends.last().copied().unwrap_or(0.0)
    }
}

impl NativeCurve for SvgPath {
    fn total_length(&self) -> f64 {
        self.length()
    }

    fn point_at_length(&self, length: f64) -> Point {
        let total = self.length();
        let length = length.clamp(0.0, total);
        let idx = self
            .ends
            .partition_point(|&end| end < length)
            .min(self.segments.len() - 1);
        let start = if idx == 0 { 0.0 } else { self.ends[idx - 1] };
        let seg = &self.segments[idx];
        let seg_len = self.ends[idx] - start;
        let u = if seg_len > 0.0 {
            seg.inv_arclen(length - start, ARCLEN_ACCURACY)
        } else {
            0.0
        };
        seg.eval(u)
    }
}

impl PathGeometry for SvgPath {
    fn sample_point(&self, t: f64) -> Point {
        sample_by_length(self, t)
    }

    fn total_length(&self) -> Option<f64> {
        Some(self.length())
    }

    fn tangent_angle(&self, t: f64, delta: f64) -> f64 {
        tangent_by_length(self, t, delta)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/geometry/path.rs"]
mod tests;

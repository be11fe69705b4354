use std::fmt;
use std::rc::Rc;
use std::str::FromStr;

use crate::foundation::error::{ScrollPathError, ScrollPathResult};
use crate::foundation::math::clamp01;

/// Built-in easing table used to shape normalized progress.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Ease {
    /// Identity.
    Linear,
    /// Quadratic ease-in.
    InQuad,
    /// Quadratic ease-out.
    OutQuad,
    /// Quadratic ease-in/out.
    InOutQuad,
    /// Cubic ease-in.
    InCubic,
    /// Cubic ease-out.
    OutCubic,
    /// Cubic ease-in/out.
    InOutCubic,
    /// Exponential ease-out.
    OutExpo,
    /// Exponential ease-in/out.
    InOutExpo,
    /// Hermite `t²(3−2t)`.
    Smoothstep,
    /// Perlin's quintic `t³(6t²−15t+10)`.
    Smootherstep,
}

impl Ease {
    /// Every entry of the table, in declaration order.
    pub const ALL: [Ease; 11] = [
        Ease::Linear,
        Ease::InQuad,
        Ease::OutQuad,
        Ease::InOutQuad,
        Ease::InCubic,
        Ease::OutCubic,
        Ease::InOutCubic,
        Ease::OutExpo,
        Ease::InOutExpo,
        Ease::Smoothstep,
        Ease::Smootherstep,
    ];

    /// Canonical snake_case name.
    pub fn name(self) -> &'static str {
        match self {
            Self::Linear => "linear",
            Self::InQuad => "ease_in_quad",
            Self::OutQuad => "ease_out_quad",
            Self::InOutQuad => "ease_in_out_quad",
            Self::InCubic => "ease_in_cubic",
            Self::OutCubic => "ease_out_cubic",
            Self::InOutCubic => "ease_in_out_cubic",
            Self::OutExpo => "ease_out_expo",
            Self::InOutExpo => "ease_in_out_expo",
            Self::Smoothstep => "smoothstep",
            Self::Smootherstep => "smootherstep",
        }
    }

    /// Look up a table entry by name.
    ///
    /// Matching ignores case and `_`/`-` separators, so `ease_in_out_cubic`, `easeInOutCubic`
    /// and `ease-in-out-cubic` all resolve to [`Ease::InOutCubic`].
    pub fn from_name(name: &str) -> ScrollPathResult<Self> {
        let key = fold_name(name);
        Self::ALL
            .into_iter()
            .find(|e| fold_name(e.name()) == key)
            .ok_or_else(|| ScrollPathError::invalid_easing(name))
    }

    /// Apply this easing function to normalized progress `t` in `[0, 1]`.
    pub fn apply(self, t: f64) -> f64 {
        let t = clamp01(t);
        match self {
            Self::Linear => t,
            Self::InQuad => t * t,
            Self::OutQuad => 1.0 - (1.0 - t) * (1.0 - t),
            Self::InOutQuad => {
                if t < 0.5 {
                    2.0 * t * t
                } else {
                    1.0 - ((-2.0 * t + 2.0).powi(2) / 2.0)
                }
            }
            Self::InCubic => t * t * t,
            Self::OutCubic => 1.0 - (1.0 - t).powi(3),
            Self::InOutCubic => {
                if t < 0.5 {
                    4.0 * t * t * t
                } else {
                    1.0 - ((-2.0 * t + 2.0).powi(3) / 2.0)
                }
            }
            Self::OutExpo => {
                if t >= 1.0 {
                    1.0
                } else {
                    1.0 - 2f64.powf(-10.0 * t)
                }
            }
            Self::InOutExpo => {
                if t <= 0.0 {
                    0.0
                } else if t >= 1.0 {
                    1.0
                } else if t < 0.5 {
                    2f64.powf(20.0 * t - 10.0) / 2.0
                } else {
                    (2.0 - 2f64.powf(-20.0 * t + 10.0)) / 2.0
                }
            }
            Self::Smoothstep => t * t * (3.0 - 2.0 * t),
            Self::Smootherstep => t * t * t * (t * (6.0 * t - 15.0) + 10.0),
        }
    }
}

impl FromStr for Ease {
    type Err = ScrollPathError;

    fn from_str(s: &str) -> ScrollPathResult<Self> {
        Self::from_name(s)
    }
}

fn fold_name(name: &str) -> String {
    name.chars()
        .filter(|c| !matches!(c, '_' | '-' | ' '))
        .map(|c| c.to_ascii_lowercase())
        .collect()
}

const NEWTON_ITERATIONS: usize = 8;
const NEWTON_TOLERANCE: f64 = 1e-3;
const MIN_SLOPE: f64 = 1e-6;

/// CSS-style cubic bezier easing with endpoints fixed at `(0,0)` and `(1,1)`.
///
/// The x-axis is the time domain. Control `y` values may leave `[0, 1]`, producing overshoot.
/// Serialized as `[x1, y1, x2, y2]`; deserialization goes through [`CubicBezier::new`].
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(try_from = "[f64; 4]", into = "[f64; 4]")]
pub struct CubicBezier {
    x1: f64,
    y1: f64,
    x2: f64,
    y2: f64,
}

impl CubicBezier {
    /// CSS `ease`.
    pub const EASE: Self = Self::from_raw(0.25, 0.1, 0.25, 1.0);
    /// CSS `ease-in`.
    pub const EASE_IN: Self = Self::from_raw(0.42, 0.0, 1.0, 1.0);
    /// CSS `ease-out`.
    pub const EASE_OUT: Self = Self::from_raw(0.0, 0.0, 0.58, 1.0);
    /// CSS `ease-in-out`.
    pub const EASE_IN_OUT: Self = Self::from_raw(0.42, 0.0, 0.58, 1.0);

    const fn from_raw(x1: f64, y1: f64, x2: f64, y2: f64) -> Self {
        Self { x1, y1, x2, y2 }
    }

    /// Create a validated curve. `x1` and `x2` must lie in `[0, 1]` so the time axis stays
    /// monotonic; `y1` and `y2` only need to be finite.
    pub fn new(x1: f64, y1: f64, x2: f64, y2: f64) -> ScrollPathResult<Self> {
        if ![x1, y1, x2, y2].iter().all(|v| v.is_finite()) {
            return Err(ScrollPathError::validation(
                "cubic bezier control points must be finite",
            ));
        }
        if !(0.0..=1.0).contains(&x1) || !(0.0..=1.0).contains(&x2) {
            return Err(ScrollPathError::validation(
                "cubic bezier x control points must be within [0, 1]",
            ));
        }
        Ok(Self { x1, y1, x2, y2 })
    }

    /// Control points as `[x1, y1, x2, y2]`.
    pub fn control_points(&self) -> [f64; 4] {
        [self.x1, self.y1, self.x2, self.y2]
    }

    /// Evaluate the curve at time `x` (clamped to `[0, 1]`).
    pub fn apply(&self, x: f64) -> f64 {
        let x = clamp01(x);
        let u = self.solve_param(x);
        bezier_component(self.y1, self.y2, u)
    }

    /// Newton–Raphson solve for the curve parameter `u` with `Bx(u) = x`.
    fn solve_param(&self, x: f64) -> f64 {
        let mut u = x;
        for _ in 0..NEWTON_ITERATIONS {
            let err = bezier_component(self.x1, self.x2, u) - x;
            if err.abs() < NEWTON_TOLERANCE {
                break;
            }
            let slope = bezier_derivative(self.x1, self.x2, u);
            // Near-vertical tangent: keep the current estimate.
            if slope.abs() < MIN_SLOPE {
                break;
            }
            u = (u - err / slope).clamp(0.0, 1.0);
        }
        u
    }
}

impl TryFrom<[f64; 4]> for CubicBezier {
    type Error = ScrollPathError;

    fn try_from([x1, y1, x2, y2]: [f64; 4]) -> ScrollPathResult<Self> {
        Self::new(x1, y1, x2, y2)
    }
}

impl From<CubicBezier> for [f64; 4] {
    fn from(b: CubicBezier) -> Self {
        b.control_points()
    }
}

fn bezier_component(a1: f64, a2: f64, u: f64) -> f64 {
    let omu = 1.0 - u;
    3.0 * omu * omu * u * a1 + 3.0 * omu * u * u * a2 + u * u * u
}

fn bezier_derivative(a1: f64, a2: f64, u: f64) -> f64 {
    let omu = 1.0 - u;
    3.0 * omu * omu * a1 + 6.0 * omu * u * (a2 - a1) + 3.0 * u * u * (1.0 - a2)
}

/// A resolved easing: a table entry, a bezier curve, or a caller-supplied function.
#[derive(Clone)]
pub enum Easing {
    /// Entry from the built-in table.
    Named(Ease),
    /// Synthesized cubic bezier curve.
    Bezier(CubicBezier),
    /// Custom function; bypasses the table entirely.
    Custom(Rc<dyn Fn(f64) -> f64>),
}

impl Default for Easing {
    fn default() -> Self {
        Self::Named(Ease::Linear)
    }
}

impl fmt::Debug for Easing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Named(e) => f.debug_tuple("Named").field(e).finish(),
            Self::Bezier(b) => f.debug_tuple("Bezier").field(b).finish(),
            Self::Custom(func) => f
                .debug_tuple("Custom")
                .field(&Rc::as_ptr(func).cast::<()>())
                .finish(),
        }
    }
}

impl From<Ease> for Easing {
    fn from(e: Ease) -> Self {
        Self::Named(e)
    }
}

impl From<CubicBezier> for Easing {
    fn from(b: CubicBezier) -> Self {
        Self::Bezier(b)
    }
}

impl Easing {
    /// Resolve a name against the table, then the CSS keyword presets
    /// (`ease`, `ease_in`, `ease_out`, `ease_in_out`).
    pub fn named(name: &str) -> ScrollPathResult<Self> {
        if let Ok(e) = Ease::from_name(name) {
            return Ok(Self::Named(e));
        }
        let preset = match fold_name(name).as_str() {
            "ease" => CubicBezier::EASE,
            "easein" => CubicBezier::EASE_IN,
            "easeout" => CubicBezier::EASE_OUT,
            "easeinout" => CubicBezier::EASE_IN_OUT,
            _ => return Err(ScrollPathError::invalid_easing(name)),
        };
        Ok(Self::Bezier(preset))
    }

    /// Wrap a custom shaping function.
    pub fn custom(f: impl Fn(f64) -> f64 + 'static) -> Self {
        Self::Custom(Rc::new(f))
    }

    /// Build from a serde boundary definition.
    pub fn from_def(def: &EasingDef) -> ScrollPathResult<Self> {
        match def {
            EasingDef::Name(name) => Self::named(name),
            EasingDef::CubicBezier { cubic_bezier } => {
                Ok(Self::Bezier(CubicBezier::try_from(*cubic_bezier)?))
            }
        }
    }

    /// Evaluate at `t`, clamped to `[0, 1]` before application.
    pub fn evaluate(&self, t: f64) -> f64 {
        let t = clamp01(t);
        match self {
            Self::Named(e) => e.apply(t),
            Self::Bezier(b) => b.apply(t),
            Self::Custom(f) => f(t),
        }
    }
}

/// Evaluate `easing` at `t`.
pub fn evaluate(easing: &Easing, t: f64) -> f64 {
    easing.evaluate(t)
}

/// Serialized easing definition: a table name or `{ "cubic_bezier": [x1, y1, x2, y2] }`.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(untagged)]
pub enum EasingDef {
    /// Table or preset name.
    Name(String),
    /// Explicit bezier control points.
    CubicBezier {
        /// `[x1, y1, x2, y2]`.
        cubic_bezier: [f64; 4],
    },
}

impl Default for EasingDef {
    fn default() -> Self {
        Self::Name(Ease::Linear.name().to_owned())
    }
}

impl TryFrom<&EasingDef> for Easing {
    type Error = ScrollPathError;

    fn try_from(def: &EasingDef) -> ScrollPathResult<Self> {
        Self::from_def(def)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/animation/ease.rs"]
mod tests;

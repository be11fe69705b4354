//! Curve-local to external (screen) space mapping.

use crate::foundation::core::{Affine, Point};

/// Result of mapping a curve-local point.
///
/// When `resolved` is `false` the point is the origin sentinel and must be treated as
/// "not yet resolvable" rather than a real position.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct MappedPoint {
    pub point: Point,
    pub resolved: bool,
}

impl MappedPoint {
    pub const UNRESOLVED: Self = Self {
        point: Point::ORIGIN,
        resolved: false,
    };
}

/// Supplies the current curve-local to external transform, if one exists yet.
pub trait TransformSource {
    fn current_transform(&self) -> Option<Affine>;
}

impl TransformSource for Affine {
    fn current_transform(&self) -> Option<Affine> {
        Some(*self)
    }
}

impl TransformSource for Option<Affine> {
    fn current_transform(&self) -> Option<Affine> {
        *self
    }
}

impl<F> TransformSource for F
where
    F: Fn() -> Option<Affine>,
{
    fn current_transform(&self) -> Option<Affine> {
        self()
    }
}

/// A transform is usable when all six coefficients are finite and it is invertible.
///
/// Collapsed elements (not laid out, hidden) report an all-zero matrix.
pub fn is_resolvable(transform: &Affine) -> bool {
    transform.as_coeffs().iter().all(|c| c.is_finite()) && transform.determinant() != 0.0
}

/// Map `point` through `transform`.
pub fn map_to_external_space(point: Point, transform: Option<Affine>) -> MappedPoint {
    match transform {
        Some(t) if is_resolvable(&t) => MappedPoint {
            point: t * point,
            resolved: true,
        },
        _ => MappedPoint::UNRESOLVED,
    }
}

#[cfg(test)]
#[path = "../../tests/unit/geometry/mapper.rs"]
mod tests;

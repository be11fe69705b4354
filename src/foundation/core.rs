use crate::foundation::error::{ScrollPathError, ScrollPathResult};

pub use kurbo::{Affine, BezPath, Point, Size, Vec2};

/// Direction of travel along the progress axis between two consecutive ticks.
///
/// Serialized as `1` / `-1`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(into = "i8", try_from = "i8")]
pub enum Direction {
    /// Progress stayed the same or increased.
    #[default]
    Forward,
    /// Progress decreased.
    Backward,
}

impl Direction {
    /// `Forward` when `current >= previous`, `Backward` otherwise.
    pub fn between(previous: f64, current: f64) -> Self {
        if current >= previous {
            Self::Forward
        } else {
            Self::Backward
        }
    }

    /// Signed unit value (`1` or `-1`).
    pub fn sign(self) -> i8 {
        match self {
            Self::Forward => 1,
            Self::Backward => -1,
        }
    }

    /// Return `true` for [`Direction::Forward`].
    pub fn is_forward(self) -> bool {
        matches!(self, Self::Forward)
    }
}

impl From<Direction> for i8 {
    fn from(d: Direction) -> Self {
        d.sign()
    }
}

impl TryFrom<i8> for Direction {
    type Error = ScrollPathError;

    fn try_from(v: i8) -> ScrollPathResult<Self> {
        match v {
            1 => Ok(Self::Forward),
            -1 => Ok(Self::Backward),
            other => Err(ScrollPathError::validation(format!(
                "direction must be 1 or -1, got {other}"
            ))),
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/core.rs"]
mod tests;

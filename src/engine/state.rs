use std::cell::Cell;
use std::rc::Rc;

use crate::foundation::core::{Direction, Point, Size};

/// Immutable per-tick snapshot published to subscribers.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct FollowerState {
    /// Raw scroll progress in `[0, 1]`.
    pub scroll_progress: f64,
    /// Smoothed progress in `[0, 1]`; this is what segments are tracked against.
    pub path_progress: f64,
    pub eased_progress: f64,
    /// Curve-local position.
    pub position: Point,
    /// Position mapped to external space; the origin when `screen_resolved` is false.
    pub screen_position: Point,
    pub screen_resolved: bool,
    pub tangent_angle_degrees: f64,
    pub viewport: Size,
    pub direction: Direction,
    /// Progress units per second.
    pub velocity: f64,
}

impl Default for FollowerState {
    fn default() -> Self {
        Self {
            scroll_progress: 0.0,
            path_progress: 0.0,
            eased_progress: 0.0,
            position: Point::ORIGIN,
            screen_position: Point::ORIGIN,
            screen_resolved: false,
            tangent_angle_degrees: 0.0,
            viewport: Size::ZERO,
            direction: Direction::Forward,
            velocity: 0.0,
        }
    }
}

/// Shared read handle on the latest published snapshot.
///
/// Cloning is cheap; every clone observes the same cell.
#[derive(Clone, Debug, Default)]
pub struct StateHandle {
    cell: Rc<Cell<FollowerState>>,
}

impl StateHandle {
    pub fn get(&self) -> FollowerState {
        self.cell.get()
    }

    pub(crate) fn publish(&self, state: FollowerState) {
        self.cell.set(state);
    }
}

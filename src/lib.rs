//! scrollpath turns a scroll position into motion along a path.
//!
//! Once per display frame the [`ProgressEngine`] samples the scroll container, derives a progress
//! value in `[0, 1]` and publishes a [`FollowerState`] describing where a follower sits on a
//! curve, which way it faces and how fast it moves.
//!
//! # Pipeline overview
//!
//! 1. **Measure**: a [`ScrollSource`] reports [`ScrollMetrics`]; raw progress is
//!    `offset / (content − viewport)`.
//! 2. **Smooth**: a single-pole filter ([`ProgressSmoother`]) adds inertia.
//! 3. **Ease**: an [`Easing`] reshapes progress (named table, cubic bezier, or custom function).
//! 4. **Sample**: a [`PathGeometry`] yields the point and tangent angle at the eased progress.
//! 5. **Map**: a [`TransformSource`] maps the curve-local point to external space.
//! 6. **Track**: the [`SegmentTracker`] emits enter/exit/progress events for named ranges.
//! 7. **Publish**: subscribers receive the snapshot after all state has been updated.
//!
//! Parallax layers ([`ParallaxRegistry`]) are updated from the same tick.
//!
//! Everything is single-threaded. Hosts drive the engine either by calling
//! [`ProgressEngine::advance`] themselves or through a [`FrameLoop`] over a [`FrameScheduler`].
#![forbid(unsafe_code)]

mod animation;
mod engine;
mod foundation;
mod geometry;
mod parallax;
mod tracking;

pub use animation::ease::{CubicBezier, Ease, Easing, EasingDef, evaluate};
pub use animation::smooth::ProgressSmoother;
pub use engine::config::{DEFAULT_SETTLE_DELAY_MS, DEFAULT_SMOOTHING, EngineConfig};
pub use engine::progress::{ProgressEngine, TickDispatch};
pub use engine::scheduler::{
    FrameCallback, FrameLoop, FrameScheduler, ManualFrameScheduler, RunFlag,
};
pub use engine::source::{ScrollMetrics, ScrollSource, SharedScroll};
pub use engine::state::{FollowerState, StateHandle};
pub use foundation::core::{Affine, BezPath, Direction, Point, Size, Vec2};
pub use foundation::error::{ScrollPathError, ScrollPathResult};
pub use foundation::math::{clamp01, lerp};
pub use foundation::observer::{Broadcast, CompositeSubscription, SubscriberList, Subscription};
pub use geometry::mapper::{MappedPoint, TransformSource, is_resolvable, map_to_external_space};
pub use geometry::path::{
    DEFAULT_TANGENT_DELTA, FnPath, NativeCurve, NativePath, PathGeometry, PathSample, SvgPath,
    tangent_angle_degrees,
};
pub use parallax::layer::{
    Axis, LayoutBox, LayoutProbe, MotionPath, ParallaxDirection, ParallaxLayer, ParallaxLayerDef,
    ParallaxRegistry, ParallaxTransform, visibility_progress,
};
pub use tracking::segment::{Segment, SegmentEvent, SegmentEventKind, equal_split};
pub use tracking::tracker::{SegmentDispatch, SegmentTracker};

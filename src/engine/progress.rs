//! Per-tick pipeline.
//!
//! One tick pulls scroll metrics, derives raw progress, smooths it, eases it, samples the path,
//! maps the sample to external space, feeds the tracker and finally publishes a
//! [`FollowerState`]. Mutation and notification are split: [`ProgressEngine::advance`] updates
//! every piece of state and returns a [`TickDispatch`] that runs the callbacks afterwards.

use std::time::Duration;

use crate::animation::ease::Easing;
use crate::animation::smooth::ProgressSmoother;
use crate::engine::config::EngineConfig;
use crate::engine::scheduler::RunFlag;
use crate::engine::source::ScrollSource;
use crate::engine::state::{FollowerState, StateHandle};
use crate::foundation::core::{Affine, Direction};
use crate::foundation::error::ScrollPathResult;
use crate::foundation::math::clamp01;
use crate::foundation::observer::{
    Broadcast, CompositeSubscription, SubscriberList, Subscription,
};
use crate::geometry::mapper::{MappedPoint, TransformSource, map_to_external_space};
use crate::geometry::path::PathGeometry;
use crate::parallax::layer::{LayoutProbe, ParallaxLayer, ParallaxRegistry, ParallaxTransform};
use crate::tracking::segment::{Segment, SegmentEvent};
use crate::tracking::tracker::{SegmentDispatch, SegmentTracker};

#[derive(Clone, Copy, Debug)]
struct TickMark {
    progress: f64,
    at: Duration,
}

#[derive(Clone, Copy, Debug, Default)]
struct Pending {
    scrolls: u32,
    resized: bool,
}

pub struct ProgressEngine {
    easing: Easing,
    tangent_delta: f64,
    smoother: ProgressSmoother,
    tracker: SegmentTracker,
    parallax: ParallaxRegistry,
    scroll: Box<dyn ScrollSource>,
    geometry: Option<Box<dyn PathGeometry>>,
    transform: Box<dyn TransformSource>,
    subscribers: SubscriberList<FollowerState>,
    state: StateHandle,
    last: Option<TickMark>,
    published: bool,
    run: RunFlag,
    pending: Pending,
}

impl std::fmt::Debug for ProgressEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProgressEngine")
            .field("easing", &self.easing)
            .field("smoother", &self.smoother)
            .field("tracker", &self.tracker)
            .field("has_geometry", &self.geometry.is_some())
            .field("subscribers", &self.subscribers.len())
            .field("state", &self.state.get())
            .field("published", &self.published)
            .field("running", &self.run.is_running())
            .finish_non_exhaustive()
    }
}

impl ProgressEngine {
    /// Build an engine polling `scroll`. The transform source defaults to the identity, so
    /// curve-local and external space coincide until one is installed.
    #[tracing::instrument(level = "debug", skip_all)]
    pub fn new(config: &EngineConfig, scroll: impl ScrollSource + 'static) -> ScrollPathResult<Self> {
        config.validate()?;
        let tracker = SegmentTracker::with_segments(config.initial_segments.iter().cloned())?;
        Ok(Self {
            easing: config.easing()?,
            tangent_delta: config.tangent_delta,
            smoother: ProgressSmoother::new(config.smoothing, config.smooth)?,
            tracker,
            parallax: ParallaxRegistry::new(config.settle_delay(), config.tangent_delta),
            scroll: Box::new(scroll),
            geometry: None,
            transform: Box::new(Affine::IDENTITY),
            subscribers: SubscriberList::new(),
            state: StateHandle::default(),
            last: None,
            published: false,
            run: RunFlag::new(true),
            pending: Pending::default(),
        })
    }

    pub fn with_geometry(mut self, geometry: impl PathGeometry + 'static) -> Self {
        self.set_geometry(geometry);
        self
    }

    pub fn with_transform_source(mut self, source: impl TransformSource + 'static) -> Self {
        self.set_transform_source(source);
        self
    }

    pub fn set_geometry(&mut self, geometry: impl PathGeometry + 'static) {
        self.geometry = Some(Box::new(geometry));
    }

    /// Detach the path. Ticks still track segments but publish nothing.
    pub fn clear_geometry(&mut self) {
        self.geometry = None;
    }

    pub fn set_transform_source(&mut self, source: impl TransformSource + 'static) {
        self.transform = Box::new(source);
    }

    pub fn set_scroll_source(&mut self, scroll: impl ScrollSource + 'static) {
        self.scroll = Box::new(scroll);
    }

    pub fn set_easing(&mut self, easing: Easing) {
        self.easing = easing;
    }

    pub fn easing(&self) -> &Easing {
        &self.easing
    }

    /// Register a callback for every published snapshot.
    pub fn subscribe(&self, callback: impl Fn(&FollowerState) + 'static) -> Subscription {
        self.subscribers.subscribe(callback)
    }

    /// Latest published snapshot, or the default one before the first publish.
    pub fn current_state(&self) -> FollowerState {
        self.state.get()
    }

    pub fn state_handle(&self) -> StateHandle {
        self.state.clone()
    }

    pub fn has_published(&self) -> bool {
        self.published
    }

    pub fn tracker(&self) -> &SegmentTracker {
        &self.tracker
    }

    pub fn is_active(&self, id: &str) -> bool {
        self.tracker.is_active(id)
    }

    pub fn active_segments(&self) -> Vec<&Segment> {
        self.tracker.active_segments()
    }

    pub fn add_segment(&mut self, segment: Segment) -> ScrollPathResult<()> {
        self.tracker.add_segment(segment)
    }

    pub fn remove_segment(&mut self, id: &str) -> Option<Segment> {
        self.tracker.remove_segment(id)
    }

    pub fn subscribe_segment(
        &self,
        id: &str,
        callback: impl Fn(&SegmentEvent) + 'static,
    ) -> Subscription {
        self.tracker.subscribe(id, callback)
    }

    pub fn subscribe_all_segments(
        &self,
        callback: impl Fn(&SegmentEvent) + 'static,
    ) -> CompositeSubscription {
        self.tracker.subscribe_all(callback)
    }

    pub fn register_layer(
        &mut self,
        layer: ParallaxLayer,
        probe: impl LayoutProbe + 'static,
    ) -> ScrollPathResult<()> {
        self.parallax.register(layer, probe)
    }

    pub fn unregister_layer(&mut self, id: &str) -> bool {
        self.parallax.unregister(id)
    }

    pub fn layer_transform(&self, id: &str) -> Option<ParallaxTransform> {
        self.parallax.transform(id)
    }

    pub fn parallax(&self) -> &ParallaxRegistry {
        &self.parallax
    }

    /// Record a scroll notification. Metrics are still sampled once per tick.
    pub fn notify_scroll(&mut self) {
        self.pending.scrolls = self.pending.scrolls.saturating_add(1);
    }

    /// Record a resize notification; parallax layouts are re-captured on the next tick.
    pub fn notify_resize(&mut self) {
        self.pending.resized = true;
    }

    /// Return to the pre-first-tick state: smoother at `0`, no active segments, no previous
    /// snapshot. Segments, subscriptions and layers are kept.
    ///
    /// Segments that were active receive an `Exit` through the returned dispatch.
    #[must_use = "exit events are only delivered through the returned dispatch"]
    pub fn reset(&mut self) -> SegmentDispatch {
        self.smoother.reset(0.0);
        let exits = self.tracker.reset(0.0);
        self.last = None;
        self.published = false;
        self.pending = Pending::default();
        self.state.publish(FollowerState::default());
        tracing::debug!(exits = exits.len(), "engine reset");
        exits
    }

    pub fn run_flag(&self) -> RunFlag {
        self.run.clone()
    }

    pub fn is_running(&self) -> bool {
        self.run.is_running()
    }

    /// Stop ticking. Pending deliveries of the current tick are abandoned.
    pub fn stop(&self) {
        self.run.stop();
    }

    /// Set the run flag again. A [`FrameLoop`](crate::engine::scheduler::FrameLoop) that wound
    /// down while stopped is not re-armed by this; restart it with `FrameLoop::start`.
    pub fn resume(&self) {
        self.run.start();
    }

    /// Run one tick at frame time `now` and return the pending notifications.
    ///
    /// Returns `None` when stopped or when the scroll target is unavailable; such a frame is
    /// simply skipped.
    #[must_use = "callbacks only run when the returned dispatch is delivered"]
    pub fn advance(&mut self, now: Duration) -> Option<TickDispatch> {
        if !self.run.is_running() {
            return None;
        }
        let Some(metrics) = self.scroll.metrics() else {
            tracing::trace!("scroll target unavailable, skipping tick");
            return None;
        };

        let pending = std::mem::take(&mut self.pending);
        if pending.scrolls > 1 {
            tracing::trace!(coalesced = pending.scrolls, "scroll notifications");
        }
        if pending.resized {
            self.parallax.recapture();
        }

        let scroll_progress = metrics.raw_progress();
        let path_progress = clamp01(self.smoother.update(scroll_progress));
        let eased_progress = self.easing.evaluate(path_progress);

        let sample = self
            .geometry
            .as_deref()
            .map(|g| g.sample(eased_progress, self.tangent_delta));
        let mapped = match sample {
            Some(s) => map_to_external_space(s.point, self.transform.current_transform()),
            None => MappedPoint::UNRESOLVED,
        };

        let segments = self.tracker.update(path_progress);

        let (direction, velocity) = match self.last {
            Some(mark) => {
                let dt = now.saturating_sub(mark.at).as_secs_f64();
                let velocity = if dt > 0.0 {
                    (path_progress - mark.progress).abs() / dt
                } else {
                    0.0
                };
                (Direction::between(mark.progress, path_progress), velocity)
            }
            None => (Direction::between(0.0, path_progress), 0.0),
        };
        self.last = Some(TickMark {
            progress: path_progress,
            at: now,
        });

        self.parallax.update(&metrics, now);

        let state = match sample {
            Some(s) if mapped.resolved || self.published => Some(FollowerState {
                scroll_progress,
                path_progress,
                eased_progress,
                position: s.point,
                screen_position: mapped.point,
                screen_resolved: mapped.resolved,
                tangent_angle_degrees: s.tangent_angle_degrees,
                viewport: metrics.viewport(),
                direction,
                velocity,
            }),
            _ => None,
        };
        if let Some(state) = state {
            if !self.published {
                tracing::debug!(path_progress, "first snapshot published");
            }
            self.published = true;
            self.state.publish(state);
        }

        Some(TickDispatch {
            segments,
            state,
            subscribers: self.subscribers.broadcast(),
            run: self.run.clone(),
        })
    }

    /// [`advance`](Self::advance) and deliver immediately.
    ///
    /// Callbacks run while `self` is still borrowed; hosts whose callbacks reach back into the
    /// engine should use `advance` and deliver after releasing the borrow.
    pub fn tick(&mut self, now: Duration) -> Option<FollowerState> {
        let dispatch = self.advance(now)?;
        let state = dispatch.state().copied();
        dispatch.deliver();
        state
    }
}

/// Notifications produced by one tick: segment events first, then the snapshot.
///
/// Delivery stops as soon as the engine's run flag is cleared.
#[must_use = "callbacks only run when the dispatch is delivered"]
#[derive(Debug)]
pub struct TickDispatch {
    segments: SegmentDispatch,
    state: Option<FollowerState>,
    subscribers: Broadcast<FollowerState>,
    run: RunFlag,
}

impl TickDispatch {
    /// Snapshot published by this tick, if any.
    pub fn state(&self) -> Option<&FollowerState> {
        self.state.as_ref()
    }

    pub fn segment_events(&self) -> impl Iterator<Item = &SegmentEvent> {
        self.segments.events()
    }

    /// Run the callbacks. Returns `false` if delivery was cut short by a stop.
    pub fn deliver(self) -> bool {
        let running = || self.run.is_running();
        if !self.segments.deliver_while(running) {
            return false;
        }
        match &self.state {
            Some(state) => self.subscribers.deliver_while(state, running),
            None => true,
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/engine/progress.rs"]
mod tests;

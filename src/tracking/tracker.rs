//! Segment activation state machine.
//!
//! Each segment is either inactive or active. On every [`SegmentTracker::update`] the tracker
//! compares the previous and current activation of each segment independently and emits
//! `Enter`, `Exit` or `Progress` events. The direction of travel is computed once per update and
//! attached to every event of that update.

use std::collections::{HashMap, HashSet};
use std::rc::Rc;

use crate::foundation::core::Direction;
use crate::foundation::error::{ScrollPathError, ScrollPathResult};
use crate::foundation::math::clamp01;
use crate::foundation::observer::{
    Broadcast, CompositeSubscription, SubscriberList, Subscription,
};
use crate::tracking::segment::{Segment, SegmentEvent, SegmentEventKind};

#[derive(Debug, Default)]
pub struct SegmentTracker {
    // Insertion order is the query order.
    segments: Vec<Segment>,
    active: HashSet<String>,
    last_progress: f64,
    listeners: HashMap<String, SubscriberList<SegmentEvent>>,
}

impl SegmentTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a tracker seeded with `segments`, validating each.
    pub fn with_segments(segments: impl IntoIterator<Item = Segment>) -> ScrollPathResult<Self> {
        let mut tracker = Self::new();
        for seg in segments {
            tracker.add_segment(seg)?;
        }
        Ok(tracker)
    }

    /// Add a segment. Its activation is established on the next update; nothing is emitted now.
    pub fn add_segment(&mut self, segment: Segment) -> ScrollPathResult<()> {
        segment.validate()?;
        if self.segments.iter().any(|s| s.id == segment.id) {
            return Err(ScrollPathError::validation(format!(
                "duplicate segment id \"{}\"",
                segment.id
            )));
        }
        tracing::debug!(id = %segment.id, start = segment.start, end = segment.end, "segment added");
        self.listeners.insert(segment.id.clone(), SubscriberList::new());
        self.segments.push(segment);
        Ok(())
    }

    /// Remove a segment, dropping its active flag and every subscription to it.
    pub fn remove_segment(&mut self, id: &str) -> Option<Segment> {
        let idx = self.segments.iter().position(|s| s.id == id)?;
        self.active.remove(id);
        if let Some(list) = self.listeners.remove(id) {
            list.clear();
        }
        tracing::debug!(id, "segment removed");
        Some(self.segments.remove(idx))
    }

    /// Remove every segment and subscription.
    pub fn clear(&mut self) {
        for list in self.listeners.values() {
            list.clear();
        }
        self.listeners.clear();
        self.active.clear();
        self.segments.clear();
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    pub fn segment(&self, id: &str) -> Option<&Segment> {
        self.segments.iter().find(|s| s.id == id)
    }

    pub fn is_active(&self, id: &str) -> bool {
        self.active.contains(id)
    }

    /// Active segments in insertion order.
    pub fn active_segments(&self) -> Vec<&Segment> {
        self.segments
            .iter()
            .filter(|s| self.active.contains(&s.id))
            .collect()
    }

    pub fn last_progress(&self) -> f64 {
        self.last_progress
    }

    /// Deactivate every segment and restart direction detection from `progress`.
    ///
    /// Each segment active before the reset gets an `Exit`, so the next update's `Enter` is
    /// always paired with one.
    #[must_use = "exit events are only delivered through the returned dispatch"]
    pub fn reset(&mut self, progress: f64) -> SegmentDispatch {
        let progress = clamp01(progress);
        let direction = Direction::between(self.last_progress, progress);
        let boundary = if direction.is_forward() { 1.0 } else { 0.0 };
        let mut events = Vec::new();

        for seg in self.segments.iter().filter(|s| self.active.contains(&s.id)) {
            tracing::debug!(id = %seg.id, progress, ?direction, "segment exit on reset");
            let broadcast = self.listeners.get(&seg.id).map(SubscriberList::broadcast);
            events.push((
                SegmentEvent {
                    kind: SegmentEventKind::Exit,
                    segment: seg.clone(),
                    segment_progress: boundary,
                    path_progress: progress,
                    direction,
                },
                broadcast,
            ));
        }

        self.active.clear();
        self.last_progress = progress;
        SegmentDispatch { events }
    }

    /// Register `callback` for events of segment `id`.
    ///
    /// Unknown ids yield a detached subscription.
    pub fn subscribe(
        &self,
        id: &str,
        callback: impl Fn(&SegmentEvent) + 'static,
    ) -> Subscription {
        match self.listeners.get(id) {
            Some(list) => list.subscribe(callback),
            None => Subscription::detached(),
        }
    }

    /// Register one callback on every segment known right now.
    ///
    /// Segments added afterwards are not covered.
    pub fn subscribe_all(
        &self,
        callback: impl Fn(&SegmentEvent) + 'static,
    ) -> CompositeSubscription {
        let callback = Rc::new(callback);
        let parts = self
            .segments
            .iter()
            .filter_map(|s| self.listeners.get(&s.id))
            .map(|list| {
                let cb = Rc::clone(&callback);
                list.subscribe(move |e| (*cb)(e))
            })
            .collect();
        CompositeSubscription::new(parts)
    }

    /// Advance the state machine to `progress` (clamped to `[0, 1]`).
    ///
    /// State is fully updated before this returns; callbacks run only when the returned dispatch
    /// is delivered.
    #[must_use = "segment events are only delivered through the returned dispatch"]
    pub fn update(&mut self, progress: f64) -> SegmentDispatch {
        let progress = clamp01(progress);
        let direction = Direction::between(self.last_progress, progress);
        let mut events = Vec::new();

        for seg in &self.segments {
            let was_active = self.active.contains(&seg.id);
            let now_active = seg.contains(progress);

            let (kind, segment_progress) = match (was_active, now_active) {
                (false, true) => (SegmentEventKind::Enter, seg.local_progress(progress)),
                (true, false) => {
                    let boundary = if direction.is_forward() { 1.0 } else { 0.0 };
                    (SegmentEventKind::Exit, boundary)
                }
                (true, true) => (SegmentEventKind::Progress, seg.local_progress(progress)),
                (false, false) => continue,
            };

            match kind {
                SegmentEventKind::Enter => {
                    self.active.insert(seg.id.clone());
                    tracing::debug!(id = %seg.id, progress, ?direction, "segment enter");
                }
                SegmentEventKind::Exit => {
                    self.active.remove(&seg.id);
                    tracing::debug!(id = %seg.id, progress, ?direction, "segment exit");
                }
                SegmentEventKind::Progress => {}
            }

            let broadcast = self.listeners.get(&seg.id).map(SubscriberList::broadcast);
            events.push((
                SegmentEvent {
                    kind,
                    segment: seg.clone(),
                    segment_progress,
                    path_progress: progress,
                    direction,
                },
                broadcast,
            ));
        }

        self.last_progress = progress;
        SegmentDispatch { events }
    }
}

/// Events produced by one tracker update, paired with the callbacks to notify.
#[derive(Debug, Default)]
pub struct SegmentDispatch {
    events: Vec<(SegmentEvent, Option<Broadcast<SegmentEvent>>)>,
}

impl SegmentDispatch {
    pub fn events(&self) -> impl Iterator<Item = &SegmentEvent> {
        self.events.iter().map(|(e, _)| e)
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn deliver(&self) {
        self.deliver_while(|| true);
    }

    /// Deliver every event to its segment's callbacks while `keep_going` holds.
    pub fn deliver_while(&self, keep_going: impl Fn() -> bool) -> bool {
        for (event, broadcast) in &self.events {
            if let Some(b) = broadcast
                && !b.deliver_while(event, &keep_going)
            {
                return false;
            }
        }
        true
    }
}

#[cfg(test)]
#[path = "../../tests/unit/tracking/tracker.rs"]
mod tests;

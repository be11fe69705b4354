//! Frame scheduling.
//!
//! The engine never owns a clock. A host supplies a [`FrameScheduler`] that invokes callbacks once
//! per display frame; [`FrameLoop`] keeps one callback in flight and re-arms itself from inside it.

use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::rc::{Rc, Weak};
use std::time::Duration;

use crate::engine::progress::ProgressEngine;

/// Shared cancellation flag checked at the top of every frame and before every delivery.
#[derive(Clone, Debug)]
pub struct RunFlag(Rc<Cell<bool>>);

impl RunFlag {
    pub fn new(running: bool) -> Self {
        Self(Rc::new(Cell::new(running)))
    }

    pub fn is_running(&self) -> bool {
        self.0.get()
    }

    pub fn start(&self) {
        self.0.set(true);
    }

    pub fn stop(&self) {
        self.0.set(false);
    }
}

pub type FrameCallback = Box<dyn FnOnce(Duration)>;

/// Host hook that runs `callback` on the next frame with that frame's timestamp.
pub trait FrameScheduler {
    fn request_frame(&self, callback: FrameCallback);
}

/// Scheduler driven explicitly by the caller; used by the CLI and tests.
#[derive(Default)]
pub struct ManualFrameScheduler {
    queue: RefCell<VecDeque<FrameCallback>>,
}

impl std::fmt::Debug for ManualFrameScheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ManualFrameScheduler")
            .field("pending", &self.pending())
            .finish()
    }
}

impl ManualFrameScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn pending(&self) -> usize {
        self.queue.borrow().len()
    }

    /// Run every callback requested before this call. Callbacks requested while running are
    /// deferred to the next frame. Returns the number of callbacks run.
    pub fn run_frame(&self, now: Duration) -> usize {
        let batch: Vec<FrameCallback> = self.queue.borrow_mut().drain(..).collect();
        let n = batch.len();
        for callback in batch {
            callback(now);
        }
        n
    }
}

impl FrameScheduler for ManualFrameScheduler {
    fn request_frame(&self, callback: FrameCallback) {
        self.queue.borrow_mut().push_back(callback);
    }
}

/// Continuous tick loop over a shared engine.
///
/// At most one frame callback is in flight, including while it runs. Stopping clears the
/// engine's run flag; the in-flight callback sees it and does not re-arm. Queued callbacks hold
/// the engine and scheduler weakly, so a loop whose engine is gone ends on its next frame.
///
/// Dropping the loop stops it. The run flag is shared, so this also pauses delivery from
/// [`ProgressEngine::tick`] until [`ProgressEngine::resume`].
pub struct FrameLoop {
    engine: Rc<RefCell<ProgressEngine>>,
    scheduler: Rc<dyn FrameScheduler>,
    run: RunFlag,
    armed: Rc<Cell<bool>>,
}

impl FrameLoop {
    pub fn new(engine: Rc<RefCell<ProgressEngine>>, scheduler: Rc<dyn FrameScheduler>) -> Self {
        let run = engine.borrow().run_flag();
        Self {
            engine,
            scheduler,
            run,
            armed: Rc::new(Cell::new(false)),
        }
    }

    /// Set the run flag and request a frame unless one is already in flight. This is the only way
    /// to restart a loop that has wound down, including after an engine-level stop and resume.
    pub fn start(&self) {
        self.run.start();
        if !self.armed.get() {
            tracing::debug!("frame loop started");
            arm(
                Rc::downgrade(&self.engine),
                Rc::downgrade(&self.scheduler),
                self.run.clone(),
                Rc::clone(&self.armed),
            );
        }
    }

    pub fn stop(&self) {
        self.run.stop();
    }

    /// True while the flag is set and a frame is actually pending or running.
    pub fn is_running(&self) -> bool {
        self.run.is_running() && self.armed.get()
    }
}

impl Drop for FrameLoop {
    fn drop(&mut self) {
        self.stop();
    }
}

impl std::fmt::Debug for FrameLoop {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FrameLoop")
            .field("running", &self.run.is_running())
            .field("armed", &self.armed.get())
            .finish()
    }
}

fn arm(
    engine: Weak<RefCell<ProgressEngine>>,
    scheduler: Weak<dyn FrameScheduler>,
    run: RunFlag,
    armed: Rc<Cell<bool>>,
) {
    let Some(target) = scheduler.upgrade() else {
        armed.set(false);
        return;
    };
    armed.set(true);
    target.request_frame(Box::new(move |now| {
        if !run.is_running() {
            armed.set(false);
            tracing::debug!("frame loop stopped");
            return;
        }
        let Some(shared) = engine.upgrade() else {
            armed.set(false);
            tracing::debug!("engine dropped, frame loop ends");
            return;
        };
        // The borrow ends with this statement; callbacks may use the engine.
        let dispatch = shared.borrow_mut().advance(now);
        drop(shared);
        if let Some(dispatch) = dispatch {
            dispatch.deliver();
        }
        if run.is_running() {
            arm(engine, scheduler, run, armed);
        } else {
            armed.set(false);
        }
    }));
}

#[cfg(test)]
#[path = "../../tests/unit/engine/scheduler.rs"]
mod tests;

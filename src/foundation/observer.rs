//! Single-threaded observer lists.
//!
//! The publisher owns a [`SubscriberList`]; subscribers own only the [`Subscription`] returned
//! when they register. Delivery works from a [`Broadcast`] snapshot taken before iteration and
//! re-checks registration before every call, so a callback removed mid-delivery (by itself or by
//! an earlier callback) is never invoked afterwards.

use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};

type Callback<T> = Rc<dyn Fn(&T)>;

struct Registry<T> {
    next_id: u64,
    entries: Vec<(u64, Callback<T>)>,
}

impl<T> Registry<T> {
    fn contains(&self, id: u64) -> bool {
        self.entries.iter().any(|(e, _)| *e == id)
    }
}

/// Ordered list of callbacks for values of type `T`.
pub struct SubscriberList<T> {
    inner: Rc<RefCell<Registry<T>>>,
}

impl<T> Default for SubscriberList<T> {
    fn default() -> Self {
        Self {
            inner: Rc::new(RefCell::new(Registry {
                next_id: 0,
                entries: Vec::new(),
            })),
        }
    }
}

impl<T> SubscriberList<T> {
    pub fn len(&self) -> usize {
        self.inner.borrow().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<T> fmt::Debug for SubscriberList<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SubscriberList")
            .field("len", &self.len())
            .finish()
    }
}

impl<T: 'static> SubscriberList<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `callback`; callbacks are invoked in registration order.
    pub fn subscribe(&self, callback: impl Fn(&T) + 'static) -> Subscription {
        let id = {
            let mut reg = self.inner.borrow_mut();
            let id = reg.next_id;
            reg.next_id += 1;
            reg.entries.push((id, Rc::new(callback)));
            id
        };

        let weak: Weak<RefCell<Registry<T>>> = Rc::downgrade(&self.inner);
        Subscription::new(move || {
            if let Some(inner) = weak.upgrade() {
                inner.borrow_mut().entries.retain(|(e, _)| *e != id);
            }
        })
    }

    /// Drop every registration.
    pub fn clear(&self) {
        self.inner.borrow_mut().entries.clear();
    }

    /// Snapshot the current callbacks for later delivery.
    pub fn broadcast(&self) -> Broadcast<T> {
        Broadcast {
            registry: Rc::downgrade(&self.inner),
            entries: self.inner.borrow().entries.clone(),
        }
    }

    /// Snapshot and deliver `value` immediately.
    pub fn notify(&self, value: &T) {
        self.broadcast().deliver(value);
    }
}

/// Callbacks captured at snapshot time, still tied to their registry.
pub struct Broadcast<T> {
    registry: Weak<RefCell<Registry<T>>>,
    entries: Vec<(u64, Callback<T>)>,
}

impl<T> Broadcast<T> {
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn deliver(&self, value: &T) {
        self.deliver_while(value, || true);
    }

    /// Deliver `value`, stopping as soon as `keep_going` returns `false`.
    ///
    /// Returns `false` if delivery was cut short.
    pub fn deliver_while(&self, value: &T, keep_going: impl Fn() -> bool) -> bool {
        for (id, callback) in &self.entries {
            if !keep_going() {
                return false;
            }
            let live = self
                .registry
                .upgrade()
                .is_some_and(|reg| reg.borrow().contains(*id));
            if live {
                callback(value);
            }
        }
        true
    }
}

impl<T> fmt::Debug for Broadcast<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Broadcast")
            .field("len", &self.entries.len())
            .finish()
    }
}

/// Capability to remove one registration. Unsubscribing is idempotent.
///
/// Dropping a `Subscription` does not unsubscribe.
pub struct Subscription {
    detach: Option<Box<dyn FnOnce()>>,
}

impl Subscription {
    fn new(detach: impl FnOnce() + 'static) -> Self {
        Self {
            detach: Some(Box::new(detach)),
        }
    }

    /// A subscription that is not attached to anything.
    pub fn detached() -> Self {
        Self { detach: None }
    }

    pub fn is_attached(&self) -> bool {
        self.detach.is_some()
    }

    pub fn unsubscribe(&mut self) {
        if let Some(detach) = self.detach.take() {
            detach();
        }
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("attached", &self.is_attached())
            .finish()
    }
}

/// Several subscriptions released together, in reverse registration order.
#[derive(Debug, Default)]
pub struct CompositeSubscription {
    parts: Vec<Subscription>,
}

impl CompositeSubscription {
    pub fn new(parts: Vec<Subscription>) -> Self {
        Self { parts }
    }

    pub fn len(&self) -> usize {
        self.parts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.parts.is_empty()
    }

    pub fn unsubscribe(&mut self) {
        for part in self.parts.iter_mut().rev() {
            part.unsubscribe();
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/observer.rs"]
mod tests;

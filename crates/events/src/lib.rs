#![warn(missing_docs)]
//! Multi-listener change notifications with per-listener fault isolation.
//!
//! An [`Event`] owns an ordered list of callbacks. [`Event::invoke`] calls each
//! of them in registration order against a snapshot of the list, so listeners
//! may register or remove listeners (or mutate whatever emitted the event)
//! while a dispatch is running. A listener that panics is unwound at the
//! dispatch site and the remaining listeners still run.
//!
//! Everything here is single-threaded: listeners are `Rc`-shared closures.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::rc::Rc;

/// Handle returned by [`Event::add`], used to unregister a listener.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ListenerId(u64);

/// Outcome of a single [`Event::invoke`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DispatchReport {
    /// Listeners that were called.
    pub invoked: usize,
    /// Listeners that panicked and were discarded.
    pub faulted: usize,
}

impl DispatchReport {
    /// True when at least one listener panicked.
    pub fn has_faults(&self) -> bool {
        self.faulted > 0
    }
}

type Listener<A> = Rc<dyn Fn(&A)>;

/// An observable notification point carrying arguments of type `A`.
pub struct Event<A> {
    listeners: RefCell<Vec<(ListenerId, Listener<A>)>>,
    next_id: Cell<u64>,
    closed: Cell<bool>,
}

impl<A> Default for Event<A> {
    fn default() -> Self {
        Self {
            listeners: RefCell::new(Vec::new()),
            next_id: Cell::new(1),
            closed: Cell::new(false),
        }
    }
}

impl<A> fmt::Debug for Event<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Event")
            .field("listeners", &self.len())
            .field("closed", &self.closed.get())
            .finish()
    }
}

impl<A> Event<A> {
    /// Create an event with no listeners.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a listener.
    ///
    /// On a closed event the listener is dropped immediately; the returned id
    /// is still unique but refers to nothing.
    pub fn add<F>(&self, listener: F) -> ListenerId
    where
        F: Fn(&A) + 'static,
    {
        let id = ListenerId(self.next_id.get());
        self.next_id.set(id.0 + 1);
        if !self.closed.get() {
            self.listeners.borrow_mut().push((id, Rc::new(listener)));
        }
        id
    }

    /// Unregister a listener. Returns whether it was registered.
    pub fn remove(&self, id: ListenerId) -> bool {
        let mut listeners = self.listeners.borrow_mut();
        let before = listeners.len();
        listeners.retain(|(lid, _)| *lid != id);
        listeners.len() != before
    }

    /// Number of registered listeners.
    pub fn len(&self) -> usize {
        self.listeners.borrow().len()
    }

    /// True when nothing is registered.
    pub fn is_empty(&self) -> bool {
        self.listeners.borrow().is_empty()
    }

    /// Drop every listener. Later registrations are accepted.
    pub fn clear(&self) {
        // Dropping closures may run arbitrary destructors; release the borrow first.
        let drained = std::mem::take(&mut *self.listeners.borrow_mut());
        drop(drained);
    }

    /// Drop every listener and refuse further registrations.
    pub fn close(&self) {
        self.closed.set(true);
        self.clear();
    }

    /// Whether [`Event::close`] has been called.
    pub fn is_closed(&self) -> bool {
        self.closed.get()
    }

    /// Call every listener in registration order.
    ///
    /// Panics raised by listeners are caught and discarded; they are counted
    /// in the returned report but never re-raised.
    pub fn invoke(&self, args: &A) -> DispatchReport {
        let snapshot: Vec<Listener<A>> = self
            .listeners
            .borrow()
            .iter()
            .map(|(_, l)| Rc::clone(l))
            .collect();

        let mut report = DispatchReport::default();
        for listener in snapshot {
            report.invoked += 1;
            if catch_unwind(AssertUnwindSafe(|| listener(args))).is_err() {
                report.faulted += 1;
            }
        }
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn listeners_run_in_registration_order() {
        let event = Event::<u32>::new();
        let seen = Rc::new(RefCell::new(Vec::new()));
        for tag in 0..3 {
            let seen = Rc::clone(&seen);
            event.add(move |v: &u32| seen.borrow_mut().push((tag, *v)));
        }

        let report = event.invoke(&7);
        assert_eq!(report.invoked, 3);
        assert_eq!(*seen.borrow(), vec![(0, 7), (1, 7), (2, 7)]);
    }

    #[test]
    fn panicking_listener_does_not_block_others() {
        let event = Event::<()>::new();
        let hits = Rc::new(Cell::new(0));
        event.add(|_| panic!("faulty observer"));
        let h = Rc::clone(&hits);
        event.add(move |_| h.set(h.get() + 1));

        let report = event.invoke(&());
        assert_eq!(hits.get(), 1);
        assert_eq!(report.faulted, 1);
        assert!(report.has_faults());
    }

    #[test]
    fn remove_unregisters_listener() {
        let event = Event::<()>::new();
        let hits = Rc::new(Cell::new(0));
        let h = Rc::clone(&hits);
        let id = event.add(move |_| h.set(h.get() + 1));
        assert_eq!(event.len(), 1);
        assert!(event.remove(id));
        assert!(!event.remove(id));
        event.invoke(&());
        assert_eq!(hits.get(), 0);
        assert!(event.is_empty());
    }

    #[test]
    fn registration_during_dispatch_applies_next_time() {
        let event = Rc::new(Event::<()>::new());
        let hits = Rc::new(Cell::new(0));
        let ev = Rc::clone(&event);
        let h = Rc::clone(&hits);
        event.add(move |_| {
            let h = Rc::clone(&h);
            ev.add(move |_| h.set(h.get() + 1));
        });

        event.invoke(&());
        assert_eq!(hits.get(), 0);
        assert_eq!(event.len(), 2);

        event.invoke(&());
        assert_eq!(hits.get(), 1);
    }

    #[test]
    fn closed_event_ignores_new_listeners() {
        let event = Event::<()>::new();
        event.add(|_| {});
        event.close();
        assert!(event.is_closed());
        assert!(event.is_empty());
        event.add(|_| {});
        assert!(event.is_empty());
        assert_eq!(event.invoke(&()).invoked, 0);
    }
}

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::{Rc, Weak};

type Callback<T> = Rc<dyn Fn(&T)>;

struct Slots<T> {
    next_id: u64,
    callbacks: BTreeMap<u64, Callback<T>>,
}

trait Detach {
    fn detach(&self, id: u64) -> bool;
}

impl<T> Detach for RefCell<Slots<T>> {
    fn detach(&self, id: u64) -> bool {
        self.borrow_mut().callbacks.remove(&id).is_some()
    }
}

struct Inner<T> {
    value: RefCell<T>,
    slots: Rc<RefCell<Slots<T>>>,
}

/// Single-threaded observable value.
///
/// Every subscriber sees the same latest value; there is no per-subscriber
/// queue. Callbacks run in subscription order and may subscribe, unsubscribe
/// or read the signal while being notified.
pub struct Signal<T> {
    inner: Rc<Inner<T>>,
}

impl<T> Clone for Signal<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<T: std::fmt::Debug> std::fmt::Debug for Signal<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Signal")
            .field("value", &*self.inner.value.borrow())
            .field("subscribers", &self.inner.slots.borrow().callbacks.len())
            .finish()
    }
}

impl<T: Clone + PartialEq + 'static> Signal<T> {
    pub fn new(initial: T) -> Self {
        Self {
            inner: Rc::new(Inner {
                value: RefCell::new(initial),
                slots: Rc::new(RefCell::new(Slots {
                    next_id: 0,
                    callbacks: BTreeMap::new(),
                })),
            }),
        }
    }

    pub fn get(&self) -> T {
        self.inner.value.borrow().clone()
    }

    /// Stores `value` and notifies subscribers.
    ///
    /// Returns `false` (and notifies nobody) when the value is unchanged.
    pub fn set(&self, value: T) -> bool {
        {
            let mut current = self.inner.value.borrow_mut();
            if *current == value {
                return false;
            }
            *current = value.clone();
        }
        self.notify(&value);
        true
    }

    pub fn subscribe(&self, callback: impl Fn(&T) + 'static) -> Subscription {
        let mut slots = self.inner.slots.borrow_mut();
        let id = slots.next_id;
        slots.next_id += 1;
        slots.callbacks.insert(id, Rc::new(callback));

        let weak: Weak<RefCell<Slots<T>>> = Rc::downgrade(&self.inner.slots);
        Subscription { id, slots: weak }
    }

    pub fn subscriber_count(&self) -> usize {
        self.inner.slots.borrow().callbacks.len()
    }

    /// Read-only view for consumers that must not publish.
    pub fn reader(&self) -> ReadSignal<T> {
        ReadSignal {
            signal: self.clone(),
        }
    }

    fn notify(&self, value: &T) {
        // Snapshot first so callbacks can touch the subscriber table.
        let callbacks: Vec<Callback<T>> =
            self.inner.slots.borrow().callbacks.values().cloned().collect();
        for callback in callbacks {
            callback(value);
        }
    }
}

/// Subscribe/read handle without the ability to publish.
#[derive(Clone)]
pub struct ReadSignal<T> {
    signal: Signal<T>,
}

impl<T: Clone + PartialEq + 'static> ReadSignal<T> {
    pub fn get(&self) -> T {
        self.signal.get()
    }

    pub fn subscribe(&self, callback: impl Fn(&T) + 'static) -> Subscription {
        self.signal.subscribe(callback)
    }
}

/// Returned by `subscribe`; call `unsubscribe` to stop receiving values.
///
/// Dropping a subscription does not detach it.
pub struct Subscription {
    id: u64,
    slots: Weak<dyn Detach>,
}

impl Subscription {
    /// Returns `true` if the callback was still registered.
    pub fn unsubscribe(self) -> bool {
        match self.slots.upgrade() {
            Some(slots) => slots.detach(self.id),
            None => false,
        }
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription").field("id", &self.id).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::Signal;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[test]
    fn all_subscribers_see_latest_value() {
        let signal = Signal::new(0.0);
        let seen_a = Rc::new(RefCell::new(Vec::new()));
        let seen_b = Rc::new(RefCell::new(Vec::new()));

        let a = Rc::clone(&seen_a);
        let _sa = signal.subscribe(move |v| a.borrow_mut().push(*v));
        let b = Rc::clone(&seen_b);
        let _sb = signal.subscribe(move |v| b.borrow_mut().push(*v));

        signal.set(0.25);
        signal.set(0.5);

        assert_eq!(*seen_a.borrow(), vec![0.25, 0.5]);
        assert_eq!(*seen_b.borrow(), vec![0.25, 0.5]);
        assert_eq!(signal.get(), 0.5);
    }

    #[test]
    fn unchanged_value_is_not_republished() {
        let signal = Signal::new(1u32);
        let count = Rc::new(RefCell::new(0));
        let c = Rc::clone(&count);
        let _s = signal.subscribe(move |_| *c.borrow_mut() += 1);

        assert!(!signal.set(1));
        assert!(signal.set(2));
        assert_eq!(*count.borrow(), 1);
    }

    #[test]
    fn unsubscribe_stops_delivery() {
        let signal = Signal::new(0);
        let count = Rc::new(RefCell::new(0));
        let c = Rc::clone(&count);
        let sub = signal.subscribe(move |_| *c.borrow_mut() += 1);

        signal.set(1);
        assert!(sub.unsubscribe());
        signal.set(2);

        assert_eq!(*count.borrow(), 1);
        assert_eq!(signal.subscriber_count(), 0);
    }

    #[test]
    fn callback_may_read_and_subscribe_during_notify() {
        let signal = Signal::new(0);
        let inner = signal.clone();
        let seen = Rc::new(RefCell::new(Vec::new()));
        let s = Rc::clone(&seen);
        let _sub = signal.subscribe(move |v| {
            s.borrow_mut().push(inner.get() + *v);
            let _ = inner.subscribe(|_| {});
        });

        signal.set(3);
        assert_eq!(*seen.borrow(), vec![6]);
        assert_eq!(signal.subscriber_count(), 2);
    }

    #[test]
    fn reader_observes_without_publishing() {
        let signal = Signal::new("a".to_string());
        let reader = signal.reader();
        signal.set("b".to_string());
        assert_eq!(reader.get(), "b");
    }
}

//! Subscribable state container shared by every store in the crate.
//!
//! A `Store<T>` owns one value behind a lock. Mutations go through
//! [`Store::update`], which applies the change atomically and then hands
//! the new snapshot to every subscriber. Listeners run after the lock has
//! been released, so they are free to read the store again.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock};

type Listener<T> = Arc<dyn Fn(&T) + Send + Sync>;

/// Handle returned by [`Store::subscribe`], used to unsubscribe later.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

struct Shared<T> {
    state: RwLock<T>,
    listeners: RwLock<Vec<(SubscriptionId, Listener<T>)>>,
    next_id: AtomicU64,
}

/// Shared, subscribable state cell. Clones point at the same state.
pub struct Store<T> {
    shared: Arc<Shared<T>>,
}

impl<T: Clone> Store<T> {
    /// Create a store holding `initial`, with no subscribers.
    pub fn new(initial: T) -> Self {
        Self {
            shared: Arc::new(Shared {
                state: RwLock::new(initial),
                listeners: RwLock::new(Vec::new()),
                next_id: AtomicU64::new(1),
            }),
        }
    }

    /// Clone of the current state.
    pub fn get_state(&self) -> T {
        self.read(T::clone)
    }

    /// Run `f` against the current state without cloning it.
    pub fn read<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&T) -> R,
    {
        let state = self.shared.state.read().unwrap_or_else(PoisonError::into_inner);
        f(&state)
    }

    /// Mutate the state and notify subscribers with the result.
    pub fn update<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&mut T) -> R,
    {
        let (result, snapshot) = {
            let mut state = self.shared.state.write().unwrap_or_else(PoisonError::into_inner);
            let result = f(&mut state);
            (result, state.clone())
        };
        self.notify(&snapshot);
        result
    }

    /// Like [`Store::update`], but subscribers are only notified when `f`
    /// reports a change. Whatever `f` wrote is kept either way.
    pub fn update_if<F>(&self, f: F) -> bool
    where
        F: FnOnce(&mut T) -> bool,
    {
        let snapshot = {
            let mut state = self.shared.state.write().unwrap_or_else(PoisonError::into_inner);
            if !f(&mut state) {
                return false;
            }
            state.clone()
        };
        self.notify(&snapshot);
        true
    }

    /// Replace the state wholesale.
    pub fn set(&self, new_state: T) {
        self.update(|state| *state = new_state);
    }

    /// Register a listener called after every mutation.
    pub fn subscribe<F>(&self, listener: F) -> SubscriptionId
    where
        F: Fn(&T) + Send + Sync + 'static,
    {
        let id = SubscriptionId(self.shared.next_id.fetch_add(1, Ordering::Relaxed));
        self.shared
            .listeners
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push((id, Arc::new(listener)));
        id
    }

    /// Remove a listener. Returns false if it was already gone.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut listeners = self
            .shared
            .listeners
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        let before = listeners.len();
        listeners.retain(|(existing, _)| *existing != id);
        listeners.len() != before
    }

    /// Number of registered listeners.
    pub fn subscriber_count(&self) -> usize {
        self.shared
            .listeners
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    fn notify(&self, snapshot: &T) {
        // Snapshot the listener list so callbacks may (un)subscribe.
        let listeners: Vec<Listener<T>> = self
            .shared
            .listeners
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .map(|(_, listener)| Arc::clone(listener))
            .collect();
        for listener in listeners {
            listener(snapshot);
        }
    }
}

impl<T> Clone for Store<T> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl<T: Default + Clone> Default for Store<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;
    use std::sync::atomic::AtomicUsize;

    #[derive(Clone, Debug, Default, PartialEq)]
    struct Counter {
        count: usize,
        label: String,
    }

    #[test]
    fn store_get_set() {
        let store = Store::new(Counter::default());
        assert_eq!(store.get_state().count, 0);

        store.set(Counter {
            count: 42,
            label: "answer".to_string(),
        });

        assert_eq!(store.get_state().count, 42);
        assert_eq!(store.read(|s| s.label.clone()), "answer");
    }

    #[test]
    fn update_returns_closure_result() {
        let store = Store::new(Counter::default());
        let previous = store.update(|s| {
            let old = s.count;
            s.count += 10;
            old
        });
        assert_eq!(previous, 0);
        assert_eq!(store.get_state().count, 10);
    }

    #[test]
    fn subscribers_see_post_mutation_snapshot() {
        let store = Store::new(Counter::default());
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        store.subscribe(move |s: &Counter| sink.lock().unwrap().push(s.count));

        store.update(|s| s.count += 1);
        store.update(|s| s.count += 1);

        assert_eq!(*seen.lock().unwrap(), vec![1, 2]);
    }

    #[test]
    fn update_if_skips_notification_when_unchanged() {
        let store = Store::new(Counter::default());
        let calls = Arc::new(AtomicUsize::new(0));
        let sink = Arc::clone(&calls);
        store.subscribe(move |_| {
            sink.fetch_add(1, Ordering::SeqCst);
        });

        assert!(!store.update_if(|_| false));
        assert!(store.update_if(|s| {
            s.count = 3;
            true
        }));

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(store.get_state().count, 3);
        // Unreported writes still land, silently
        assert!(!store.update_if(|s| {
            s.label = "quiet".to_string();
            false
        }));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(store.get_state().label, "quiet");
    }

    #[test]
    fn listener_can_read_store_during_notification() {
        let store = Store::new(Counter::default());
        let observed = Arc::new(AtomicUsize::new(0));
        let (reader, sink) = (store.clone(), Arc::clone(&observed));
        store.subscribe(move |_| {
            sink.store(reader.get_state().count, Ordering::SeqCst);
        });

        store.update(|s| s.count = 7);
        assert_eq!(observed.load(Ordering::SeqCst), 7);
    }

    #[test]
    fn unsubscribe_stops_notifications() {
        let store = Store::new(Counter::default());
        let calls = Arc::new(AtomicUsize::new(0));
        let sink = Arc::clone(&calls);
        let id = store.subscribe(move |_| {
            sink.fetch_add(1, Ordering::SeqCst);
        });
        assert_eq!(store.subscriber_count(), 1);

        store.update(|s| s.count += 1);
        assert!(store.unsubscribe(id));
        assert!(!store.unsubscribe(id));
        store.update(|s| s.count += 1);

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(store.subscriber_count(), 0);
    }
}

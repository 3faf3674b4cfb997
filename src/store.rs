//! Observable state container shared by the catalog, theme, and execution
//! components.
//!
//! A component owns exactly one [`Store`] and is the only code that mutates it.
//! The presentation layer reads snapshots with [`Store::get_state`] and
//! registers listeners with [`Store::subscribe`]; every mutation notifies all
//! listeners with the new snapshot.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;

type Listener<T> = Arc<dyn Fn(&T) + Send + Sync>;

/// Handle returned by [`Store::subscribe`], used to unsubscribe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

pub struct Store<T> {
    state: Mutex<T>,
    listeners: Mutex<Vec<(SubscriptionId, Listener<T>)>>,
    next_id: AtomicU64,
}

impl<T: Clone> Store<T> {
    pub fn new(initial: T) -> Self {
        Self {
            state: Mutex::new(initial),
            listeners: Mutex::new(Vec::new()),
            next_id: AtomicU64::new(1),
        }
    }

    /// Snapshot of the current state.
    pub fn get_state(&self) -> T {
        self.state.lock().clone()
    }

    /// Read-only access without cloning. Locks the state for the duration of `f`.
    pub fn with_state<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&T) -> R,
    {
        let guard = self.state.lock();
        f(&guard)
    }

    pub fn subscribe<F>(&self, listener: F) -> SubscriptionId
    where
        F: Fn(&T) + Send + Sync + 'static,
    {
        let id = SubscriptionId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.listeners.lock().push((id, Arc::new(listener)));
        id
    }

    /// Returns `false` if the subscription was already gone.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut listeners = self.listeners.lock();
        let before = listeners.len();
        listeners.retain(|(existing, _)| *existing != id);
        listeners.len() != before
    }

    /// Mutate the state, then notify listeners with the resulting snapshot.
    ///
    /// Listeners run after both locks are released, so they may read the store.
    pub fn update<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&mut T) -> R,
    {
        let (result, snapshot) = {
            let mut guard = self.state.lock();
            let result = f(&mut guard);
            (result, guard.clone())
        };
        self.notify(&snapshot);
        result
    }

    pub fn replace(&self, next: T) {
        self.update(|state| *state = next);
    }

    fn notify(&self, snapshot: &T) {
        let listeners: Vec<Listener<T>> = self
            .listeners
            .lock()
            .iter()
            .map(|(_, l)| Arc::clone(l))
            .collect();
        for listener in listeners {
            listener(snapshot);
        }
    }
}

impl<T: Clone + Default> Default for Store<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::indexing_slicing)]
mod tests {
    use super::*;

    #[test]
    fn update_notifies_with_new_snapshot() {
        let store = Store::new(0_u32);
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        store.subscribe(move |v: &u32| sink.lock().push(*v));

        store.update(|v| *v += 2);
        store.replace(7);

        assert_eq!(store.get_state(), 7);
        assert_eq!(*seen.lock(), vec![2, 7]);
    }

    #[test]
    fn unsubscribed_listeners_are_not_called() {
        let store = Store::new(String::new());
        let calls = Arc::new(AtomicU64::new(0));
        let counter = Arc::clone(&calls);
        let id = store.subscribe(move |_: &String| {
            counter.fetch_add(1, Ordering::Relaxed);
        });

        store.replace("a".into());
        assert!(store.unsubscribe(id));
        assert!(!store.unsubscribe(id));
        store.replace("b".into());

        assert_eq!(calls.load(Ordering::Relaxed), 1);
    }

    #[test]
    fn listeners_may_read_the_store() {
        let store = Arc::new(Store::new(1_i32));
        let reader = Arc::clone(&store);
        let observed = Arc::new(Mutex::new(None));
        let out = Arc::clone(&observed);
        store.subscribe(move |_: &i32| *out.lock() = Some(reader.get_state()));

        store.update(|v| *v = 5);
        assert_eq!(*observed.lock(), Some(5));
    }
}

//! Observable value holder
//!
//! A value plus a list of listeners. `set` stores the new value and then calls
//! every listener synchronously with it. The core never depends on anyone
//! listening.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, RwLock};

type Listener<T> = Arc<dyn Fn(&T) + Send + Sync>;

/// Handle returned by [`Observable::subscribe`], used to unsubscribe
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

/// Shared, observable value
///
/// Clones share the same value and listeners.
pub struct Observable<T> {
    inner: Arc<Inner<T>>,
}

struct Inner<T> {
    value: RwLock<T>,
    listeners: Mutex<Vec<(SubscriptionId, Listener<T>)>>,
    next_id: AtomicU64,
}

impl<T> Clone for Observable<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T: Default> Default for Observable<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}

impl<T> Observable<T> {
    pub fn new(value: T) -> Self {
        Self {
            inner: Arc::new(Inner {
                value: RwLock::new(value),
                listeners: Mutex::new(Vec::new()),
                next_id: AtomicU64::new(0),
            }),
        }
    }

    /// Read the current value without cloning it
    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        let value = self.inner.value.read().unwrap_or_else(|e| e.into_inner());
        f(&value)
    }

    /// Register a listener called after every change
    pub fn subscribe(&self, listener: impl Fn(&T) + Send + Sync + 'static) -> SubscriptionId {
        let id = SubscriptionId(self.inner.next_id.fetch_add(1, Ordering::Relaxed));
        self.listeners().push((id, Arc::new(listener)));
        id
    }

    /// Remove a listener; returns whether it was registered
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut listeners = self.listeners();
        let before = listeners.len();
        listeners.retain(|(existing, _)| *existing != id);
        listeners.len() != before
    }

    pub fn listener_count(&self) -> usize {
        self.listeners().len()
    }

    fn listeners(&self) -> std::sync::MutexGuard<'_, Vec<(SubscriptionId, Listener<T>)>> {
        self.inner.listeners.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn notify(&self, value: &T) {
        // Listeners run without any lock held so they may read, set or subscribe
        let listeners: Vec<Listener<T>> = self.listeners().iter().map(|(_, l)| l.clone()).collect();
        for listener in listeners {
            listener(value);
        }
    }
}

impl<T: Clone> Observable<T> {
    pub fn get(&self) -> T {
        self.with(T::clone)
    }

    /// Replace the value and notify every listener
    pub fn set(&self, value: T) {
        {
            let mut current = self.inner.value.write().unwrap_or_else(|e| e.into_inner());
            *current = value.clone();
        }
        self.notify(&value);
    }
}

impl<T: Clone + PartialEq> Observable<T> {
    /// Like [`set`](Self::set), but stays silent when the value is unchanged
    ///
    /// Returns whether the value changed.
    pub fn set_if_changed(&self, value: T) -> bool {
        {
            let mut current = self.inner.value.write().unwrap_or_else(|e| e.into_inner());
            if *current == value {
                return false;
            }
            *current = value.clone();
        }
        self.notify(&value);
        true
    }

    /// Modify the value in place under the write lock
    ///
    /// Listeners are notified only when the result differs from what was
    /// there before. Returns whether it changed.
    pub fn update(&self, f: impl FnOnce(&mut T)) -> bool {
        let value = {
            let mut current = self.inner.value.write().unwrap_or_else(|e| e.into_inner());
            let before = current.clone();
            f(&mut *current);
            if *current == before {
                return false;
            }
            current.clone()
        };
        self.notify(&value);
        true
    }
}

impl<T: std::fmt::Debug> std::fmt::Debug for Observable<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.with(|value| f.debug_tuple("Observable").field(value).finish())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_and_set() {
        let observable = Observable::new(1);
        assert_eq!(observable.get(), 1);
        observable.set(2);
        assert_eq!(observable.get(), 2);
    }

    #[test]
    fn test_listeners_see_new_value() {
        let observable = Observable::new(String::new());
        let seen = Arc::new(Mutex::new(Vec::new()));

        let sink = seen.clone();
        observable.subscribe(move |v: &String| sink.lock().unwrap().push(v.clone()));

        observable.set("ready".to_string());
        observable.set("completed".to_string());
        assert_eq!(*seen.lock().unwrap(), vec!["ready", "completed"]);
    }

    #[test]
    fn test_unsubscribe_stops_notifications() {
        let observable = Observable::new(0u32);
        let calls = Arc::new(AtomicU64::new(0));

        let counter = calls.clone();
        let id = observable.subscribe(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        observable.set(1);
        assert!(observable.unsubscribe(id));
        assert!(!observable.unsubscribe(id));
        observable.set(2);

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(observable.listener_count(), 0);
    }

    #[test]
    fn test_set_if_changed_skips_equal_values() {
        let observable = Observable::new(5u32);
        let calls = Arc::new(AtomicU64::new(0));

        let counter = calls.clone();
        observable.subscribe(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        assert!(!observable.set_if_changed(5));
        assert!(observable.set_if_changed(6));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_update_notifies_only_on_change() {
        let observable = Observable::new(vec![1u32]);
        let seen = Arc::new(Mutex::new(Vec::new()));

        let sink = seen.clone();
        observable.subscribe(move |value: &Vec<u32>| {
            sink.lock().unwrap().push(value.len());
        });

        assert!(observable.update(|v| v.push(2)));
        assert!(!observable.update(|v| v.retain(|_| true)));
        assert_eq!(observable.get(), vec![1, 2]);
        assert_eq!(*seen.lock().unwrap(), vec![2]);
    }

    #[test]
    fn test_clones_share_state() {
        let a = Observable::new(vec![1]);
        let b = a.clone();
        b.set(vec![1, 2]);
        assert_eq!(a.get(), vec![1, 2]);
    }

    #[test]
    fn test_listener_may_read_observable() {
        let observable = Observable::new(1);
        let seen = Arc::new(Mutex::new(None));

        let (reader, sink) = (observable.clone(), seen.clone());
        observable.subscribe(move |_| *sink.lock().unwrap() = Some(reader.get()));
        observable.set(3);

        assert_eq!(*seen.lock().unwrap(), Some(3));
    }
}

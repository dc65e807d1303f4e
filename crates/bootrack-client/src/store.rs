//! A snapshot container updated by pure functions.

use std::sync::{Mutex, MutexGuard, PoisonError};

/// Holds one value; readers get clones, writers replace it whole.
///
/// `mutate` computes the new value from the old one while holding the lock,
/// so concurrent writers apply one after the other and readers never see a
/// half-built value. The new value is stored only after the update function
/// returns, so a panicking update leaves the previous snapshot in place.
#[derive(Debug, Default)]
pub struct Store<T> {
    value: Mutex<T>,
}

impl<T: Clone> Store<T> {
    pub fn new(initial: T) -> Self {
        Self {
            value: Mutex::new(initial),
        }
    }

    fn lock(&self) -> MutexGuard<'_, T> {
        self.value.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Current snapshot.
    pub fn get(&self) -> T {
        self.lock().clone()
    }

    /// Replaces the value, returning the new snapshot.
    pub fn set(&self, value: T) -> T {
        self.mutate(|_| value)
    }

    /// Applies `update` to the current value and stores the result.
    pub fn mutate<F>(&self, update: F) -> T
    where
        F: FnOnce(&T) -> T,
    {
        let mut guard = self.lock();
        let next = update(&guard);
        *guard = next.clone();
        next
    }

    /// Reads through a borrow without cloning the whole value.
    pub fn with<R>(&self, read: impl FnOnce(&T) -> R) -> R {
        read(&self.lock())
    }
}

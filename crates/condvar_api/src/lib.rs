//! A simple condition variable API, paired with a [`mutex_api::Mutex`].
#![cfg_attr(any(not(feature = "std"), target_os = "none"), no_std)]

use mutex_api::Mutex;

/// A condition variable that puts a caller to sleep on a mutex guard and
/// wakes it back up once some other thread observes the awaited condition.
///
/// Mirrors the kernel `sleep`/`wakeup` channel primitive: a caller holding
/// `M`'s guard atomically releases it while it sleeps, and reacquires it
/// before `wait` returns.
pub trait CondVar<M: Mutex> {
    /// Creates a new, empty condition variable.
    fn new() -> Self;

    /// Atomically releases `guard` and blocks the current thread until
    /// [`Self::notify_all`] is called, then reacquires the mutex and
    /// returns the new guard.
    ///
    /// As with most condition variables, spurious wakeups are possible;
    /// callers must re-check their condition in a loop.
    fn wait<'a>(&self, guard: M::Guard<'a>) -> M::Guard<'a>;

    /// Wakes every thread currently blocked in [`Self::wait`] on this
    /// condition variable.
    fn notify_all(&self);
}

#[cfg(all(feature = "std", not(target_os = "none")))]
impl<T> CondVar<std::sync::Mutex<T>> for std::sync::Condvar {
    fn new() -> Self {
        Self::new()
    }

    fn wait<'a>(
        &self,
        guard: std::sync::MutexGuard<'a, T>,
    ) -> std::sync::MutexGuard<'a, T> {
        self.wait(guard).unwrap()
    }

    fn notify_all(&self) {
        Self::notify_all(self);
    }
}

#[cfg(loom)]
impl<T> CondVar<loom::sync::Mutex<T>> for loom::sync::Condvar {
    fn new() -> Self {
        Self::new()
    }

    fn wait<'a>(
        &self,
        guard: loom::sync::MutexGuard<'a, T>,
    ) -> loom::sync::MutexGuard<'a, T> {
        self.wait(guard).unwrap()
    }

    fn notify_all(&self) {
        Self::notify_all(self);
    }
}

//! Synchronization primitives wrapping `std::sync` without poisoning.
//!
//! The engine holds its lock on every completion path; a panicking worker
//! must not poison the registry for everyone else, so poisoned locks are
//! unwrapped into their inner state.

use std::sync as std_sync;

/// A mutual exclusion primitive that wraps `std::sync::Mutex`.
///
/// Unlike `std::sync::Mutex`, this does not support poisoning.
pub struct Mutex<T: ?Sized> {
  inner: std_sync::Mutex<T>,
}

impl<T> Mutex<T> {
  /// Creates a new mutex in an unlocked state ready for use.
  #[inline]
  pub const fn new(value: T) -> Self {
    Self { inner: std_sync::Mutex::new(value) }
  }
}

impl<T: ?Sized> Mutex<T> {
  /// Acquires the mutex, blocking the current thread until it is able to do so.
  ///
  /// This function does not propagate poisoning, so it will always succeed.
  #[inline]
  pub fn lock(&self) -> MutexGuard<'_, T> {
    MutexGuard { inner: self.inner.lock().unwrap_or_else(|e| e.into_inner()) }
  }
}

/// An RAII implementation of a "scoped lock" of a mutex.
///
/// When this structure is dropped (falls out of scope), the lock will be unlocked.
pub struct MutexGuard<'a, T: ?Sized> {
  inner: std_sync::MutexGuard<'a, T>,
}

impl<T: ?Sized> std::ops::Deref for MutexGuard<'_, T> {
  type Target = T;

  #[inline]
  fn deref(&self) -> &T {
    &self.inner
  }
}

impl<T: ?Sized> std::ops::DerefMut for MutexGuard<'_, T> {
  #[inline]
  fn deref_mut(&mut self) -> &mut T {
    &mut self.inner
  }
}

/// A condition variable paired with [`Mutex`].
///
/// Waiting consumes and returns the guard, so the lock is atomically released
/// for the duration of the wait, as with `std::sync::Condvar`.
pub struct Condvar {
  inner: std_sync::Condvar,
}

impl Condvar {
  #[inline]
  pub const fn new() -> Self {
    Self { inner: std_sync::Condvar::new() }
  }

  /// Wakes up all threads blocked on this condition variable.
  #[inline]
  pub fn notify_all(&self) {
    self.inner.notify_all();
  }

  /// Blocks the current thread until this condition variable is notified.
  ///
  /// Spurious wakeups are possible; callers re-check their condition in a loop.
  #[inline]
  pub fn wait<'a, T>(&self, guard: MutexGuard<'a, T>) -> MutexGuard<'a, T> {
    MutexGuard {
      inner: self
        .inner
        .wait(guard.inner)
        .unwrap_or_else(|e| e.into_inner()),
    }
  }
}

#[cfg(feature = "loom")]
mod imp {
    pub(crate) use loom::{
        sync::{
            Condvar, Mutex, MutexGuard,
            atomic::{AtomicU8, Ordering},
        },
        thread,
    };
}

#[cfg(not(feature = "loom"))]
mod imp {
    pub(crate) use std::{
        sync::{
            Condvar, Mutex, MutexGuard,
            atomic::{AtomicU8, Ordering},
        },
        thread,
    };
}

pub(crate) use imp::*;
use std::sync::PoisonError;

/// Locks `mutex`, ignoring poisoning.
///
/// Task bodies never run while an engine lock is held, so a poisoned lock can
/// only mean a panic inside the engine's own bookkeeping, which leaves the
/// protected value consistent.
#[inline]
pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Blocks on `condvar`, ignoring poisoning (see [`lock`]).
#[inline]
pub(crate) fn wait<'a, T>(condvar: &Condvar, guard: MutexGuard<'a, T>) -> MutexGuard<'a, T> {
    condvar.wait(guard).unwrap_or_else(PoisonError::into_inner)
}

//! Step-scoped lock around shared controller state.

use std::cell::RefCell;

use parking_lot::{ReentrantMutex, ReentrantMutexGuard};

/// Reentrant lock owning the protected state.
///
/// The lock may be taken again by the thread that holds it, so an accessor
/// can call another accessor (disable calls enable, image retrieval runs a
/// step exchange). The state itself is only reachable through [`read`] and
/// [`write`] closures, which must not call back into the guard.
///
/// [`read`]: StepLock::read
/// [`write`]: StepLock::write
pub struct StepGuard<T> {
    inner: ReentrantMutex<RefCell<T>>,
}

/// Held step lock. Released on drop.
pub struct StepLock<'a, T> {
    guard: ReentrantMutexGuard<'a, RefCell<T>>,
}

impl<T> StepGuard<T> {
    pub fn new(value: T) -> Self {
        Self {
            inner: ReentrantMutex::new(RefCell::new(value)),
        }
    }

    /// Acquire the lock for a multi-part critical section.
    pub fn lock(&self) -> StepLock<'_, T> {
        StepLock {
            guard: self.inner.lock(),
        }
    }

    /// Run `f` with shared access under the lock.
    pub fn read<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        self.lock().read(f)
    }

    /// Run `f` with exclusive access under the lock.
    pub fn write<R>(&self, f: impl FnOnce(&mut T) -> R) -> R {
        self.lock().write(f)
    }

    pub fn into_inner(self) -> T {
        self.inner.into_inner().into_inner()
    }
}

impl<T> StepLock<'_, T> {
    pub fn read<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        let state = self.guard.borrow();
        f(&state)
    }

    pub fn write<R>(&self, f: impl FnOnce(&mut T) -> R) -> R {
        let mut state = self.guard.borrow_mut();
        f(&mut state)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::thread;

    use super::*;

    #[test]
    fn relocking_on_same_thread_does_not_block() {
        let guard = StepGuard::new(0u32);
        let outer = guard.lock();
        outer.write(|v| *v += 1);
        guard.write(|v| *v += 1);
        assert_eq!(outer.read(|v| *v), 2);
    }

    #[test]
    fn lock_released_after_early_return() {
        let guard = StepGuard::new(5i32);
        let attempt = |value: i32| -> Result<(), ()> {
            let lock = guard.lock();
            if value < 0 {
                return Err(());
            }
            lock.write(|v| *v = value);
            Ok(())
        };
        assert!(attempt(-1).is_err());

        let guard = Arc::new(guard);
        let other = Arc::clone(&guard);
        let seen = thread::spawn(move || other.read(|v| *v)).join().unwrap();
        assert_eq!(seen, 5);
    }

    #[test]
    fn critical_sections_are_serialized() {
        let guard = Arc::new(StepGuard::new(Vec::<u32>::new()));
        let workers: Vec<_> = (0..4)
            .map(|worker| {
                let guard = Arc::clone(&guard);
                thread::spawn(move || {
                    for i in 0..100 {
                        let lock = guard.lock();
                        let len = lock.read(|v| v.len());
                        lock.write(|v| v.push(worker * 1000 + i));
                        assert_eq!(lock.read(|v| v.len()), len + 1);
                    }
                })
            })
            .collect();
        for worker in workers {
            worker.join().unwrap();
        }
        assert_eq!(guard.read(|v| v.len()), 400);
    }
}

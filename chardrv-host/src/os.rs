use std::sync::{Condvar, Mutex, MutexGuard, PoisonError};
use std::time::Instant;

use chardrv_core::{EventBits, Timeout};
use chardrv_os::{Os, RawEventGroup, RawLock, RawSemaphore, WaitOptions};
use embassy_time::Duration;

use crate::task::blocking;

/// Primitive layer on top of std threads
///
/// Objects are built from `Mutex` + `Condvar` pairs. A panicking thread never poisons them,
/// so a failed test thread does not cascade into unrelated waiters.
pub struct HostOs;

impl Os for HostOs {
    type Lock = HostLock;
    type Semaphore = HostSemaphore;
    type EventGroup = HostEventGroup;

    fn create_lock() -> Self::Lock {
        HostLock::default()
    }

    fn create_semaphore(max_count: usize, initial_count: usize) -> Self::Semaphore {
        HostSemaphore::new(max_count, initial_count)
    }

    fn create_event_group() -> Self::EventGroup {
        HostEventGroup::default()
    }

    fn delay(duration: Duration) {
        blocking(|| std::thread::sleep(to_std(duration)));
    }
}

pub(crate) fn to_std(duration: Duration) -> std::time::Duration {
    std::time::Duration::from_micros(duration.as_micros())
}

pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Waits on `cond` until `ready` holds or `timeout` expires.
///
/// Returns the guard and the final value of `ready`.
fn wait_for<'a, T>(
    cond: &Condvar,
    guard: MutexGuard<'a, T>,
    timeout: Timeout,
    mut ready: impl FnMut(&T) -> bool,
) -> (MutexGuard<'a, T>, bool) {
    if ready(&guard) {
        return (guard, true);
    }
    blocking(|| {
        let guard = match timeout.duration() {
            None => cond
                .wait_while(guard, |value| !ready(&*value))
                .unwrap_or_else(PoisonError::into_inner),
            Some(duration) => {
                let deadline = Instant::now() + to_std(duration);
                let mut guard = guard;
                loop {
                    let now = Instant::now();
                    if ready(&guard) || now >= deadline {
                        break guard;
                    }
                    guard = cond
                        .wait_timeout(guard, deadline - now)
                        .unwrap_or_else(PoisonError::into_inner)
                        .0;
                }
            }
        };
        let done = ready(&guard);
        (guard, done)
    })
}

#[derive(Default)]
pub struct HostLock {
    locked: Mutex<bool>,
    released: Condvar,
}

impl RawLock for HostLock {
    fn acquire(&self) {
        let guard = lock(&self.locked);
        let (mut locked, _) = wait_for(&self.released, guard, Timeout::Forever, |l| !*l);
        *locked = true;
    }

    unsafe fn release(&self) {
        let mut locked = lock(&self.locked);
        debug_assert!(*locked, "Release of a free lock");
        *locked = false;
        self.released.notify_one();
    }
}

pub struct HostSemaphore {
    count: Mutex<usize>,
    max_count: usize,
    given: Condvar,
}

impl HostSemaphore {
    pub fn new(max_count: usize, initial_count: usize) -> Self {
        assert!(initial_count <= max_count);
        Self {
            count: Mutex::new(initial_count),
            max_count,
            given: Condvar::new(),
        }
    }
}

impl RawSemaphore for HostSemaphore {
    fn take(&self, timeout: Timeout) -> bool {
        let (mut count, ready) = wait_for(&self.given, lock(&self.count), timeout, |c| *c > 0);
        if ready {
            *count -= 1;
        }
        ready
    }

    fn give_from_isr(&self) -> bool {
        let mut count = lock(&self.count);
        if *count >= self.max_count {
            return false;
        }
        *count += 1;
        self.given.notify_one();
        true
    }

    fn count(&self) -> usize {
        *lock(&self.count)
    }
}

#[derive(Default)]
pub struct HostEventGroup {
    bits: Mutex<u32>,
    changed: Condvar,
}

impl RawEventGroup for HostEventGroup {
    fn set(&self, bits: EventBits) {
        *lock(&self.bits) |= bits.into_bits();
        self.changed.notify_all();
    }

    fn set_from_isr(&self, bits: EventBits) {
        self.set(bits);
    }

    fn clear(&self, bits: EventBits) {
        *lock(&self.bits) &= !bits.into_bits();
    }

    fn get(&self) -> EventBits {
        EventBits::from_bits_truncating(*lock(&self.bits))
    }

    fn wait(&self, bits: EventBits, options: WaitOptions, timeout: Timeout) -> Option<EventBits> {
        let mask = bits.into_bits();
        let satisfied = |value: &u32| {
            if options.wait_for_all {
                value & mask == mask
            } else {
                value & mask != 0
            }
        };

        let (mut value, ready) = wait_for(&self.changed, lock(&self.bits), timeout, satisfied);
        if !ready {
            return None;
        }
        let observed = EventBits::from_bits_truncating(*value);
        if options.clear_on_exit {
            *value &= !mask;
        }
        Some(observed)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::thread;

    use super::*;

    #[test]
    fn semaphore_saturates() {
        let semaphore = HostOs::create_semaphore(2, 0);
        assert!(semaphore.give_from_isr());
        assert!(semaphore.give_from_isr());
        assert!(!semaphore.give_from_isr());
        assert_eq!(semaphore.count(), 2);
    }

    #[test]
    fn semaphore_timeout_consumes_nothing() {
        let semaphore = HostOs::create_semaphore(1, 0);
        assert!(!semaphore.take(Timeout::ZERO));
        assert!(!semaphore.take(Timeout::from_millis(5)));
        assert_eq!(semaphore.count(), 0);

        assert!(semaphore.give_from_isr());
        assert!(semaphore.take(Timeout::ZERO));
        assert_eq!(semaphore.count(), 0);
    }

    #[test]
    fn semaphore_wakes_waiter() {
        let semaphore = Arc::new(HostOs::create_semaphore(4, 0));
        let waiter = {
            let semaphore = semaphore.clone();
            thread::spawn(move || semaphore.take(Timeout::Forever))
        };
        thread::sleep(std::time::Duration::from_millis(10));
        assert!(semaphore.give_from_isr());
        assert!(waiter.join().unwrap());
    }

    #[test]
    fn event_group_any_and_all() {
        let group = HostOs::create_event_group();
        let a = EventBits::new(0).unwrap();
        let b = EventBits::new(3).unwrap();
        let any = WaitOptions {
            clear_on_exit: false,
            wait_for_all: false,
        };
        let all = WaitOptions {
            clear_on_exit: true,
            wait_for_all: true,
        };

        group.set_from_isr(a);
        assert_eq!(group.wait(a | b, any, Timeout::ZERO), Some(a));
        assert_eq!(group.wait(a | b, all, Timeout::ZERO), None);

        group.set(b);
        assert_eq!(group.wait(a | b, all, Timeout::ZERO), Some(a | b));
        assert!(group.get().is_empty());
    }

    #[test]
    fn lock_serializes_threads() {
        let lock = Arc::new(HostOs::create_lock());
        let counter = Arc::new(Mutex::new(Vec::new()));

        let workers: Vec<_> = (0..4)
            .map(|id| {
                let lock = lock.clone();
                let counter = counter.clone();
                thread::spawn(move || {
                    lock.acquire();
                    counter.lock().unwrap().push(id);
                    thread::sleep(std::time::Duration::from_millis(2));
                    counter.lock().unwrap().push(id);
                    unsafe { lock.release() };
                })
            })
            .collect();
        for worker in workers {
            worker.join().unwrap();
        }

        let order = counter.lock().unwrap().clone();
        assert_eq!(order.len(), 8);
        for pair in order.chunks(2) {
            assert_eq!(pair[0], pair[1]);
        }
    }
}

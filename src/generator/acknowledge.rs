use super::{AcknowledgedCounter, Generator};

use parking_lot::Mutex;

use std::sync::atomic::{AtomicU64, Ordering};

/// An atomic counter whose `last()` watermark only advances through
/// [`AcknowledgedCounter::acknowledge`] calls.
///
/// Many threads allocate monotonic key numbers with `next()` and acknowledge
/// them once the corresponding insert completed. `last()` publishes the
/// largest value such that every value in `[start, last]` has been
/// acknowledged, so read-side choosers never select a key that is not yet
/// durably stored.
#[derive(Debug)]
pub struct AcknowledgedU64Counter {
    counter: AtomicU64,
    limit: AtomicU64,
    window: Mutex<Vec<bool>>,
}

impl AcknowledgedU64Counter {
    const WINDOW_SIZE: usize = 1 << 16;
    const WINDOW_MASK: u64 = (Self::WINDOW_SIZE - 1) as u64;

    /// Create a counter that starts at `start`; the watermark starts at `start - 1`.
    pub fn new(start: u64) -> Self {
        Self {
            counter: AtomicU64::new(start),
            limit: AtomicU64::new(start.wrapping_sub(1)),
            window: Mutex::new(vec![false; Self::WINDOW_SIZE]),
        }
    }
}

impl Generator for AcknowledgedU64Counter {
    type Output = u64;

    fn next(&self) -> Self::Output {
        self.counter.fetch_add(1, Ordering::SeqCst)
    }

    fn last(&self) -> Self::Output {
        self.limit.load(Ordering::SeqCst)
    }
}

impl AcknowledgedCounter for AcknowledgedU64Counter {
    /// # Panics
    ///
    /// Panics if `val` is more than the window size ahead of the watermark,
    /// i.e. its slot is still occupied by an unretired acknowledgement.
    fn acknowledge(&self, val: Self::Output) {
        let mut window = self.window.lock();

        let slot = (val & Self::WINDOW_MASK) as usize;
        if window[slot] {
            panic!(
                "acknowledged value {val} is more than {} ahead of the watermark",
                Self::WINDOW_SIZE
            );
        }
        window[slot] = true;

        let limit = self.limit.load(Ordering::SeqCst);
        let mut i = limit.wrapping_add(1);
        for _ in 0..Self::WINDOW_SIZE {
            let slot = (i & Self::WINDOW_MASK) as usize;
            if !window[slot] {
                break;
            }
            window[slot] = false;
            i = i.wrapping_add(1);
        }
        self.limit.store(i.wrapping_sub(1), Ordering::SeqCst);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::sync::Arc;

    #[test]
    fn watermark_waits_for_gaps() {
        let c = AcknowledgedU64Counter::new(10);
        assert_eq!(c.last(), 9);

        assert_eq!(c.next(), 10);
        assert_eq!(c.next(), 11);
        assert_eq!(c.next(), 12);

        c.acknowledge(11);
        assert_eq!(c.last(), 9, "gap at 10 must hold the watermark");
        c.acknowledge(12);
        assert_eq!(c.last(), 9);
        c.acknowledge(10);
        assert_eq!(c.last(), 12, "filling the gap releases everything behind it");
    }

    #[test]
    fn concurrent_acknowledge_reaches_total() {
        const THREADS: usize = 8;
        const PER_THREAD: usize = 5000;

        let c = Arc::new(AcknowledgedU64Counter::new(1));
        let handles: Vec<_> = (0..THREADS)
            .map(|_| {
                let c = c.clone();
                std::thread::spawn(move || {
                    for _ in 0..PER_THREAD {
                        let v = c.next();
                        c.acknowledge(v);
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }
        assert_eq!(c.last(), (THREADS * PER_THREAD) as u64);
    }

    #[test]
    fn watermark_is_monotonic_under_concurrency() {
        let c = Arc::new(AcknowledgedU64Counter::new(0));
        let done = Arc::new(std::sync::atomic::AtomicBool::new(false));

        let watcher = {
            let c = c.clone();
            let done = done.clone();
            std::thread::spawn(move || {
                let mut prev = c.last();
                while !done.load(Ordering::SeqCst) {
                    let cur = c.last();
                    assert!(cur >= prev || prev == u64::MAX, "watermark went backwards");
                    prev = cur;
                }
            })
        };

        let workers: Vec<_> = (0..4)
            .map(|_| {
                let c = c.clone();
                std::thread::spawn(move || {
                    for _ in 0..10_000 {
                        let v = c.next();
                        c.acknowledge(v);
                    }
                })
            })
            .collect();
        for w in workers {
            w.join().unwrap();
        }
        done.store(true, Ordering::SeqCst);
        watcher.join().unwrap();
        assert_eq!(c.last(), 40_000 - 1);
    }

    #[test]
    #[should_panic(expected = "ahead of the watermark")]
    fn overflowing_the_window_panics() {
        let c = AcknowledgedU64Counter::new(0);
        // Nothing below is ever acknowledged, so these two collide in slot 5.
        c.acknowledge(5);
        c.acknowledge(5 + (1 << 16));
    }
}

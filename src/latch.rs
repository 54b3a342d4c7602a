use std::time::{Duration, Instant};

use parking_lot::{Condvar, Mutex};

/// A one-shot countdown latch.
///
/// The driver sizes one latch per phase at the worker count; each worker
/// counts down exactly once when it finishes, and the status and rate-change
/// threads use the latch as their bounded sleep primitive.
#[derive(Debug)]
pub struct CountDownLatch {
    count: Mutex<usize>,
    cond: Condvar,
}

impl CountDownLatch {
    /// Create a latch that opens after `count` count-downs.
    pub fn new(count: usize) -> Self {
        Self {
            count: Mutex::new(count),
            cond: Condvar::new(),
        }
    }

    /// Decrement the count, waking all waiters when it reaches zero.
    ///
    /// # Panics
    ///
    /// Panics when called on a latch that already reached zero; a count-down
    /// below zero means a worker released its slot twice.
    pub fn count_down(&self) {
        let mut count = self.count.lock();
        assert!(*count > 0, "count_down on a latch already at zero");
        *count -= 1;
        if *count == 0 {
            self.cond.notify_all();
        }
    }

    /// Block until the count reaches zero.
    pub fn wait(&self) {
        let mut count = self.count.lock();
        while *count > 0 {
            self.cond.wait(&mut count);
        }
    }

    /// Block until the count reaches zero or `timeout` elapses. Returns
    /// whether zero was observed. Spurious wakeups re-enter the wait with
    /// the remaining time.
    pub fn wait_for(&self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        let mut count = self.count.lock();
        while *count > 0 {
            if self.cond.wait_until(&mut count, deadline).timed_out() {
                return *count == 0;
            }
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::sync::Arc;

    #[test]
    fn opens_after_exact_count() {
        let latch = CountDownLatch::new(2);
        assert!(!latch.wait_for(Duration::from_millis(10)));
        latch.count_down();
        assert!(!latch.wait_for(Duration::from_millis(10)));
        latch.count_down();
        assert!(latch.wait_for(Duration::from_millis(10)));
        latch.wait();
    }

    #[test]
    fn wakes_blocked_waiters() {
        let latch = Arc::new(CountDownLatch::new(1));
        let waiter = {
            let latch = latch.clone();
            std::thread::spawn(move || {
                assert!(latch.wait_for(Duration::from_secs(10)));
            })
        };
        std::thread::sleep(Duration::from_millis(50));
        latch.count_down();
        waiter.join().unwrap();
    }

    #[test]
    fn wait_for_times_out_while_count_is_positive() {
        let latch = CountDownLatch::new(1);
        let start = Instant::now();
        assert!(!latch.wait_for(Duration::from_millis(100)));
        assert!(start.elapsed() >= Duration::from_millis(100));
    }

    #[test]
    #[should_panic(expected = "already at zero")]
    fn extra_count_down_panics() {
        let latch = CountDownLatch::new(1);
        latch.count_down();
        latch.count_down();
    }
}

use std::time::{Duration, Instant};

use parking_lot::Mutex;

/// Token-bucket rate limiter for a single worker.
///
/// Tokens are tracked in fixed-point (×10⁴) so sub-token refills accumulate,
/// and refills happen lazily on [`RateLimiter::consume`]. The balance is
/// signed: consuming past zero sleeps off the debt outside the lock, which
/// lets a concurrent [`RateLimiter::set_rate`] adjust the limiter while its
/// owner is sleeping.
#[derive(Debug)]
pub struct RateLimiter {
    state: Mutex<State>,
}

#[derive(Debug)]
struct State {
    /// Tokens per second, fixed-point.
    rate: i64,
    /// Maximum token balance, fixed-point.
    burst: i64,
    /// Current balance, fixed-point, may go negative.
    tokens: i64,
    last: Instant,
}

impl State {
    /// Credit the elapsed time at the current rate, capped at the burst.
    fn refill(&mut self, now: Instant) {
        let elapsed_ns = (now - self.last).as_nanos() as i128;
        let refill = elapsed_ns * self.rate as i128 / 1_000_000_000;
        self.tokens = (self.tokens as i128 + refill).min(self.burst as i128) as i64;
        self.last = now;
    }
}

impl RateLimiter {
    const TOKEN_PRECISION: i64 = 10_000;

    /// Create a limiter allowing `rate` operations per second with bursts up
    /// to `burst` operations. A rate of zero or less disables limiting.
    pub fn new(rate: i64, burst: i64) -> Self {
        Self {
            state: Mutex::new(State {
                rate: rate * Self::TOKEN_PRECISION,
                burst: burst * Self::TOKEN_PRECISION,
                tokens: 0,
                last: Instant::now(),
            }),
        }
    }

    /// Take `n` tokens, sleeping as long as needed to honour the rate.
    pub fn consume(&self, n: i64) {
        let mut state = self.state.lock();

        if state.rate <= 0 {
            return;
        }

        state.refill(Instant::now());
        state.tokens -= n * Self::TOKEN_PRECISION;

        if state.tokens < 0 {
            let wait_ns = (-state.tokens as i128) * 1_000_000_000 / state.rate as i128;
            drop(state);
            std::thread::sleep(Duration::from_nanos(wait_ns as u64));
        }
    }

    /// Install a new rate, first crediting the elapsed time at the old rate
    /// so pending demand is not backdated.
    pub fn set_rate(&self, rate: i64) {
        let mut state = self.state.lock();
        state.refill(Instant::now());
        state.rate = rate * Self::TOKEN_PRECISION;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn converges_to_the_configured_rate() {
        // 1000 ops/s with a 50-op burst: 1500 ops must take about 1.45 s.
        let limiter = RateLimiter::new(1000, 50);
        let start = Instant::now();
        for _ in 0..1500 {
            limiter.consume(1);
        }
        let elapsed = start.elapsed();
        assert!(elapsed >= Duration::from_millis(1200), "too fast: {elapsed:?}");
        assert!(elapsed <= Duration::from_millis(2500), "too slow: {elapsed:?}");
    }

    #[test]
    fn zero_rate_is_unlimited() {
        let limiter = RateLimiter::new(0, 0);
        let start = Instant::now();
        for _ in 0..100_000 {
            limiter.consume(1);
        }
        assert!(start.elapsed() < Duration::from_secs(1));
    }

    #[test]
    fn rate_change_takes_effect() {
        let limiter = RateLimiter::new(100, 1);
        limiter.consume(1);
        limiter.set_rate(10_000);

        let start = Instant::now();
        for _ in 0..2000 {
            limiter.consume(1);
        }
        let elapsed = start.elapsed();
        // 2000 ops at 10k/s is ~0.2 s; at the old 100/s it would be ~20 s.
        assert!(elapsed < Duration::from_secs(2), "rate change ignored: {elapsed:?}");
    }
}

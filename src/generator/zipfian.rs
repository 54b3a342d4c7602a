use parking_lot::Mutex;
use rand::{thread_rng, Rng};

use std::sync::atomic::{AtomicU64, Ordering};

use super::Generator;

/// Precomputed distribution state that must be rebuilt when the item count grows.
#[derive(Debug)]
struct ZetaState {
    count_for_zeta: u64,
    zeta_n: f64,
    eta: f64,
}

/// Generates values following a zipfian (power-law) distribution over
/// `[min, max]` with skew `theta`.
///
/// Popular items cluster at the low end of the range; with the default
/// `theta` of 0.99 the single most popular item receives several percent of
/// all samples. The zeta constant is extended incrementally under a mutex
/// when the item count grows between calls; shrinking the item count is not
/// supported and panics.
#[derive(Debug)]
pub struct ZipfianGenerator {
    items: u64,
    base: u64,
    theta: f64,
    zeta_2: f64,
    alpha: f64,
    state: Mutex<ZetaState>,
    last: AtomicU64,
}

impl ZipfianGenerator {
    /// The default skew.
    pub const DEFAULT_THETA: f64 = 0.99;
    /// Largest supported item count.
    pub const MAX_NUM_ITEMS: u64 = 1 << 40;

    /// Zipfian over `[0, num_items - 1]` with the default skew.
    pub fn from_items(num_items: u64) -> Self {
        Self::new(0, num_items - 1)
    }

    /// Zipfian over `[min, max]` with the default skew.
    pub fn new(min: u64, max: u64) -> Self {
        Self::with_theta(min, max, Self::DEFAULT_THETA)
    }

    /// Zipfian over `[min, max]` with skew `theta`; computes zeta from scratch.
    pub fn with_theta(min: u64, max: u64, theta: f64) -> Self {
        let zeta_n = Self::zeta(max - min + 1, theta);
        Self::with_zeta(min, max, theta, zeta_n)
    }

    /// Zipfian over `[min, max]` reusing a precomputed `zeta_n` for the full range.
    pub fn with_zeta(min: u64, max: u64, theta: f64, zeta_n: f64) -> Self {
        let items = max - min + 1;
        assert!(
            (2..Self::MAX_NUM_ITEMS).contains(&items),
            "zipfian item count {items} out of range [2, 2^40)"
        );

        let zeta_2 = Self::zeta(2, theta);
        let alpha = 1.0 / (1.0 - theta);
        let eta = Self::eta(items, theta, zeta_2, zeta_n);

        let gen = Self {
            items,
            base: min,
            theta,
            zeta_2,
            alpha,
            state: Mutex::new(ZetaState {
                count_for_zeta: items,
                zeta_n,
                eta,
            }),
            last: AtomicU64::new(min),
        };
        gen.next();
        gen
    }

    /// Draw the next sample as if the distribution covered `num` items.
    ///
    /// Growing `num` between calls extends the zeta constant incrementally
    /// under a mutex. Shrinking it panics: recomputing zeta downwards is not
    /// supported.
    pub fn next_with(&self, num: u64) -> u64 {
        assert!(
            (2..Self::MAX_NUM_ITEMS).contains(&num),
            "zipfian item count {num} out of range [2, 2^40)"
        );

        let (zeta_n, eta) = {
            let mut state = self.state.lock();
            if num > state.count_for_zeta {
                state.zeta_n =
                    Self::zeta_incremental(state.count_for_zeta, num, self.theta, state.zeta_n);
                state.count_for_zeta = num;
                state.eta = Self::eta(self.items, self.theta, self.zeta_2, state.zeta_n);
            } else if num < state.count_for_zeta {
                panic!(
                    "zipfian item count decreased from {} to {num}; decreasing is not supported",
                    state.count_for_zeta
                );
            }
            (state.zeta_n, state.eta)
        };

        let u: f64 = thread_rng().gen();
        let uz = u * zeta_n;

        let val = if uz < 1.0 {
            self.base
        } else if uz < 1.0 + 0.5f64.powf(self.theta) {
            self.base + 1
        } else {
            self.base + (num as f64 * (eta * u - eta + 1.0).powf(self.alpha)) as u64
        };
        self.last.store(val, Ordering::Relaxed);
        val
    }

    fn eta(items: u64, theta: f64, zeta_2: f64, zeta_n: f64) -> f64 {
        (1.0 - (2.0 / items as f64).powf(1.0 - theta)) / (1.0 - zeta_2 / zeta_n)
    }

    /// Incrementally extend `zeta(last_num, theta)` to `zeta(cur_num, theta)`.
    fn zeta_incremental(last_num: u64, cur_num: u64, theta: f64, last_zeta: f64) -> f64 {
        let mut zeta = last_zeta;
        for i in last_num + 1..=cur_num {
            zeta += 1.0 / (i as f64).powf(theta);
        }
        zeta
    }

    fn zeta(num: u64, theta: f64) -> f64 {
        Self::zeta_incremental(0, num, theta, 0.0)
    }
}

impl Generator for ZipfianGenerator {
    type Output = u64;

    fn next(&self) -> Self::Output {
        self.next_with(self.items)
    }

    fn last(&self) -> Self::Output {
        self.last.load(Ordering::Relaxed)
    }
}

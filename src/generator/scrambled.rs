use super::{zipfian::ZipfianGenerator, Generator};
use crate::utils::fnvhash64;

/// A zipfian generator whose rank-to-key mapping is randomised through an
/// FNV hash, so the popular items are spread across the keyspace instead of
/// clustering at its low end.
///
/// The inner zipfian always covers the fixed `[0, 10^10]` range; for the
/// default skew its zeta constant is precomputed, making construction O(1).
#[derive(Debug)]
pub struct ScrambledZipfianGenerator {
    base: u64,
    num_items: u64,
    generator: ZipfianGenerator,
}

impl ScrambledZipfianGenerator {
    /// Zeta of the fixed inner range under the default skew.
    const ZETAN: f64 = 26.46902820178302;
    const ITEM_COUNT: u64 = 10_000_000_000;

    /// Scrambled zipfian over `[0, num_items - 1]` with the default skew.
    pub fn from_items(num_items: u64) -> Self {
        Self::new(0, num_items - 1)
    }

    /// Scrambled zipfian over `[min, max]` with the default skew and cached zeta.
    pub fn new(min: u64, max: u64) -> Self {
        Self {
            base: min,
            num_items: max - min + 1,
            generator: ZipfianGenerator::with_zeta(
                0,
                Self::ITEM_COUNT,
                ZipfianGenerator::DEFAULT_THETA,
                Self::ZETAN,
            ),
        }
    }

    /// Scrambled zipfian over `[min, max]` with skew `theta`.
    ///
    /// A non-default `theta` forces a fresh zeta computation over the full
    /// inner range, which is expensive; the default skew takes the cached
    /// constant instead.
    pub fn with_theta(min: u64, max: u64, theta: f64) -> Self {
        if (theta - ZipfianGenerator::DEFAULT_THETA).abs() < f64::EPSILON {
            return Self::new(min, max);
        }
        Self {
            base: min,
            num_items: max - min + 1,
            generator: ZipfianGenerator::with_theta(0, Self::ITEM_COUNT, theta),
        }
    }

    fn scramble(&self, val: u64) -> u64 {
        self.base + fnvhash64(val) % self.num_items
    }
}

impl Generator for ScrambledZipfianGenerator {
    type Output = u64;

    fn next(&self) -> Self::Output {
        self.scramble(self.generator.next())
    }

    fn last(&self) -> Self::Output {
        self.scramble(self.generator.last())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn samples_stay_in_range() {
        let g = ScrambledZipfianGenerator::new(100, 199);
        for _ in 0..10_000 {
            let v = g.next();
            assert!((100..=199).contains(&v));
            assert_eq!(g.last(), v);
        }
    }

    #[test]
    fn hot_keys_are_scattered() {
        const ITEMS: u64 = 10_000;
        const SAMPLES: usize = 200_000;

        let g = ScrambledZipfianGenerator::from_items(ITEMS);
        let mut counts = vec![0u64; ITEMS as usize];
        for _ in 0..SAMPLES {
            counts[g.next() as usize] += 1;
        }

        // Still zipfian: some key dominates. Scrambled: it is rarely key 0.
        let (hottest, &max) = counts
            .iter()
            .enumerate()
            .max_by_key(|(_, &c)| c)
            .unwrap();
        assert!(max as f64 / SAMPLES as f64 > 0.03, "no hot key emerged");
        // The hottest rank maps through FNV, not identity.
        assert_eq!(hottest as u64, fnvhash64(0) % ITEMS);
    }

    #[test]
    fn default_theta_takes_the_cached_zeta() {
        // Would take minutes if it recomputed zeta over 10^10 items.
        let start = std::time::Instant::now();
        let _ = ScrambledZipfianGenerator::with_theta(0, 999, ZipfianGenerator::DEFAULT_THETA);
        assert!(start.elapsed() < std::time::Duration::from_secs(1));
    }
}

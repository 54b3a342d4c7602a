use std::sync::{
    atomic::{AtomicU64, Ordering},
    Arc,
};

use super::{acknowledge::AcknowledgedU64Counter, zipfian::ZipfianGenerator, Generator};

/// Generates keys skewed towards the most recently inserted ones.
///
/// Each draw reads the acknowledged-insert watermark `L` once and returns
/// `L - zipfian_sample(L + 1)`, so freshly acknowledged keys are the most
/// popular and the distribution follows new inserts as they land.
#[derive(Debug)]
pub struct SkewedLatestGenerator {
    counter: Arc<AcknowledgedU64Counter>,
    zipfian: ZipfianGenerator,
    last: AtomicU64,
}

impl SkewedLatestGenerator {
    /// Create a generator over the key space published by `counter`.
    pub fn new(counter: Arc<AcknowledgedU64Counter>) -> Self {
        let items = counter.last() + 1;
        let gen = Self {
            counter,
            zipfian: ZipfianGenerator::from_items(items),
            last: AtomicU64::new(0),
        };
        gen.next();
        gen
    }
}

impl Generator for SkewedLatestGenerator {
    type Output = u64;

    fn next(&self) -> Self::Output {
        let max = self.counter.last();
        let val = max - self.zipfian.next_with(max + 1);
        self.last.store(val, Ordering::Relaxed);
        val
    }

    fn last(&self) -> Self::Output {
        self.last.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generator::AcknowledgedCounter;

    #[test]
    fn never_exceeds_the_watermark() {
        let counter = Arc::new(AcknowledgedU64Counter::new(100));
        let g = SkewedLatestGenerator::new(counter.clone());
        for _ in 0..10_000 {
            assert!(g.next() <= counter.last());
        }
    }

    #[test]
    fn favours_recent_keys() {
        const SAMPLES: usize = 100_000;

        let counter = Arc::new(AcknowledgedU64Counter::new(1000));
        let g = SkewedLatestGenerator::new(counter.clone());

        let mut newest_half = 0usize;
        for _ in 0..SAMPLES {
            if g.next() >= 500 {
                newest_half += 1;
            }
        }
        assert!(
            newest_half as f64 / SAMPLES as f64 > 0.8,
            "newest half only drew {}",
            newest_half as f64 / SAMPLES as f64
        );
    }

    #[test]
    fn follows_the_watermark_as_inserts_land() {
        let counter = Arc::new(AcknowledgedU64Counter::new(10));
        let g = SkewedLatestGenerator::new(counter.clone());

        for _ in 0..100 {
            let v = counter.next();
            counter.acknowledge(v);
        }
        assert_eq!(counter.last(), 109);
        for _ in 0..1000 {
            assert!(g.next() <= 109);
        }
    }
}

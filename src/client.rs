use anyhow::{Context, Result};

use crate::{
    db::{wrapper::DbWrapper, Db},
    latch::CountDownLatch,
    rate::RateLimiter,
    workload::Workload,
};

/// Counts a latch down when dropped, so a worker releases its slot on every
/// exit path, including an unwinding panic.
struct LatchGuard<'a>(&'a CountDownLatch);

impl Drop for LatchGuard<'_> {
    fn drop(&mut self) {
        self.0.count_down();
    }
}

/// Runs a store handle's cleanup when dropped. Cleanup failures cannot
/// propagate from a drop, so they are logged instead.
struct StoreGuard<'a> {
    db: &'a mut DbWrapper,
    cleanup: bool,
}

impl Drop for StoreGuard<'_> {
    fn drop(&mut self) {
        if self.cleanup {
            if let Err(e) = self.db.cleanup() {
                tracing::error!("store cleanup failed: {e:#}");
            }
        }
    }
}

/// The per-worker operation loop.
///
/// Initializes the handle if requested, performs `num_ops` load inserts or
/// transactions (consulting the rate limiter before each), cleans the handle
/// up if requested, and counts the latch down. Returns the number of
/// successful operations.
#[allow(clippy::too_many_arguments)]
pub fn client_thread(
    db: &mut DbWrapper,
    workload: &dyn Workload,
    num_ops: usize,
    is_loading: bool,
    init_db: bool,
    cleanup_db: bool,
    latch: &CountDownLatch,
    limiter: Option<&RateLimiter>,
) -> Result<usize> {
    let _slot = LatchGuard(latch);

    if init_db {
        db.init().context("store init failed")?;
    }
    let mut store = StoreGuard {
        db,
        cleanup: cleanup_db,
    };

    let mut oks = 0;
    for _ in 0..num_ops {
        if let Some(limiter) = limiter {
            limiter.consume(1);
        }
        let ok = if is_loading {
            workload.do_insert(&mut *store.db)
        } else {
            workload.do_transaction(&mut *store.db)
        };
        if ok {
            oks += 1;
        }
    }
    Ok(oks)
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::sync::Arc;
    use std::time::Duration;

    use crate::db::factory::{register_builtin, DbFactory};
    use crate::measurements::{BasicMeasurements, Operation};
    use crate::properties::Properties;
    use crate::workload::{CoreWorkload, CoreWorkloadConfig};

    fn workload(record_count: u64) -> CoreWorkload {
        let mut props = Properties::new();
        props.set("recordcount", record_count.to_string());
        CoreWorkload::new(CoreWorkloadConfig::from_properties(&props).unwrap()).unwrap()
    }

    #[test]
    fn loads_its_quota_and_releases_the_latch() {
        let mut factory = DbFactory::new();
        register_builtin(&mut factory);
        let measurements = Arc::new(BasicMeasurements::new(0));
        let mut db = DbWrapper::new(
            factory.create("memory", &Properties::new()).unwrap(),
            measurements.clone(),
        );

        let wl = workload(100);
        let latch = CountDownLatch::new(1);

        let oks = client_thread(&mut db, &wl, 100, true, true, true, &latch, None).unwrap();
        assert_eq!(oks, 100);
        assert!(latch.wait_for(Duration::ZERO));
        assert_eq!(measurements.count(Operation::Insert), 100);
    }

    #[test]
    fn latch_is_released_even_when_init_fails() {
        struct BrokenDb;
        impl crate::db::Db for BrokenDb {
            fn init(&mut self) -> Result<()> {
                anyhow::bail!("no disk")
            }
            fn read(
                &mut self,
                _: &str,
                _: &str,
                _: Option<&[String]>,
            ) -> crate::db::DbResult<Vec<crate::db::Field>> {
                unreachable!()
            }
            fn scan(
                &mut self,
                _: &str,
                _: &str,
                _: usize,
                _: Option<&[String]>,
            ) -> crate::db::DbResult<Vec<Vec<crate::db::Field>>> {
                unreachable!()
            }
            fn update(&mut self, _: &str, _: &str, _: Vec<crate::db::Field>) -> crate::db::DbResult<()> {
                unreachable!()
            }
            fn insert(&mut self, _: &str, _: &str, _: Vec<crate::db::Field>) -> crate::db::DbResult<()> {
                unreachable!()
            }
            fn delete(&mut self, _: &str, _: &str) -> crate::db::DbResult<()> {
                unreachable!()
            }
        }

        let measurements = Arc::new(BasicMeasurements::new(0));
        let mut db = DbWrapper::new(Box::new(BrokenDb), measurements);
        let wl = workload(10);
        let latch = CountDownLatch::new(1);

        assert!(client_thread(&mut db, &wl, 10, true, true, true, &latch, None).is_err());
        assert!(latch.wait_for(Duration::ZERO), "latch slot must be released");
    }
}

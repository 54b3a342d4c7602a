use std::sync::Arc;
use std::time::Instant;

use anyhow::Result;

use super::{Db, DbResult, Field};
use crate::measurements::{Measurements, Operation};

/// Decorates a store handle with latency timing.
///
/// Every operation is timed with a monotonic clock and the elapsed
/// nanoseconds are reported to the shared measurements under the operation's
/// kind, or under its `*-FAILED` kind when the call returned an error.
/// `init`/`cleanup` pass through untimed.
pub struct DbWrapper {
    inner: Box<dyn Db>,
    measurements: Arc<dyn Measurements>,
}

impl DbWrapper {
    /// Wrap `inner`, reporting latencies to `measurements`.
    pub fn new(inner: Box<dyn Db>, measurements: Arc<dyn Measurements>) -> Self {
        Self {
            inner,
            measurements,
        }
    }

    fn timed<T>(&mut self, op: Operation, f: impl FnOnce(&mut dyn Db) -> DbResult<T>) -> DbResult<T> {
        let start = Instant::now();
        let result = f(self.inner.as_mut());
        let elapsed_ns = start.elapsed().as_nanos() as u64;
        let kind = if result.is_ok() { op } else { op.failed() };
        self.measurements.report(kind, elapsed_ns);
        result
    }
}

impl Db for DbWrapper {
    fn init(&mut self) -> Result<()> {
        self.inner.init()
    }

    fn cleanup(&mut self) -> Result<()> {
        self.inner.cleanup()
    }

    fn read(&mut self, table: &str, key: &str, fields: Option<&[String]>) -> DbResult<Vec<Field>> {
        self.timed(Operation::Read, |db| db.read(table, key, fields))
    }

    fn scan(
        &mut self,
        table: &str,
        key: &str,
        len: usize,
        fields: Option<&[String]>,
    ) -> DbResult<Vec<Vec<Field>>> {
        self.timed(Operation::Scan, |db| db.scan(table, key, len, fields))
    }

    fn update(&mut self, table: &str, key: &str, values: Vec<Field>) -> DbResult<()> {
        self.timed(Operation::Update, |db| db.update(table, key, values))
    }

    fn insert(&mut self, table: &str, key: &str, values: Vec<Field>) -> DbResult<()> {
        self.timed(Operation::Insert, |db| db.insert(table, key, values))
    }

    fn delete(&mut self, table: &str, key: &str) -> DbResult<()> {
        self.timed(Operation::Delete, |db| db.delete(table, key))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::db::memory::MemoryDb;
    use crate::measurements::BasicMeasurements;

    #[test]
    fn success_and_failure_land_under_different_kinds() {
        let measurements = Arc::new(BasicMeasurements::new(0));
        let mut db = DbWrapper::new(Box::new(MemoryDb::new()), measurements.clone());

        db.insert(
            "t",
            "k",
            vec![Field {
                name: "f".to_string(),
                value: b"v".to_vec(),
            }],
        )
        .unwrap();
        db.read("t", "k", None).unwrap();
        assert!(db.read("t", "missing", None).is_err());

        assert_eq!(measurements.count(Operation::Insert), 1);
        assert_eq!(measurements.count(Operation::Read), 1);
        assert_eq!(measurements.count(Operation::ReadFailed), 1);
    }
}

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::{Duration, Instant};

use anyhow::{bail, Result};
use hdrhistogram::Histogram;
use parking_lot::Mutex;

use crate::properties::Properties;

/// Everything the driver measures, one kind per operation outcome.
///
/// The `*Failed` kinds exist for measurement only: the timing wrapper files
/// a non-OK store call under them so failures stay visible without
/// disturbing the success latencies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    /// Load-phase or transactional insert.
    Insert,
    /// Point read.
    Read,
    /// Field update.
    Update,
    /// Range scan.
    Scan,
    /// Read-modify-write pair.
    ReadModifyWrite,
    /// Record delete.
    Delete,
    /// Failed insert.
    InsertFailed,
    /// Failed read.
    ReadFailed,
    /// Failed update.
    UpdateFailed,
    /// Failed scan.
    ScanFailed,
    /// Failed read-modify-write.
    ReadModifyWriteFailed,
    /// Failed delete.
    DeleteFailed,
}

/// Number of [`Operation`] kinds.
pub const MAX_OP_TYPE: usize = 12;

/// All operation kinds in index order.
pub const OPERATIONS: [Operation; MAX_OP_TYPE] = [
    Operation::Insert,
    Operation::Read,
    Operation::Update,
    Operation::Scan,
    Operation::ReadModifyWrite,
    Operation::Delete,
    Operation::InsertFailed,
    Operation::ReadFailed,
    Operation::UpdateFailed,
    Operation::ScanFailed,
    Operation::ReadModifyWriteFailed,
    Operation::DeleteFailed,
];

impl Operation {
    /// Stable index into per-kind tables.
    pub fn index(self) -> usize {
        match self {
            Operation::Insert => 0,
            Operation::Read => 1,
            Operation::Update => 2,
            Operation::Scan => 3,
            Operation::ReadModifyWrite => 4,
            Operation::Delete => 5,
            Operation::InsertFailed => 6,
            Operation::ReadFailed => 7,
            Operation::UpdateFailed => 8,
            Operation::ScanFailed => 9,
            Operation::ReadModifyWriteFailed => 10,
            Operation::DeleteFailed => 11,
        }
    }

    /// The measurement-only failed counterpart of this kind.
    pub fn failed(self) -> Operation {
        match self {
            Operation::Insert => Operation::InsertFailed,
            Operation::Read => Operation::ReadFailed,
            Operation::Update => Operation::UpdateFailed,
            Operation::Scan => Operation::ScanFailed,
            Operation::ReadModifyWrite => Operation::ReadModifyWriteFailed,
            Operation::Delete => Operation::DeleteFailed,
            other => other,
        }
    }

    /// Display name.
    pub fn name(self) -> &'static str {
        match self {
            Operation::Insert => "INSERT",
            Operation::Read => "READ",
            Operation::Update => "UPDATE",
            Operation::Scan => "SCAN",
            Operation::ReadModifyWrite => "READMODIFYWRITE",
            Operation::Delete => "DELETE",
            Operation::InsertFailed => "INSERT-FAILED",
            Operation::ReadFailed => "READ-FAILED",
            Operation::UpdateFailed => "UPDATE-FAILED",
            Operation::ScanFailed => "SCAN-FAILED",
            Operation::ReadModifyWriteFailed => "READMODIFYWRITE-FAILED",
            Operation::DeleteFailed => "DELETE-FAILED",
        }
    }
}

/// Sink for per-operation latency samples, shared by all workers.
pub trait Measurements: Send + Sync {
    /// Record one operation of kind `op` that took `latency_ns` nanoseconds.
    fn report(&self, op: Operation, latency_ns: u64);

    /// Human-readable snapshot of everything recorded so far.
    fn status_msg(&self) -> String;

    /// Clear all recorded samples.
    fn reset(&self);

    /// Re-arm the warm-up clock at the start of a phase.
    fn start(&self);
}

/// Latches to true once the warm-up window has passed.
///
/// Until then every sample is dropped. The elapsed time must also stay under
/// `skip + 10s` for the latch to fire, so a thread that first reports long
/// after start (when elapsed is huge) cannot accidentally enable reporting
/// from its very first sample.
#[derive(Debug)]
struct WarmupGate {
    skip: Duration,
    start: Mutex<Instant>,
    on: AtomicBool,
}

impl WarmupGate {
    fn new(skip_secs: u64) -> Self {
        Self {
            skip: Duration::from_secs(skip_secs),
            start: Mutex::new(Instant::now()),
            on: AtomicBool::new(skip_secs == 0),
        }
    }

    fn rearm(&self) {
        *self.start.lock() = Instant::now();
        self.on.store(self.skip.is_zero(), Ordering::Relaxed);
    }

    /// Whether this sample should be recorded. The sample that flips the
    /// latch is itself dropped.
    fn ready(&self) -> bool {
        if self.on.load(Ordering::Relaxed) {
            return true;
        }
        let elapsed = self.start.lock().elapsed();
        if elapsed > self.skip && elapsed < self.skip + Duration::from_secs(10) {
            self.on.store(true, Ordering::Relaxed);
        }
        false
    }
}

/// Atomic count/sum/min/max per operation kind.
pub struct BasicMeasurements {
    count: [AtomicU64; MAX_OP_TYPE],
    latency_sum: [AtomicU64; MAX_OP_TYPE],
    latency_min: [AtomicU64; MAX_OP_TYPE],
    latency_max: [AtomicU64; MAX_OP_TYPE],
    warmup: WarmupGate,
}

impl BasicMeasurements {
    /// Create a sink that drops samples for the first `skip_secs` seconds.
    pub fn new(skip_secs: u64) -> Self {
        Self {
            count: std::array::from_fn(|_| AtomicU64::new(0)),
            latency_sum: std::array::from_fn(|_| AtomicU64::new(0)),
            latency_min: std::array::from_fn(|_| AtomicU64::new(u64::MAX)),
            latency_max: std::array::from_fn(|_| AtomicU64::new(0)),
            warmup: WarmupGate::new(skip_secs),
        }
    }

    /// Recorded operation count for `op`.
    pub fn count(&self, op: Operation) -> u64 {
        self.count[op.index()].load(Ordering::Relaxed)
    }
}

impl Measurements for BasicMeasurements {
    fn report(&self, op: Operation, latency_ns: u64) {
        if !self.warmup.ready() {
            return;
        }
        let i = op.index();
        self.count[i].fetch_add(1, Ordering::Relaxed);
        self.latency_sum[i].fetch_add(latency_ns, Ordering::Relaxed);

        let mut prev = self.latency_min[i].load(Ordering::Relaxed);
        while prev > latency_ns {
            match self.latency_min[i].compare_exchange_weak(
                prev,
                latency_ns,
                Ordering::Relaxed,
                Ordering::Relaxed,
            ) {
                Ok(_) => break,
                Err(cur) => prev = cur,
            }
        }

        let mut prev = self.latency_max[i].load(Ordering::Relaxed);
        while prev < latency_ns {
            match self.latency_max[i].compare_exchange_weak(
                prev,
                latency_ns,
                Ordering::Relaxed,
                Ordering::Relaxed,
            ) {
                Ok(_) => break,
                Err(cur) => prev = cur,
            }
        }
    }

    fn status_msg(&self) -> String {
        let mut msg = String::new();
        let mut total = 0u64;
        for op in OPERATIONS {
            let i = op.index();
            let count = self.count[i].load(Ordering::Relaxed);
            if count == 0 {
                continue;
            }
            total += count;
            let sum = self.latency_sum[i].load(Ordering::Relaxed);
            msg.push_str(&format!(
                "\n[{}: Count={} Max={:.2} Min={:.2} Avg={:.2}]",
                op.name(),
                count,
                self.latency_max[i].load(Ordering::Relaxed) as f64 / 1000.0,
                self.latency_min[i].load(Ordering::Relaxed) as f64 / 1000.0,
                sum as f64 / count as f64 / 1000.0,
            ));
        }
        format!("{total} operations;{msg}")
    }

    fn reset(&self) {
        for i in 0..MAX_OP_TYPE {
            self.count[i].store(0, Ordering::Relaxed);
            self.latency_sum[i].store(0, Ordering::Relaxed);
            self.latency_min[i].store(u64::MAX, Ordering::Relaxed);
            self.latency_max[i].store(0, Ordering::Relaxed);
        }
    }

    fn start(&self) {
        self.warmup.rearm();
    }
}

/// HDR-histogram measurements: everything the basic sink records plus tail
/// percentiles.
pub struct HdrMeasurements {
    histograms: [Mutex<Histogram<u64>>; MAX_OP_TYPE],
    warmup: WarmupGate,
}

impl HdrMeasurements {
    /// Latency range the histograms can track, in nanoseconds.
    const MAX_TRACKABLE_NS: u64 = 100_000_000_000;

    /// Create a sink that drops samples for the first `skip_secs` seconds.
    pub fn new(skip_secs: u64) -> Result<Self> {
        let mut histograms = Vec::with_capacity(MAX_OP_TYPE);
        for _ in 0..MAX_OP_TYPE {
            histograms.push(Mutex::new(Histogram::new_with_bounds(
                1,
                Self::MAX_TRACKABLE_NS,
                3,
            )?));
        }
        let histograms: [Mutex<Histogram<u64>>; MAX_OP_TYPE] = histograms
            .try_into()
            .unwrap_or_else(|_| unreachable!("histogram count matches MAX_OP_TYPE"));
        Ok(Self {
            histograms,
            warmup: WarmupGate::new(skip_secs),
        })
    }
}

impl Measurements for HdrMeasurements {
    fn report(&self, op: Operation, latency_ns: u64) {
        if !self.warmup.ready() {
            return;
        }
        self.histograms[op.index()]
            .lock()
            .saturating_record(latency_ns.max(1));
    }

    fn status_msg(&self) -> String {
        let mut msg = String::new();
        let mut total = 0u64;
        for op in OPERATIONS {
            let hist = self.histograms[op.index()].lock();
            let count = hist.len();
            if count == 0 {
                continue;
            }
            total += count;
            msg.push_str(&format!(
                "\n[{}: Count={} Max={:.2} Min={:.2} Avg={:.2} 90={:.2} 99={:.2} 99.9={:.2} 99.99={:.2}]",
                op.name(),
                count,
                hist.max() as f64 / 1000.0,
                hist.min() as f64 / 1000.0,
                hist.mean() / 1000.0,
                hist.value_at_percentile(90.0) as f64 / 1000.0,
                hist.value_at_percentile(99.0) as f64 / 1000.0,
                hist.value_at_percentile(99.9) as f64 / 1000.0,
                hist.value_at_percentile(99.99) as f64 / 1000.0,
            ));
        }
        format!("{total} operations;{msg}")
    }

    fn reset(&self) {
        for hist in &self.histograms {
            hist.lock().reset();
        }
    }

    fn start(&self) {
        self.warmup.rearm();
    }
}

/// Build the measurement sink selected by the `measurementtype` property
/// (`basic` or `hdrhistogram`), with `warmupseconds` of skipped samples.
pub fn create_measurements(props: &Properties) -> Result<std::sync::Arc<dyn Measurements>> {
    let skip_secs: u64 = props.parse_or("warmupseconds", 0)?;
    match props.get_or("measurementtype", "basic") {
        "basic" => Ok(std::sync::Arc::new(BasicMeasurements::new(skip_secs))),
        "hdrhistogram" => Ok(std::sync::Arc::new(HdrMeasurements::new(skip_secs)?)),
        other => bail!("unknown measurement type: {other}"),
    }
}

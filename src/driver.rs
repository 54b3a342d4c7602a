use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{bail, Context, Result};

use crate::{
    client::client_thread,
    db::wrapper::DbWrapper,
    latch::CountDownLatch,
    measurements::Measurements,
    rate::RateLimiter,
    workload::Workload,
};

/// Which phase of a benchmark run is executing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Loading the initial records.
    Load,
    /// Running the transaction mix.
    Transaction,
}

impl Phase {
    fn name(self) -> &'static str {
        match self {
            Phase::Load => "LOAD",
            Phase::Transaction => "RUN",
        }
    }

    fn is_loading(self) -> bool {
        matches!(self, Phase::Load)
    }
}

/// How one phase should be driven.
#[derive(Debug)]
pub struct PhaseOptions {
    /// Load or transaction phase.
    pub phase: Phase,
    /// Total operations, partitioned across workers.
    pub total_ops: usize,
    /// Whether workers initialize their store handle before the loop.
    pub init_db: bool,
    /// Whether workers clean their store handle up after the loop.
    pub cleanup_db: bool,
    /// Whether the status thread runs.
    pub show_status: bool,
    /// How often the status thread prints.
    pub status_interval: Duration,
    /// Aggregate target rate in ops/sec, split across workers. Zero or less
    /// means unlimited.
    pub initial_rate: i64,
    /// Timed rate changes, `(seconds_from_start, aggregate_ops_per_sec)`.
    pub rate_schedule: Vec<(u64, i64)>,
}

/// What a completed phase reported.
#[derive(Debug)]
pub struct PhaseOutcome {
    /// Wall-clock runtime of the worker pool.
    pub runtime: Duration,
    /// Successful operations summed over all workers.
    pub ops: usize,
}

/// Parse a rate-schedule file: whitespace-separated
/// `timestamp_seconds ops_per_second` pairs, one per line, with strictly
/// increasing timestamps. Blank lines are ignored.
pub fn parse_rate_file(path: impl AsRef<Path>) -> Result<Vec<(u64, i64)>> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("cannot read rate file {}", path.display()))?;

    let mut schedule = Vec::new();
    let mut prev: Option<u64> = None;
    for (lineno, line) in content.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        let mut tokens = line.split_whitespace();
        let (Some(ts), Some(rate), None) = (tokens.next(), tokens.next(), tokens.next()) else {
            bail!("rate file line {} is not a 'timestamp rate' pair: {line:?}", lineno + 1);
        };
        let ts: u64 = ts
            .parse()
            .with_context(|| format!("bad timestamp on rate file line {}", lineno + 1))?;
        let rate: i64 = rate
            .parse()
            .with_context(|| format!("bad rate on rate file line {}", lineno + 1))?;
        if prev.is_some_and(|p| ts <= p) {
            bail!("rate file timestamps must be strictly increasing (line {})", lineno + 1);
        }
        prev = Some(ts);
        schedule.push((ts, rate));
    }
    Ok(schedule)
}

fn status_thread(measurements: &dyn Measurements, latch: &CountDownLatch, interval: Duration, start: Instant) {
    let mut done = false;
    loop {
        println!(
            "{:>4} sec: {}",
            start.elapsed().as_secs(),
            measurements.status_msg()
        );
        if done {
            break;
        }
        done = latch.wait_for(interval);
    }
}

fn rate_thread(schedule: &[(u64, i64)], limiters: &[Arc<RateLimiter>], latch: &CountDownLatch) {
    let mut prev = 0u64;
    for &(ts, rate) in schedule {
        if latch.wait_for(Duration::from_secs(ts - prev)) {
            return;
        }
        prev = ts;
        let per_worker = rate / limiters.len() as i64;
        tracing::info!("rate change at {ts}s: {rate} ops/sec, {per_worker} per worker");
        for limiter in limiters {
            limiter.set_rate(per_worker);
        }
    }
}

/// Run one phase: partition `total_ops` across one worker per store handle,
/// drive them to completion and report the aggregate outcome.
///
/// A status thread and a rate-change thread run alongside the workers when
/// configured; both use the phase latch as their sleep primitive and exit
/// once every worker has counted down. A worker that fails fatally (or
/// panics on a generator invariant violation) still releases its latch slot;
/// the error is surfaced after all workers have been joined.
pub fn run_phase(
    options: &PhaseOptions,
    dbs: &mut [DbWrapper],
    workload: &Arc<dyn Workload>,
    measurements: &Arc<dyn Measurements>,
) -> Result<PhaseOutcome> {
    let num_threads = dbs.len();
    assert!(num_threads > 0, "need at least one store handle");

    let latch = CountDownLatch::new(num_threads);

    let limiters: Option<Vec<Arc<RateLimiter>>> =
        if options.initial_rate > 0 || !options.rate_schedule.is_empty() {
            let per_worker = options.initial_rate / num_threads as i64;
            Some(
                (0..num_threads)
                    .map(|_| Arc::new(RateLimiter::new(per_worker, per_worker)))
                    .collect(),
            )
        } else {
            None
        };

    let base = options.total_ops / num_threads;
    let remainder = options.total_ops % num_threads;

    let start = Instant::now();
    let (worker_results, runtime) = std::thread::scope(|s| {
        if options.show_status {
            let measurements = measurements.as_ref();
            let latch = &latch;
            s.spawn(move || status_thread(measurements, latch, options.status_interval, start));
        }
        if let (Some(limiters), false) = (&limiters, options.rate_schedule.is_empty()) {
            let latch = &latch;
            s.spawn(move || rate_thread(&options.rate_schedule, limiters, latch));
        }

        let handles: Vec<_> = dbs
            .iter_mut()
            .enumerate()
            .map(|(i, db)| {
                let workload: &dyn Workload = workload.as_ref();
                let latch = &latch;
                let limiter = limiters.as_ref().map(|l| l[i].clone());
                let num_ops = base + usize::from(i < remainder);
                s.spawn(move || {
                    client_thread(
                        db,
                        workload,
                        num_ops,
                        options.phase.is_loading(),
                        options.init_db,
                        options.cleanup_db,
                        latch,
                        limiter.as_deref(),
                    )
                })
            })
            .collect();

        let results: Vec<_> = handles.into_iter().map(|h| h.join()).collect();
        (results, start.elapsed())
    });

    let mut ops = 0;
    let mut first_error = None;
    let mut panicked = false;
    for result in worker_results {
        match result {
            Ok(Ok(n)) => ops += n,
            Ok(Err(e)) => {
                tracing::error!("worker failed: {e:#}");
                first_error.get_or_insert(e);
            }
            Err(_) => panicked = true,
        }
    }
    if panicked {
        bail!("a worker thread panicked during the {} phase", options.phase.name());
    }
    if let Some(e) = first_error {
        return Err(e.context(format!("{} phase worker failed", options.phase.name())));
    }

    println!(
        "[{}] runtime={:.3} sec ops={} throughput={:.2} ops/sec",
        options.phase.name(),
        runtime.as_secs_f64(),
        ops,
        ops as f64 / runtime.as_secs_f64(),
    );

    Ok(PhaseOutcome { runtime, ops })
}

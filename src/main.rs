use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use yardstick::{
    db::{factory as db_factory, wrapper::DbWrapper},
    driver::{parse_rate_file, run_phase, Phase, PhaseOptions},
    measurements::{create_measurements, Measurements as _},
    properties::Properties,
    workload as workload_factory,
};

/// Synthetic key/value workload driver.
#[derive(Debug, Parser)]
#[command(version, about)]
struct Args {
    /// Run the loading phase of the workload.
    #[arg(long)]
    load: bool,

    /// Run the transactions phase of the workload.
    #[arg(long = "run", short = 't')]
    run: bool,

    /// Number of worker threads.
    #[arg(long)]
    threads: Option<usize>,

    /// Name of the store backend to drive.
    #[arg(long)]
    db: Option<String>,

    /// Properties file; may be repeated, later files override earlier ones.
    #[arg(short = 'P', value_name = "FILE")]
    property_files: Vec<PathBuf>,

    /// Set one property as key=value; overrides property files.
    #[arg(short = 'p', value_name = "KEY=VALUE")]
    properties: Vec<String>,

    /// Print a periodic measurements snapshot.
    #[arg(short = 's', long)]
    status: bool,
}

fn gather_properties(args: &Args) -> Result<Properties> {
    let mut props = Properties::new();
    for file in &args.property_files {
        props.load_file(file)?;
    }
    for kv in &args.properties {
        let Some((key, value)) = kv.split_once('=') else {
            bail!("-p expects key=value, got {kv:?}");
        };
        props.set(key.trim(), value.trim());
    }
    if let Some(threads) = args.threads {
        props.set("threadcount", threads.to_string());
    }
    if let Some(db) = &args.db {
        props.set("dbname", db.clone());
    }
    if args.status {
        props.set("status", "true");
    }
    Ok(props)
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();
    if !args.load && !args.run {
        bail!("nothing to do: pass --load and/or --run");
    }

    let props = gather_properties(&args)?;

    let num_threads: usize = props.parse_or("threadcount", 1)?;
    if num_threads == 0 {
        bail!("threadcount must be at least 1");
    }
    let db_name = props.get_or("dbname", "basic").to_string();
    let workload_name = props.get_or("workload", "core").to_string();
    let show_status: bool = props.parse_or("status", false)?;
    let status_interval = Duration::from_secs(props.parse_or("status.interval", 10)?);
    let sleep_after_load = Duration::from_secs(props.parse_or("sleepafterload", 0)?);
    let initial_rate: i64 = props.parse_or("limit.ops", 0)?;
    let rate_schedule = match props.get("limit.file") {
        Some(path) => parse_rate_file(path)?,
        None => vec![],
    };

    let measurements = create_measurements(&props)?;

    let mut dbs = db_factory::DbFactory::new();
    db_factory::register_builtin(&mut dbs);
    let mut workloads = workload_factory::WorkloadFactory::new();
    workload_factory::register_builtin(&mut workloads);

    let workload = workloads
        .create(&workload_name, &props)
        .context("building workload")?;

    let mut handles: Vec<DbWrapper> = (0..num_threads)
        .map(|_| {
            dbs.create(&db_name, &props)
                .map(|db| DbWrapper::new(db, measurements.clone()))
        })
        .collect::<Result<_>>()
        .context("creating store handles")?;

    if args.load {
        let total_ops: usize = props.parse_required("recordcount")?;
        measurements.start();
        run_phase(
            &PhaseOptions {
                phase: Phase::Load,
                total_ops,
                init_db: true,
                cleanup_db: !args.run,
                show_status,
                status_interval,
                initial_rate,
                rate_schedule: rate_schedule.clone(),
            },
            &mut handles,
            &workload,
            &measurements,
        )?;
    }

    if args.load && args.run {
        measurements.reset();
        if !sleep_after_load.is_zero() {
            std::thread::sleep(sleep_after_load);
        }
    }

    if args.run {
        let total_ops: usize = props.parse_required("operationcount")?;
        measurements.start();
        run_phase(
            &PhaseOptions {
                phase: Phase::Transaction,
                total_ops,
                init_db: !args.load,
                cleanup_db: true,
                show_status,
                status_interval,
                initial_rate,
                rate_schedule,
            },
            &mut handles,
            &workload,
            &measurements,
        )?;
    }

    Ok(())
}

//! A synthetic key/value workload driver.
//!
//! `yardstick` loads and exercises a pluggable record store with a
//! configurable mix of read / scan / update / insert / read-modify-write /
//! delete operations under a chosen key-popularity distribution, and reports
//! per-operation counts and latencies.
//!
//! The crate is organised around a few small pieces:
//!
//! - [`generator`] holds the request-generation engine: counters, the
//!   acknowledged-window counter that keeps read-side key choosers behind
//!   the insert watermark, and the uniform / zipfian / scrambled-zipfian /
//!   skewed-latest distributions.
//! - [`workload`] composes the generators into per-operation transaction
//!   logic and the deterministic key formatter.
//! - [`db`] is the record-store port: the five-method store trait, the
//!   built-in backends and the latency-timing wrapper.
//! - [`measurements`], [`rate`] and [`latch`] are the measurement sinks,
//!   the token-bucket rate limiter and the countdown latch the worker pool
//!   is built from.
//! - [`driver`] and [`client`] spawn one worker per store handle and run a
//!   load or transaction phase to completion.

/// Per-worker operation loop.
pub mod client;
/// Record-store port and built-in backends.
pub mod db;
/// Phase runner and its helper threads.
pub mod driver;
/// Request generation engine.
pub mod generator;
/// Countdown latch.
pub mod latch;
/// Latency measurement sinks.
pub mod measurements;
/// Configuration properties.
pub mod properties;
/// Token-bucket rate limiter.
pub mod rate;
/// Shared helpers.
pub mod utils;
/// Workload composition.
pub mod workload;

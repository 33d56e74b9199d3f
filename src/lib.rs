//! File-cache simulator core: pluggable cache engines, a log-structured
//! segmented key/value store, and the workload driver that exercises them.

pub mod cache;
pub mod config;
pub mod error;
pub mod kv;
pub mod metrics;
pub mod simulator;
pub mod stats;
pub mod workload;

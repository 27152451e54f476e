//! Scan queue integration tests.
//!
//! # Test Structure
//!
//! - `helpers` -- harness, scripted executor, flaky store, event collection
//! - `admission` -- `start_scan` eligibility and contention checks
//! - `execution` -- worker sequencing, retry and failure recording
//! - `lifecycle` -- `Pipeline` start/stop/health and queue closure
//!
//! # Running
//!
//! ```bash
//! cargo test -p scanward-scan-queue --test queue
//! ```

mod admission;
mod execution;
mod helpers;
mod lifecycle;

// Copyright The CoSim Authors
// SPDX-License-Identifier: Apache-2.0

//! Best-effort progress reporting.
//!
//! Reports are emitted in order per simulation, but delivery is fire and
//! forget: an implementation that drops or fails a report must swallow the
//! failure; a lost report never aborts a simulation.

use tracing::{debug, info};

/// Sink for simulation progress updates.
pub trait ProgressReporter: Sync {
    /// A simulation reached `percent` (0–100) of its workload.
    fn report(&self, sim_id: &str, percent: f64);

    /// A simulation finished after `wall_secs` real seconds, covering
    /// `sim_secs` simulated seconds.
    fn report_times(&self, sim_id: &str, wall_secs: f64, sim_secs: f64);
}

/// Reporter that forwards progress to the `tracing` subscriber.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingReporter;

impl ProgressReporter for TracingReporter {
    fn report(&self, sim_id: &str, percent: f64) {
        debug!(sim = sim_id, percent, "simulation progress");
    }

    fn report_times(&self, sim_id: &str, wall_secs: f64, sim_secs: f64) {
        info!(
            sim = sim_id,
            wall_secs, sim_secs, "simulation finished"
        );
    }
}

/// Reporter that discards everything; for tests and batch runs.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopReporter;

impl ProgressReporter for NoopReporter {
    fn report(&self, _sim_id: &str, _percent: f64) {}

    fn report_times(&self, _sim_id: &str, _wall_secs: f64, _sim_secs: f64) {}
}

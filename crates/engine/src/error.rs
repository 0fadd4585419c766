// Copyright The CoSim Authors
// SPDX-License-Identifier: Apache-2.0

//! Errors for the compute engine.
//!
//! Invariant failures carry enough queue context to diagnose a stuck
//! simulation without re-running it; they are fatal and stop the run.
//! Resource shortfalls never surface here; the scheduler contract is a
//! boolean result.

/// Errors raised by the compute engine and the scheduling policies.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// The next-event computation produced a non-positive time step.
    ///
    /// Admission drains every job whose submit time has arrived before the
    /// step is computed, so a zero here means the state machine is stuck.
    #[error("next simulation step is {delta} (must be strictly positive)")]
    NoForwardProgress {
        /// The offending time step.
        delta: f64,
    },

    /// No executing job will finish and no preloaded job will arrive, yet
    /// jobs remain queued.
    #[error(
        "deadlock: no next event with jobs still queued \
         (preloaded: {preloaded:?}, waiting: {waiting:?}, executing: {executing:?})"
    )]
    DeadlockDetected {
        /// Signatures still in the preloaded queue.
        preloaded: Vec<String>,
        /// Signatures still in the waiting queue.
        waiting: Vec<String>,
        /// Signatures still executing.
        executing: Vec<String>,
    },

    /// An executing job's remaining time went below zero.
    #[error("job {job} has negative remaining time {remaining}")]
    NegativeRemainingTime {
        /// Signature of the offending job.
        job: String,
        /// The observed remaining time.
        remaining: f64,
    },

    /// A scheduler name has no registered policy.
    #[error("unknown scheduler `{name}`")]
    UnknownScheduler {
        /// The name that failed to resolve.
        name: String,
    },

    /// The database holds no jobs to simulate.
    #[error("the preloaded queue is empty; nothing to simulate")]
    EmptyWorkload,

    /// A resource-model invariant failed while deploying or cleaning up.
    #[error(transparent)]
    Model(#[from] cosim_model::Error),
}

// Copyright The CoSim Authors
// SPDX-License-Identifier: Apache-2.0

//! Errors for the controller.

/// Errors raised while driving a simulation suite.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// A simulation failed with an engine error.
    #[error("simulation `{policy}` failed: {source}")]
    Simulation {
        /// The policy whose simulation failed.
        policy: String,
        /// The underlying engine error.
        source: cosim_engine::Error,
    },

    /// The cluster could not be constructed from the configured shape.
    #[error(transparent)]
    Model(#[from] cosim_model::Error),

    /// A worker thread could not be spawned.
    #[error("failed to spawn worker thread for `{policy}`: {details}")]
    ThreadSpawn {
        /// The policy the worker was meant to simulate.
        policy: String,
        /// The underlying I/O failure.
        details: String,
    },

    /// A worker thread panicked.
    #[error("worker thread for `{policy}` panicked: {panic_message}")]
    WorkerPanic {
        /// The policy the worker was simulating.
        policy: String,
        /// The rendered panic payload.
        panic_message: String,
    },

    /// The baseline policy is not part of the suite.
    #[error("baseline `{baseline}` is not among the suite's policies")]
    UnknownBaseline {
        /// The baseline name that was requested.
        baseline: String,
    },
}

// Copyright The CoSim Authors
// SPDX-License-Identifier: Apache-2.0

//! Errors for the config crate.

use miette::Diagnostic;

/// Errors that can occur while loading or validating a simulation spec.
#[derive(thiserror::Error, Debug, Diagnostic)]
pub enum Error {
    /// A collection of errors found while validating the configuration.
    #[error("invalid simulation configuration: {errors:?}")]
    #[diagnostic(code(cosim::config::invalid_configuration))]
    InvalidConfiguration {
        /// Every validation failure found, not just the first.
        #[related]
        errors: Vec<Error>,
    },

    /// A configuration file could not be read.
    #[error("file read error for `{path}`: {details}")]
    #[diagnostic(code(cosim::config::file_read_error))]
    FileReadError {
        /// The path that failed to read.
        path: String,
        /// A description of the I/O failure.
        details: String,
    },

    /// A configuration file could not be deserialized.
    #[error("{format} deserialization error: {details}")]
    #[diagnostic(code(cosim::config::deserialization_error))]
    DeserializationError {
        /// The input format ("YAML" or "JSON").
        format: String,
        /// A description of the parse failure.
        details: String,
    },

    /// The spec file extension is neither YAML nor JSON.
    #[error("unsupported spec file extension `{extension}` (expected yaml, yml, or json)")]
    #[diagnostic(code(cosim::config::unsupported_format))]
    UnsupportedFormat {
        /// The extension found on the file.
        extension: String,
    },

    /// The cluster must have at least one node.
    #[error("cluster must have at least one node")]
    #[diagnostic(code(cosim::config::no_nodes))]
    NoNodes,

    /// The socket configuration must name at least one socket.
    #[error("socket configuration is empty")]
    #[diagnostic(code(cosim::config::empty_socket_conf))]
    EmptySocketConf,

    /// Every socket needs at least one core.
    #[error("socket {socket} has zero cores")]
    #[diagnostic(code(cosim::config::zero_core_socket))]
    ZeroCoreSocket {
        /// Index of the offending socket.
        socket: usize,
    },

    /// Co-scheduling halves sockets, so every socket needs two or more
    /// cores for the half shape to stay non-empty.
    #[error(
        "scheduler `{scheduler}` co-schedules, but socket {socket} has \
         {cores} cores (at least 2 required)"
    )]
    #[diagnostic(code(cosim::config::socket_too_small_for_coscheduling))]
    SocketTooSmallForCoscheduling {
        /// The co-scheduling policy that was requested.
        scheduler: String,
        /// Index of the offending socket.
        socket: usize,
        /// Core count of that socket.
        cores: u32,
    },

    /// At least one scheduler must be configured.
    #[error("no schedulers configured")]
    #[diagnostic(code(cosim::config::no_schedulers))]
    NoSchedulers,

    /// The configured baseline is not among the configured schedulers.
    #[error("baseline `{baseline}` is not among the configured schedulers")]
    #[diagnostic(code(cosim::config::unknown_baseline))]
    UnknownBaseline {
        /// The baseline name that was requested.
        baseline: String,
    },

    /// A generator-backed workload needs a non-empty job catalog.
    #[error("workload catalog is empty")]
    #[diagnostic(code(cosim::config::empty_catalog))]
    EmptyCatalog,

    /// A generated workload must produce at least one job.
    #[error("workload would generate no jobs")]
    #[diagnostic(code(cosim::config::empty_workload))]
    EmptyWorkload,
}

// Copyright The CoSim Authors
// SPDX-License-Identifier: Apache-2.0

//! Errors for the resource model.

use crate::{HostId, JobSig};

/// Errors raised by the cluster resource model.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// A socket configuration with no sockets was given.
    #[error("socket configuration must name at least one socket")]
    EmptySocketConf,

    /// A socket configuration names a socket with zero cores.
    #[error("socket {socket} has zero cores")]
    ZeroCoreSocket {
        /// Index of the offending socket.
        socket: usize,
    },

    /// A host was asked for more cores than a socket has free.
    #[error("host {host}: socket {socket} has {free} free cores, {needed} required")]
    InsufficientCores {
        /// The host that was asked.
        host: HostId,
        /// Index of the socket that came up short.
        socket: usize,
        /// Cores requested from that socket.
        needed: u32,
        /// Cores currently free on that socket.
        free: usize,
    },

    /// A release was requested for a job the host does not hold.
    #[error("host {host} holds no cores for job {job}")]
    UnknownOccupant {
        /// The host that was asked.
        host: HostId,
        /// The job signature that was not found.
        job: JobSig,
    },

    /// The allocation shape names a different socket count than the host has.
    #[error("allocation shape has {shape_sockets} sockets, host {host} has {host_sockets}")]
    SocketCountMismatch {
        /// The host that was asked.
        host: HostId,
        /// Sockets in the requested shape.
        shape_sockets: usize,
        /// Sockets the host actually has.
        host_sockets: usize,
    },

    /// The maintained idle-core counter diverged from the per-host free sets.
    ///
    /// This is a fatal accounting invariant; the simulation must stop.
    #[error("idle-core drift: counter says {counted}, hosts hold {derived} free cores")]
    IdleCoreDrift {
        /// The maintained counter value.
        counted: usize,
        /// The value re-derived from every host's free sets.
        derived: usize,
    },

    /// The heatmap file could not be parsed.
    #[error("malformed heatmap: {details}")]
    MalformedHeatmap {
        /// Description of the parse failure.
        details: String,
    },
}

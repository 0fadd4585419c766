// Copyright The CoSim Authors
// SPDX-License-Identifier: Apache-2.0

//! Cluster resource model of the simulator.
//!
//! Data model:
//! - cluster
//!   - hosts
//!     - sockets (free [`ProcSet`]s)
//!     - occupants (held [`ProcSet`]s per resident job)
//!
//! A [`Cluster`](cluster::Cluster) owns the hosts, the waiting queue, and the
//! execution list of one simulation. The [`Database`](database::Database)
//! holds the preloaded workload and the pairwise interference
//! [`Heatmap`](heatmap::Heatmap). Only the compute engine mutates hosts;
//! schedulers work against read-only views and hand proposals back.

use serde::Serialize;
use std::fmt;

use cosim_procset::ProcSet;

pub mod cluster;
pub mod database;
pub mod error;
pub mod heatmap;
pub mod host;
pub mod job;

pub use cluster::Cluster;
pub use database::Database;
pub use error::Error;
pub use heatmap::{Heatmap, SpeedupPredictor};
pub use host::{Host, HostState};
pub use job::{Job, JobCharacter, JobState};

/// Simulated wallclock seconds.
pub type Seconds = f64;

/// Index of a host within its cluster, rendered `host{n}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(into = "String")]
pub struct HostId(pub u32);

impl fmt::Display for HostId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "host{}", self.0)
    }
}

impl From<HostId> for String {
    fn from(id: HostId) -> Self {
        id.to_string()
    }
}

/// Unique key of a job within a simulation, rendered `id:name`.
///
/// Hosts key their occupant map by signature, and the logger keys its
/// per-job records the same way.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(into = "String")]
pub struct JobSig {
    /// The numeric job id.
    pub id: u64,
    /// The workload name of the job (the heatmap key).
    pub name: String,
}

impl fmt::Display for JobSig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.id, self.name)
    }
}

impl From<JobSig> for String {
    fn from(sig: JobSig) -> Self {
        sig.to_string()
    }
}

/// Ordered core counts per socket of a host.
///
/// `[16, 16]` is a two-socket host with sixteen cores per socket. The half
/// and quarter shapes used by co-scheduling policies are derived by integer
/// division; validating that those stay non-zero is the configuration
/// layer's concern.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SocketConf(smallvec::SmallVec<[u32; 4]>);

impl SocketConf {
    /// Builds a socket shape from per-socket core counts.
    ///
    /// Fails with [`Error::EmptySocketConf`] when no sockets are given.
    pub fn new(cores: impl IntoIterator<Item = u32>) -> Result<Self, Error> {
        let cores: smallvec::SmallVec<[u32; 4]> = cores.into_iter().collect();
        if cores.is_empty() {
            return Err(Error::EmptySocketConf);
        }
        Ok(Self(cores))
    }

    /// Number of sockets.
    #[must_use]
    pub fn sockets(&self) -> usize {
        self.0.len()
    }

    /// Core count of socket `i`.
    #[must_use]
    pub fn cores(&self, i: usize) -> u32 {
        self.0[i]
    }

    /// Total cores across all sockets.
    #[must_use]
    pub fn total(&self) -> u32 {
        self.0.iter().sum()
    }

    /// Per-socket core counts in socket order.
    pub fn iter(&self) -> impl Iterator<Item = u32> + '_ {
        self.0.iter().copied()
    }

    /// The shape with every socket count halved (integer division).
    #[must_use]
    pub fn halved(&self) -> Self {
        Self(self.0.iter().map(|c| c / 2).collect())
    }

    /// The shape with every socket count quartered (integer division).
    #[must_use]
    pub fn quartered(&self) -> Self {
        Self(self.0.iter().map(|c| c / 4).collect())
    }
}

/// A per-host allocation proposal: the host and the cores to take per socket.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostAllocation {
    /// The host the cores belong to.
    pub host: HostId,
    /// One reserved [`ProcSet`] per socket, in socket order.
    pub psets: Vec<ProcSet>,
}

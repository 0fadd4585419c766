// Copyright The CoSim Authors
// SPDX-License-Identifier: Apache-2.0

//! One node of the cluster: per-socket free cores and resident jobs.

use smallvec::SmallVec;
use std::collections::HashMap;

use cosim_procset::ProcSet;

use crate::{Error, HostId, JobSig, SocketConf};

/// Allocation state of a host.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostState {
    /// No resident jobs.
    Idle,
    /// At least one resident job.
    Allocated,
    /// Taken out of service externally; never entered by the simulator.
    Down,
}

/// A node with one free [`ProcSet`] per socket and an occupant map of the
/// cores each resident job holds.
///
/// Invariants: every occupant's held sets are disjoint from the free sets,
/// `|free| + Σ|held| = socket_conf[i]` per socket, and the state is
/// [`HostState::Idle`] exactly when the occupant map is empty.
#[derive(Debug, Clone)]
pub struct Host {
    id: HostId,
    socket_conf: SocketConf,
    sockets: SmallVec<[ProcSet; 4]>,
    state: HostState,
    occupants: HashMap<JobSig, Vec<ProcSet>>,
}

impl Host {
    /// Builds an idle host whose sockets cover consecutive core IDs
    /// starting at `first_core`.
    #[must_use]
    pub fn new(id: HostId, socket_conf: SocketConf, first_core: u32) -> Self {
        let mut next = first_core;
        let sockets = socket_conf
            .iter()
            .map(|cores| {
                let set = ProcSet::from(next..=next + cores - 1);
                next += cores;
                set
            })
            .collect();
        Self {
            id,
            socket_conf,
            sockets,
            state: HostState::Idle,
            occupants: HashMap::new(),
        }
    }

    /// The host's cluster-wide id.
    #[must_use]
    pub fn id(&self) -> HostId {
        self.id
    }

    /// The host's socket shape.
    #[must_use]
    pub fn socket_conf(&self) -> &SocketConf {
        &self.socket_conf
    }

    /// Current allocation state.
    #[must_use]
    pub fn state(&self) -> HostState {
        self.state
    }

    /// The free set of each socket, in socket order.
    #[must_use]
    pub fn sockets(&self) -> &[ProcSet] {
        &self.sockets
    }

    /// Signatures of the jobs currently holding cores on the host.
    pub fn occupant_sigs(&self) -> impl Iterator<Item = &JobSig> {
        self.occupants.keys()
    }

    /// Number of resident jobs.
    #[must_use]
    pub fn occupant_count(&self) -> usize {
        self.occupants.len()
    }

    /// Free cores summed over all sockets.
    #[must_use]
    pub fn idle_cores(&self) -> usize {
        self.sockets.iter().map(ProcSet::len).sum()
    }

    /// Held cores summed over all sockets.
    #[must_use]
    pub fn used_cores(&self) -> usize {
        self.socket_conf.total() as usize - self.idle_cores()
    }

    /// Whether every socket has at least `shape[i]` free cores.
    #[must_use]
    pub fn satisfies(&self, shape: &SocketConf) -> bool {
        shape.sockets() == self.sockets.len()
            && self
                .sockets
                .iter()
                .zip(shape.iter())
                .all(|(free, needed)| free.len() >= needed as usize)
    }

    /// The cores an allocation under `shape` would take: the `shape[i]`
    /// smallest free cores of each socket. Does not mutate.
    ///
    /// Returns `None` when some socket cannot cover its share.
    #[must_use]
    pub fn preview(&self, shape: &SocketConf) -> Option<Vec<ProcSet>> {
        if !self.satisfies(shape) {
            return None;
        }
        Some(
            self.sockets
                .iter()
                .zip(shape.iter())
                .map(|(free, needed)| free.take(needed as usize))
                .collect(),
        )
    }

    /// Takes the `shape[i]` smallest free cores of every socket for `sig`.
    ///
    /// First allocation flips the host to [`HostState::Allocated`]. Fails
    /// with [`Error::InsufficientCores`] if any socket lacks its share, and
    /// mutates nothing on failure.
    pub fn allocate(&mut self, shape: &SocketConf, sig: JobSig) -> Result<Vec<ProcSet>, Error> {
        if shape.sockets() != self.sockets.len() {
            return Err(Error::SocketCountMismatch {
                host: self.id,
                shape_sockets: shape.sockets(),
                host_sockets: self.sockets.len(),
            });
        }
        for (i, (free, needed)) in self.sockets.iter().zip(shape.iter()).enumerate() {
            if free.len() < needed as usize {
                return Err(Error::InsufficientCores {
                    host: self.id,
                    socket: i,
                    needed,
                    free: free.len(),
                });
            }
        }
        let held: Vec<ProcSet> = self
            .sockets
            .iter_mut()
            .zip(shape.iter())
            .map(|(free, needed)| {
                let taken = free.take(needed as usize);
                *free = free.difference(&taken);
                taken
            })
            .collect();
        let _ = self.occupants.insert(sig, held.clone());
        self.state = HostState::Allocated;
        Ok(held)
    }

    /// Returns the cores held by `sig` to the free sets.
    ///
    /// Flips the host back to [`HostState::Idle`] when the last occupant
    /// leaves. Fails with [`Error::UnknownOccupant`] if the job holds
    /// nothing here.
    pub fn release(&mut self, sig: &JobSig) -> Result<Vec<ProcSet>, Error> {
        let held = self
            .occupants
            .remove(sig)
            .ok_or_else(|| Error::UnknownOccupant {
                host: self.id,
                job: sig.clone(),
            })?;
        for (free, returned) in self.sockets.iter_mut().zip(held.iter()) {
            *free = free.union(returned);
        }
        if self.occupants.is_empty() {
            self.state = HostState::Idle;
        }
        Ok(held)
    }
}

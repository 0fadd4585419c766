// Copyright The CoSim Authors
// SPDX-License-Identifier: Apache-2.0

//! The cluster: hosts, queues, and the simulated wallclock cursor.

use std::collections::VecDeque;

use cosim_procset::ProcSet;

use crate::{Error, Host, HostId, Job, Seconds, SocketConf};

/// A collection of identical hosts plus the waiting queue and execution
/// list of one simulation.
///
/// The engine is the only mutator of hosts and of the idle-core counter;
/// schedulers reorder the waiting queue and compute proposals but hand
/// every resource mutation back to the engine.
#[derive(Debug)]
pub struct Cluster {
    socket_conf: SocketConf,
    half_shape: SocketConf,
    quarter_shape: SocketConf,
    hosts: Vec<Host>,
    total_cores: usize,
    idle_cores: usize,
    makespan: Seconds,

    /// Jobs admitted and waiting for resources, in queue order.
    pub waiting_queue: VecDeque<Job>,
    /// Jobs currently deployed on hosts.
    pub execution_list: Vec<Job>,

    /// Optional cap on the waiting queue length (`None` = unbounded).
    pub queue_size: Option<usize>,

    next_job_id: u64,
}

impl Cluster {
    /// Builds a cluster of `nodes` identical hosts with the given socket
    /// shape. Core IDs are consecutive across hosts, socket by socket.
    ///
    /// Fails with [`Error::ZeroCoreSocket`] when any socket has no cores.
    pub fn new(nodes: usize, socket_conf: SocketConf) -> Result<Self, Error> {
        if let Some(socket) = socket_conf.iter().position(|c| c == 0) {
            return Err(Error::ZeroCoreSocket { socket });
        }
        let cores_per_node = socket_conf.total();
        let hosts: Vec<Host> = (0..nodes)
            .map(|i| {
                Host::new(
                    HostId(i as u32),
                    socket_conf.clone(),
                    i as u32 * cores_per_node,
                )
            })
            .collect();
        let total_cores = cores_per_node as usize * nodes;
        Ok(Self {
            half_shape: socket_conf.halved(),
            quarter_shape: socket_conf.quartered(),
            socket_conf,
            hosts,
            total_cores,
            idle_cores: total_cores,
            makespan: 0.0,
            waiting_queue: VecDeque::new(),
            execution_list: Vec::new(),
            queue_size: None,
            next_job_id: 0,
        })
    }

    /// The full-socket (compact, exclusive) allocation shape.
    #[must_use]
    pub fn full_socket_allocation(&self) -> &SocketConf {
        &self.socket_conf
    }

    /// The half-socket allocation shape used for co-location.
    #[must_use]
    pub fn half_socket_allocation(&self) -> &SocketConf {
        &self.half_shape
    }

    /// The quarter-socket allocation shape.
    #[must_use]
    pub fn quarter_socket_allocation(&self) -> &SocketConf {
        &self.quarter_shape
    }

    /// Number of hosts.
    #[must_use]
    pub fn nodes(&self) -> usize {
        self.hosts.len()
    }

    /// Cores per host.
    #[must_use]
    pub fn cores_per_node(&self) -> usize {
        self.socket_conf.total() as usize
    }

    /// Constant total core count.
    #[must_use]
    pub fn total_cores(&self) -> usize {
        self.total_cores
    }

    /// The maintained count of currently free cores.
    #[must_use]
    pub fn idle_cores(&self) -> usize {
        self.idle_cores
    }

    /// Cores currently held by executing jobs.
    #[must_use]
    pub fn used_cores(&self) -> usize {
        self.total_cores - self.idle_cores
    }

    /// The hosts in their stable cluster order.
    #[must_use]
    pub fn hosts(&self) -> &[Host] {
        &self.hosts
    }

    /// A host by id.
    #[must_use]
    pub fn host(&self, id: HostId) -> &Host {
        &self.hosts[id.0 as usize]
    }

    /// Mutable access to a host; reserved for the engine's deploy and
    /// clean-up paths.
    pub fn host_mut(&mut self, id: HostId) -> &mut Host {
        &mut self.hosts[id.0 as usize]
    }

    /// Subtracts `n` cores from the idle counter after a deploy.
    pub fn charge_cores(&mut self, n: usize) {
        debug_assert!(n <= self.idle_cores);
        self.idle_cores -= n;
    }

    /// Returns `n` cores to the idle counter after a clean-up.
    pub fn credit_cores(&mut self, n: usize) {
        debug_assert!(self.idle_cores + n <= self.total_cores);
        self.idle_cores += n;
    }

    /// The simulated wallclock cursor.
    #[must_use]
    pub fn makespan(&self) -> Seconds {
        self.makespan
    }

    /// Advances the wallclock cursor; the cursor never moves backwards.
    pub fn advance(&mut self, delta: Seconds) {
        debug_assert!(delta >= 0.0);
        self.makespan += delta;
    }

    /// Whether the job's footprint can ever fit on this cluster.
    #[must_use]
    pub fn fits(&self, job: &Job) -> bool {
        job.processes as usize <= self.total_cores
    }

    /// Hands out the next monotonically increasing job id.
    pub fn take_job_id(&mut self) -> u64 {
        let id = self.next_job_id;
        self.next_job_id += 1;
        id
    }

    /// Re-derives the free-core count from every host and checks it against
    /// the maintained counter.
    ///
    /// A mismatch is the fatal [`Error::IdleCoreDrift`] invariant.
    pub fn verify_core_accounting(&self) -> Result<(), Error> {
        let derived: usize = self.hosts.iter().map(Host::idle_cores).sum();
        if derived != self.idle_cores {
            return Err(Error::IdleCoreDrift {
                counted: self.idle_cores,
                derived,
            });
        }
        Ok(())
    }

    /// Union of the free sets of every socket of every host.
    #[must_use]
    pub fn free_procs(&self) -> ProcSet {
        self.hosts
            .iter()
            .flat_map(|host| host.sockets().iter())
            .fold(ProcSet::new(), |acc, set| acc.union(set))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn shape(cores: &[u32]) -> SocketConf {
        SocketConf::new(cores.iter().copied()).expect("shape")
    }

    #[test]
    fn hosts_get_consecutive_core_ranges() {
        let cluster = Cluster::new(2, shape(&[2, 2])).expect("cluster");
        assert_eq!(cluster.total_cores(), 8);
        assert_eq!(cluster.host(HostId(0)).sockets()[0].to_string(), "0-1");
        assert_eq!(cluster.host(HostId(1)).sockets()[0].to_string(), "4-5");
        assert_eq!(cluster.free_procs().to_string(), "0-7");
    }

    #[test]
    fn derived_allocation_shapes() {
        let cluster = Cluster::new(1, shape(&[8, 8])).expect("cluster");
        assert_eq!(cluster.half_socket_allocation(), &shape(&[4, 4]));
        assert_eq!(cluster.quarter_socket_allocation(), &shape(&[2, 2]));
    }

    #[test]
    fn zero_core_socket_is_rejected() {
        assert!(matches!(
            Cluster::new(1, SocketConf::new([2, 0]).expect("shape")),
            Err(Error::ZeroCoreSocket { socket: 1 })
        ));
    }

    #[test]
    fn core_accounting_detects_drift() {
        let mut cluster = Cluster::new(1, shape(&[2, 2])).expect("cluster");
        cluster.verify_core_accounting().expect("fresh cluster");
        cluster.charge_cores(2);
        assert!(matches!(
            cluster.verify_core_accounting(),
            Err(Error::IdleCoreDrift {
                counted: 2,
                derived: 4
            })
        ));
    }

    #[test]
    fn job_ids_are_monotonic() {
        let mut cluster = Cluster::new(1, shape(&[2])).expect("cluster");
        assert_eq!(cluster.take_job_id(), 0);
        assert_eq!(cluster.take_job_id(), 1);
    }
}

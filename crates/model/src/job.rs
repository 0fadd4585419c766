// Copyright The CoSim Authors
// SPDX-License-Identifier: Apache-2.0

//! One simulated HPC job.

use serde::Serialize;

use crate::{HostId, JobSig, Seconds, SocketConf};

/// Lifecycle state of a job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum JobState {
    /// Waiting in the preloaded or waiting queue.
    Pending,
    /// Deployed on hosts and consuming simulated time.
    Executing,
    /// Ran to completion.
    Finished,
    /// Terminated by a simulated failure.
    Failed,
    /// Cancelled before completion.
    Aborted,
}

/// Interference profile classification derived from the heatmap row.
///
/// Drives the pairing decisions of the rules co-scheduler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum JobCharacter {
    /// Suffers from sharing; prefers exclusive full-socket placement.
    Compact,
    /// Benefits from spreading over more hosts.
    Spread,
    /// Insensitive to neighbors.
    Robust,
    /// High variance across neighbors; pair only with robust jobs.
    Frail,
}

/// One simulated job: resource demand, timing, and interference profile.
#[derive(Debug, Clone)]
pub struct Job {
    /// Monotonically assigned numeric id.
    pub id: u64,
    /// Workload name; the key into the interference heatmap.
    pub name: String,

    /// Number of processes (ranks) the job needs, one core each.
    pub processes: u32,
    /// Hosts needed under the full-socket (compact) shape.
    pub full_socket_nodes: u32,
    /// Hosts needed under the half-socket (co-scheduled) shape.
    pub half_socket_nodes: u32,
    /// The per-socket shape the job was deployed with, once allocated.
    pub socket_conf: Option<SocketConf>,
    /// Hosts currently holding cores for the job; empty unless executing.
    pub assigned_hosts: Vec<HostId>,

    /// Simulated seconds of work left at the current speedup.
    pub remaining_time: Seconds,
    /// Time the job enters the waiting queue; reset to the admission
    /// makespan when admitted.
    pub submit_time: Seconds,
    /// User-requested runtime bound; drives backfill reservations.
    pub wall_time: Seconds,
    /// Makespan at deploy, once started.
    pub start_time: Option<Seconds>,
    /// Makespan at clean-up, once finished.
    pub finish_time: Option<Seconds>,

    /// The multiplicative factor currently applied to the remaining time.
    pub sim_speedup: f64,
    /// Mean of the job's known heatmap row.
    pub avg_speedup: f64,
    /// Minimum of the job's known heatmap row.
    pub min_speedup: f64,
    /// Maximum of the job's known heatmap row.
    pub max_speedup: f64,

    /// Feature tags fed to an attached speedup predictor.
    pub tags: Vec<String>,
    /// Interference classification derived at preload setup.
    pub character: JobCharacter,
    /// Current lifecycle state.
    pub state: JobState,
    /// Steps spent as the blocked head of the waiting queue.
    pub age: u32,
}

impl Job {
    /// Builds a pending job.
    ///
    /// Demands are clamped the way the workload importers expect: at least
    /// one process, and strictly positive remaining and wall time (traces
    /// occasionally carry zero-second records).
    #[must_use]
    pub fn new(
        id: u64,
        name: impl Into<String>,
        processes: u32,
        remaining_time: Seconds,
        submit_time: Seconds,
        wall_time: Seconds,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            processes: processes.max(1),
            full_socket_nodes: 0,
            half_socket_nodes: 0,
            socket_conf: None,
            assigned_hosts: Vec::new(),
            remaining_time: if remaining_time > 0.0 {
                remaining_time
            } else {
                0.1
            },
            submit_time: submit_time.max(0.0),
            wall_time: if wall_time > 0.0 { wall_time } else { 0.1 },
            start_time: None,
            finish_time: None,
            sim_speedup: 1.0,
            avg_speedup: 1.0,
            min_speedup: 1.0,
            max_speedup: 1.0,
            tags: Vec::new(),
            character: JobCharacter::Compact,
            state: JobState::Pending,
            age: 0,
        }
    }

    /// The job's unique `id:name` signature.
    #[must_use]
    pub fn signature(&self) -> JobSig {
        JobSig {
            id: self.id,
            name: self.name.clone(),
        }
    }

    /// Whether the job was deployed under a shape other than `full_shape`,
    /// i.e. shares sockets and is subject to interference.
    #[must_use]
    pub fn is_spread(&self, full_shape: &SocketConf) -> bool {
        self.socket_conf.as_ref().is_some_and(|conf| conf != full_shape)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_clamps_degenerate_demands() {
        let job = Job::new(0, "a", 0, 0.0, -5.0, 0.0);
        assert_eq!(job.processes, 1);
        assert!(job.remaining_time > 0.0);
        assert!(job.wall_time > 0.0);
        assert_eq!(job.submit_time, 0.0);
    }

    #[test]
    fn signature_renders_id_and_name() {
        let job = Job::new(3, "lulesh", 8, 10.0, 0.0, 10.0);
        assert_eq!(job.signature().to_string(), "3:lulesh");
    }

    #[test]
    fn spread_depends_on_deployed_shape() {
        let full = SocketConf::new([2, 2]).expect("shape");
        let mut job = Job::new(0, "a", 4, 10.0, 0.0, 10.0);
        assert!(!job.is_spread(&full), "undeployed job is not spread");
        job.socket_conf = Some(full.halved());
        assert!(job.is_spread(&full));
        job.socket_conf = Some(full.clone());
        assert!(!job.is_spread(&full));
    }
}

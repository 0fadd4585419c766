// Copyright The CoSim Authors
// SPDX-License-Identifier: Apache-2.0

//! Typed simulation events and the streams they land in.

use cosim_model::{HostId, JobSig, Seconds};
use cosim_procset::ProcSet;

/// The event stream a log line is appended to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stream {
    /// Job lifecycle events.
    Job,
    /// Per-host placement events.
    Cluster,
    /// Time-advancement events.
    CompEngine,
    /// Policy decisions and warnings.
    Scheduler,
}

/// One simulation event, logged at a state transition.
#[derive(Debug, Clone)]
pub enum LogEvent {
    /// A job left the waiting queue and started executing.
    JobStart {
        /// The job that started.
        sig: JobSig,
        /// Its submit (admission) time.
        submit: Seconds,
        /// Its start time.
        start: Seconds,
    },
    /// A job received cores on one host.
    JobDeployedToHost {
        /// The job that was placed.
        sig: JobSig,
        /// The host that received it.
        host: HostId,
        /// The cores taken, one set per socket.
        psets: Vec<ProcSet>,
    },
    /// A job's cores were returned to one host.
    JobCleanedFromHost {
        /// The job that was cleaned.
        sig: JobSig,
        /// The host that reclaimed the cores.
        host: HostId,
    },
    /// A job finished and left the execution list.
    JobFinish {
        /// The job that finished.
        sig: JobSig,
        /// Its finish time.
        finish: Seconds,
    },
    /// A job's applied speedup changed after an interference recomputation.
    SpeedupChange {
        /// The affected job.
        sig: JobSig,
        /// The newly applied speedup.
        speedup: f64,
        /// The rescaled remaining time.
        remaining: Seconds,
        /// The neighbors driving the change.
        cojobs: Vec<JobSig>,
    },
    /// The engine advanced the simulated clock.
    NextTimeStep {
        /// Seconds advanced.
        delta: Seconds,
    },
    /// A free-form policy note (e.g. an unschedulable-job warning).
    SchedulerNote {
        /// The note text.
        message: String,
    },
}

impl LogEvent {
    /// The stream this event belongs to.
    #[must_use]
    pub fn stream(&self) -> Stream {
        match self {
            LogEvent::JobStart { .. }
            | LogEvent::JobFinish { .. }
            | LogEvent::SpeedupChange { .. } => Stream::Job,
            LogEvent::JobDeployedToHost { .. } | LogEvent::JobCleanedFromHost { .. } => {
                Stream::Cluster
            }
            LogEvent::NextTimeStep { .. } => Stream::CompEngine,
            LogEvent::SchedulerNote { .. } => Stream::Scheduler,
        }
    }

    /// The human-readable line appended to the stream.
    #[must_use]
    pub fn render(&self, makespan: Seconds) -> String {
        let body = match self {
            LogEvent::JobStart { sig, .. } => format!("job started executing [{sig}]"),
            LogEvent::JobFinish { sig, .. } => format!("job finished execution [{sig}]"),
            LogEvent::JobDeployedToHost { sig, host, .. } => {
                format!("job deployed to host [{sig} in-> {host}]")
            }
            LogEvent::JobCleanedFromHost { sig, host } => {
                format!("job cleaned from host [{host} out-> {sig}]")
            }
            LogEvent::SpeedupChange { sig, speedup, .. } => {
                format!("job speedup changed [{sig} -> {speedup}]")
            }
            LogEvent::NextTimeStep { delta } => {
                format!("calculated the simulation time step [{delta}]")
            }
            LogEvent::SchedulerNote { message } => message.clone(),
        };
        format!("({makespan:.2}s)    {body}")
    }
}

// Copyright The CoSim Authors
// SPDX-License-Identifier: Apache-2.0

//! In-memory trace of one simulation.
//!
//! The logger keeps four line streams for post-mortem reading, a record per
//! job, and a coalesced checkpoint trace of cluster-wide counters. It holds
//! no reference back into the simulation: every `log` call carries the
//! current makespan and idle-core count, so the logger can be moved out of
//! a finished run and compared against another run's logger.

use std::collections::BTreeMap;
use std::collections::BTreeSet;

use cosim_model::{HostId, Job, JobSig, Seconds};
use cosim_procset::ProcSet;

pub mod events;
pub mod views;

pub use events::{LogEvent, Stream};

/// Everything recorded about one job over its lifetime.
#[derive(Debug, Clone)]
pub struct JobRecord {
    /// Admission time into the waiting queue.
    pub submit: Seconds,
    /// Deploy time.
    pub start: Seconds,
    /// Clean-up time.
    pub finish: Seconds,
    /// `start - submit`.
    pub waiting: Seconds,
    /// Requested wall time.
    pub wall_time: Seconds,
    /// Requested processes.
    pub processes: u32,
    /// Union of every core the job held.
    pub assigned_procs: ProcSet,
    /// Hosts the job ran on.
    pub hosts: BTreeSet<HostId>,
    /// `(makespan, applied speedup)` at every speedup change.
    pub speedup_trace: Vec<(Seconds, f64)>,
    /// `(makespan, rescaled remaining time)` at every speedup change.
    pub remaining_trace: Vec<(Seconds, Seconds)>,
    /// `(makespan, neighbors)` at every speedup change.
    pub cojob_trace: Vec<(Seconds, Vec<JobSig>)>,
}

impl JobRecord {
    fn new(job: &Job) -> Self {
        Self {
            submit: 0.0,
            start: 0.0,
            finish: 0.0,
            waiting: 0.0,
            wall_time: job.wall_time,
            processes: job.processes,
            assigned_procs: ProcSet::new(),
            hosts: BTreeSet::new(),
            speedup_trace: Vec::new(),
            remaining_trace: Vec::new(),
            cojob_trace: Vec::new(),
        }
    }
}

/// Per-stream log lines plus the structured per-job and cluster traces.
#[derive(Debug, Default)]
pub struct Logger {
    job_logs: Vec<String>,
    cluster_logs: Vec<String>,
    compeng_logs: Vec<String>,
    scheduler_logs: Vec<String>,

    records: BTreeMap<JobSig, JobRecord>,

    checkpoints: Vec<Seconds>,
    unused_cores: Vec<usize>,
    finished_jobs: Vec<usize>,
}

impl Logger {
    /// A logger with no recorded state.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Initializes one record per preloaded job and the checkpoint arrays.
    ///
    /// Called once by the engine after preload setup, when job ids and
    /// demands are final.
    pub fn setup(&mut self, preloaded: &[Job], total_cores: usize) {
        self.records = preloaded
            .iter()
            .map(|job| (job.signature(), JobRecord::new(job)))
            .collect();
        self.checkpoints = vec![0.0];
        self.unused_cores = vec![total_cores];
        self.finished_jobs = vec![0];
    }

    /// Appends an event, updating the per-job record and, on start and
    /// finish events, the checkpoint trace.
    ///
    /// Events sharing a makespan coalesce into one checkpoint; within a
    /// checkpoint, lines keep insertion order.
    pub fn log(&mut self, makespan: Seconds, idle_cores: usize, event: LogEvent) {
        let line = event.render(makespan);
        match event.stream() {
            Stream::Job => self.job_logs.push(line),
            Stream::Cluster => self.cluster_logs.push(line),
            Stream::CompEngine => self.compeng_logs.push(line),
            Stream::Scheduler => self.scheduler_logs.push(line),
        }

        match &event {
            LogEvent::JobStart { sig, submit, start } => {
                if let Some(record) = self.records.get_mut(sig) {
                    record.submit = *submit;
                    record.start = *start;
                    record.waiting = *start - *submit;
                }
            }
            LogEvent::JobDeployedToHost { sig, host, psets } => {
                if let Some(record) = self.records.get_mut(sig) {
                    for pset in psets {
                        record.assigned_procs = record.assigned_procs.union(pset);
                    }
                    let _ = record.hosts.insert(*host);
                }
            }
            LogEvent::JobFinish { sig, finish } => {
                if let Some(record) = self.records.get_mut(sig) {
                    record.finish = *finish;
                }
            }
            LogEvent::SpeedupChange {
                sig,
                speedup,
                remaining,
                cojobs,
            } => {
                if let Some(record) = self.records.get_mut(sig) {
                    record.speedup_trace.push((makespan, *speedup));
                    record.remaining_trace.push((makespan, *remaining));
                    record.cojob_trace.push((makespan, cojobs.clone()));
                }
            }
            LogEvent::JobCleanedFromHost { .. }
            | LogEvent::NextTimeStep { .. }
            | LogEvent::SchedulerNote { .. } => {}
        }

        // Placement events share the start/finish makespan and coalesce
        // into the same checkpoint, so the recorded idle-core value is the
        // state immediately after the whole transition.
        if matches!(
            event,
            LogEvent::JobStart { .. }
                | LogEvent::JobFinish { .. }
                | LogEvent::JobDeployedToHost { .. }
                | LogEvent::JobCleanedFromHost { .. }
        ) {
            let finished_delta = usize::from(matches!(event, LogEvent::JobFinish { .. }));
            match self.checkpoints.last() {
                Some(last) if *last == makespan => {
                    let idx = self.unused_cores.len() - 1;
                    self.unused_cores[idx] = idle_cores;
                    self.finished_jobs[idx] += finished_delta;
                }
                _ => {
                    self.checkpoints.push(makespan);
                    self.unused_cores.push(idle_cores);
                    let prev = self.finished_jobs.last().copied().unwrap_or(0);
                    self.finished_jobs.push(prev + finished_delta);
                }
            }
        }
    }

    /// The per-job records, keyed by signature.
    #[must_use]
    pub fn records(&self) -> &BTreeMap<JobSig, JobRecord> {
        &self.records
    }

    /// Total jobs recorded as finished.
    #[must_use]
    pub fn finished_count(&self) -> usize {
        self.finished_jobs.last().copied().unwrap_or(0)
    }

    /// The lines of one event stream.
    #[must_use]
    pub fn stream(&self, stream: Stream) -> &[String] {
        match stream {
            Stream::Job => &self.job_logs,
            Stream::Cluster => &self.cluster_logs,
            Stream::CompEngine => &self.compeng_logs,
            Stream::Scheduler => &self.scheduler_logs,
        }
    }

    pub(crate) fn checkpoint_trace(&self) -> (&[Seconds], &[usize], &[usize]) {
        (&self.checkpoints, &self.unused_cores, &self.finished_jobs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sig(id: u64) -> JobSig {
        JobSig {
            id,
            name: format!("j{id}"),
        }
    }

    fn seeded_logger(n: u64) -> Logger {
        let jobs: Vec<Job> = (0..n)
            .map(|i| Job::new(i, format!("j{i}"), 4, 10.0, 0.0, 12.0))
            .collect();
        let mut logger = Logger::new();
        logger.setup(&jobs, 8);
        logger
    }

    #[test]
    fn start_and_deploy_update_the_record() {
        let mut logger = seeded_logger(1);
        logger.log(
            5.0,
            4,
            LogEvent::JobStart {
                sig: sig(0),
                submit: 2.0,
                start: 5.0,
            },
        );
        logger.log(
            5.0,
            4,
            LogEvent::JobDeployedToHost {
                sig: sig(0),
                host: HostId(1),
                psets: vec!["4-5".parse().expect("pset"), "6-7".parse().expect("pset")],
            },
        );
        let record = &logger.records()[&sig(0)];
        assert_eq!(record.waiting, 3.0);
        assert_eq!(record.assigned_procs.to_string(), "4-7");
        assert!(record.hosts.contains(&HostId(1)));
    }

    #[test]
    fn checkpoints_coalesce_on_equal_makespan() {
        let mut logger = seeded_logger(2);
        logger.log(
            0.0,
            4,
            LogEvent::JobStart {
                sig: sig(0),
                submit: 0.0,
                start: 0.0,
            },
        );
        logger.log(
            0.0,
            0,
            LogEvent::JobStart {
                sig: sig(1),
                submit: 0.0,
                start: 0.0,
            },
        );
        logger.log(
            10.0,
            4,
            LogEvent::JobFinish {
                sig: sig(0),
                finish: 10.0,
            },
        );
        logger.log(
            10.0,
            8,
            LogEvent::JobFinish {
                sig: sig(1),
                finish: 10.0,
            },
        );
        let (checkpoints, unused, finished) = logger.checkpoint_trace();
        assert_eq!(checkpoints, &[0.0, 10.0]);
        assert_eq!(unused, &[0, 8], "same-makespan events overwrite in place");
        assert_eq!(finished, &[0, 2]);
        assert_eq!(logger.finished_count(), 2);
    }

    #[test]
    fn lines_land_in_their_streams() {
        let mut logger = seeded_logger(1);
        logger.log(1.0, 8, LogEvent::NextTimeStep { delta: 1.0 });
        logger.log(
            1.0,
            8,
            LogEvent::SchedulerNote {
                message: "note".to_owned(),
            },
        );
        assert_eq!(logger.stream(Stream::CompEngine).len(), 1);
        assert_eq!(logger.stream(Stream::Scheduler).len(), 1);
        assert!(logger.stream(Stream::Job).is_empty());
    }
}

// Copyright The CoSim Authors
// SPDX-License-Identifier: Apache-2.0

//! The discrete-event core: admission, interference recomputation,
//! next-event selection, and time advancement.

use std::collections::{BTreeSet, HashSet};

use cosim_model::{Cluster, Database, Job, JobCharacter, JobSig, SocketConf};
use tracing::{debug, warn};

use crate::error::Error;
use crate::logger::{LogEvent, Logger};
use crate::sched::Scheduler;
use crate::state::SimState;

/// The event loop of one simulation.
///
/// The engine owns the database, cluster, logger, and scheduler; the
/// scheduler is invoked exactly at state-transition boundaries with a
/// borrow of the state, never holding references of its own. `step` is
/// public so a driver can interleave progress reporting; `run` drives the
/// loop to completion.
pub struct ComputeEngine {
    state: SimState,
    scheduler: Box<dyn Scheduler>,
    warned_unschedulable: HashSet<u64>,
}

impl ComputeEngine {
    /// Assembles a simulation from its parts.
    #[must_use]
    pub fn new(
        database: Database,
        cluster: Cluster,
        scheduler: Box<dyn Scheduler>,
        logger: Logger,
    ) -> Self {
        Self {
            state: SimState::new(database, cluster, logger),
            scheduler,
            warned_unschedulable: HashSet::new(),
        }
    }

    /// Read access to the simulation state.
    #[must_use]
    pub fn state(&self) -> &SimState {
        &self.state
    }

    /// Consumes the engine, yielding the final state (logger included).
    #[must_use]
    pub fn into_state(self) -> SimState {
        self.state
    }

    /// The current simulated wallclock.
    #[must_use]
    pub fn makespan(&self) -> f64 {
        self.state.cluster.makespan()
    }

    /// The running policy's registered name.
    #[must_use]
    pub fn scheduler_name(&self) -> &'static str {
        self.scheduler.name()
    }

    /// Fraction of the workload recorded as finished, in `[0, 1]`.
    #[must_use]
    pub fn progress(&self) -> f64 {
        if self.state.total_jobs == 0 {
            return 0.0;
        }
        self.state.logger.finished_count() as f64 / self.state.total_jobs as f64
    }

    /// Whether every queue has drained.
    #[must_use]
    pub fn is_done(&self) -> bool {
        self.state.database.preloaded_queue.is_empty()
            && self.state.cluster.waiting_queue.is_empty()
            && self.state.cluster.execution_list.is_empty()
    }

    /// One-time preparation: fill the heatmap, normalize the preloaded
    /// queue, and let the logger and scheduler initialize.
    pub fn setup(&mut self) -> Result<(), Error> {
        if self.state.database.preloaded_queue.is_empty() {
            return Err(Error::EmptyWorkload);
        }
        self.state.database.setup();
        self.setup_preloaded_jobs();
        self.state.total_jobs = self.state.database.preloaded_queue.len();
        self.state.logger.setup(
            &self.state.database.preloaded_queue,
            self.state.cluster.total_cores(),
        );
        self.scheduler.setup(&mut self.state);
        Ok(())
    }

    /// Sorts the preloaded queue, shifts submit times to zero, assigns ids,
    /// derives node footprints, and characterizes every job from its
    /// heatmap row.
    fn setup_preloaded_jobs(&mut self) {
        let state = &mut self.state;
        state
            .database
            .preloaded_queue
            .sort_by(|a, b| a.submit_time.total_cmp(&b.submit_time));
        let shift = state
            .database
            .preloaded_queue
            .first()
            .map_or(0.0, |job| job.submit_time);

        let full_total = state.cluster.full_socket_allocation().total();
        let half_total = state.cluster.half_socket_allocation().total();

        for job in state.database.preloaded_queue.iter_mut() {
            job.submit_time -= shift;
            job.id = state.cluster.take_job_id();

            job.full_socket_nodes = job.processes.div_ceil(full_total);
            job.half_socket_nodes = if half_total == 0 {
                0
            } else {
                job.processes.div_ceil(half_total)
            };

            let mut speedups = state.database.heatmap.row_values(&job.name);
            if speedups.is_empty() {
                // No interference knowledge: behave like a compact job.
                speedups.push(1.0);
            }
            let mut min = f64::INFINITY;
            let mut max = f64::NEG_INFINITY;
            let mut sum = 0.0;
            for speedup in &speedups {
                min = min.min(*speedup);
                max = max.max(*speedup);
                sum += *speedup;
            }
            let avg = sum / speedups.len() as f64;
            job.min_speedup = min;
            job.max_speedup = max;
            job.avg_speedup = avg;

            let variance = speedups
                .iter()
                .map(|speedup| (speedup - avg).powi(2))
                .sum::<f64>()
                / speedups.len() as f64;
            let stdev = variance.sqrt();

            job.character = if avg > 1.02 {
                JobCharacter::Spread
            } else if avg < 0.98 {
                JobCharacter::Compact
            } else if stdev > 0.07 {
                JobCharacter::Frail
            } else {
                JobCharacter::Robust
            };
        }
    }

    /// Moves every preloaded job whose submit time has arrived into the
    /// waiting queue, recording the admission makespan as its submit time.
    ///
    /// Admitting twice at the same makespan is a no-op: the first pass
    /// drains every due job.
    fn admit_arrivals(&mut self) {
        let makespan = self.state.cluster.makespan();
        loop {
            let due = self
                .state
                .database
                .preloaded_queue
                .first()
                .is_some_and(|job| job.submit_time <= makespan);
            if !due {
                break;
            }
            if let Some(cap) = self.state.cluster.queue_size {
                if self.state.cluster.waiting_queue.len() >= cap {
                    break;
                }
            }
            let Some(mut job) = self.state.database.pop() else {
                break;
            };
            job.submit_time = makespan;

            if !self.state.cluster.fits(&job) && self.warned_unschedulable.insert(job.id) {
                // Reported once; the job stays queued and will deadlock the
                // run unless the policy surfaces it.
                let sig = job.signature();
                warn!(
                    job = %sig,
                    processes = job.processes,
                    capacity = self.state.cluster.total_cores(),
                    "job exceeds cluster capacity and can never be scheduled"
                );
                self.state.logger.log(
                    makespan,
                    self.state.cluster.idle_cores(),
                    LogEvent::SchedulerNote {
                        message: format!("job {sig} exceeds cluster capacity"),
                    },
                );
            }
            self.state.cluster.waiting_queue.push_back(job);
        }
    }

    /// Advances to the next simulated instant: recompute interference,
    /// pick the minimum of the next completion and the next arrival, move
    /// the clock, and clean up everything that finished.
    fn goto_next_sim_state(&mut self) -> Result<(), Error> {
        let full = self.state.cluster.full_socket_allocation().clone();

        let mut execution_list = std::mem::take(&mut self.state.cluster.execution_list);
        let mut min_rem_time = f64::INFINITY;
        for job in execution_list.iter_mut() {
            recompute_speedup(&mut self.state, job, &full);
            min_rem_time = min_rem_time.min(job.remaining_time);
        }
        self.state.cluster.execution_list = execution_list;

        // Preloaded jobs are sorted, so the head carries the next arrival.
        if let Some(next) = self.state.database.preloaded_queue.first() {
            let showup = next.submit_time - self.state.cluster.makespan();
            if showup > 0.0 {
                min_rem_time = min_rem_time.min(showup);
            }
        }

        if min_rem_time <= 0.0 {
            return Err(Error::NoForwardProgress {
                delta: min_rem_time,
            });
        }
        if min_rem_time.is_infinite() {
            if !self.state.cluster.waiting_queue.is_empty()
                || !self.state.database.preloaded_queue.is_empty()
            {
                return Err(self.deadlock_diagnostic());
            }
            return Ok(());
        }

        self.state.cluster.advance(min_rem_time);
        debug!(
            delta = min_rem_time,
            makespan = self.state.cluster.makespan(),
            "advancing the simulated clock"
        );
        self.state.logger.log(
            self.state.cluster.makespan(),
            self.state.cluster.idle_cores(),
            LogEvent::NextTimeStep {
                delta: min_rem_time,
            },
        );

        let execution_list = std::mem::take(&mut self.state.cluster.execution_list);
        let mut still_running = Vec::with_capacity(execution_list.len());
        for mut job in execution_list {
            job.remaining_time -= min_rem_time;
            // Strict equality: the minimum above guarantees the finishing
            // job's subtraction lands on exactly zero.
            if job.remaining_time == 0.0 {
                self.state.clean_job_from_hosts(&mut job)?;
            } else if job.remaining_time < 0.0 {
                return Err(Error::NegativeRemainingTime {
                    job: job.signature().to_string(),
                    remaining: job.remaining_time,
                });
            } else {
                still_running.push(job);
            }
        }
        self.state.cluster.execution_list = still_running;
        Ok(())
    }

    fn deadlock_diagnostic(&self) -> Error {
        fn render<'a>(jobs: impl Iterator<Item = &'a Job>) -> Vec<String> {
            jobs.map(|job| job.signature().to_string()).collect()
        }
        Error::DeadlockDetected {
            preloaded: render(self.state.database.preloaded_queue.iter()),
            waiting: render(self.state.cluster.waiting_queue.iter()),
            executing: render(self.state.cluster.execution_list.iter()),
        }
    }

    /// One simulation step: admit arrivals, let the policy deploy (and
    /// backfill, when enabled), then advance to the next event.
    pub fn step(&mut self) -> Result<(), Error> {
        self.admit_arrivals();

        if !self.state.cluster.waiting_queue.is_empty() {
            let _ = self.scheduler.deploy(&mut self.state)?;
            if self.scheduler.backfill_enabled() {
                let _ = self.scheduler.backfill(&mut self.state)?;
            }
        }

        self.goto_next_sim_state()
    }

    /// Drives the loop until every queue drains, then checks the core
    /// accounting invariant.
    pub fn run(&mut self) -> Result<(), Error> {
        self.setup()?;
        while !self.is_done() {
            self.step()?;
        }
        self.state.cluster.verify_core_accounting()?;
        Ok(())
    }
}

/// Recomputes the applied speedup of a spread-allocated executing job from
/// its current worst neighbor, rescaling the remaining time when the
/// target changes. Compact jobs are exempt and stay at speedup 1: a
/// full-socket allocation leaves no room for a neighbor by construction.
///
/// Unknown pairings fall back to the job's average speedup.
fn recompute_speedup(state: &mut SimState, job: &mut Job, full_shape: &SocketConf) {
    if !job.is_spread(full_shape) {
        return;
    }
    let sig = job.signature();

    let mut neighbors: BTreeSet<JobSig> = BTreeSet::new();
    for host in &job.assigned_hosts {
        for other in state.cluster.host(*host).occupant_sigs() {
            if *other != sig {
                let _ = neighbors.insert(other.clone());
            }
        }
    }

    let target = if neighbors.is_empty() {
        job.max_speedup
    } else {
        neighbors
            .iter()
            .map(|neighbor| {
                state
                    .database
                    .heatmap
                    .speedup(&job.name, &neighbor.name)
                    .unwrap_or(job.avg_speedup)
            })
            .fold(f64::INFINITY, f64::min)
    };

    if target != job.sim_speedup {
        job.remaining_time *= job.sim_speedup / target;
        job.sim_speedup = target;
        state.logger.log(
            state.cluster.makespan(),
            state.cluster.idle_cores(),
            LogEvent::SpeedupChange {
                sig,
                speedup: target,
                remaining: job.remaining_time,
                cojobs: neighbors.into_iter().collect(),
            },
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cosim_model::Heatmap;

    fn shape(cores: &[u32]) -> SocketConf {
        SocketConf::new(cores.iter().copied()).expect("shape")
    }

    fn engine_with(jobs: Vec<Job>, heatmap: Heatmap, nodes: usize, conf: &[u32]) -> ComputeEngine {
        let cluster = Cluster::new(nodes, shape(conf)).expect("cluster");
        ComputeEngine::new(
            Database::new(jobs, heatmap),
            cluster,
            crate::sched::build("fifo", crate::sched::PolicyOptions::default())
                .expect("fifo registered"),
            Logger::new(),
        )
    }

    #[test]
    fn setup_shifts_submits_and_characterizes() {
        let mut heatmap = Heatmap::new();
        heatmap.insert("spread", "x", Some(1.5));
        heatmap.insert("compact", "x", Some(0.5));
        heatmap.insert("robust", "x", Some(1.0));
        heatmap.insert("robust", "y", Some(1.01));
        heatmap.insert("frail", "x", Some(1.2));
        heatmap.insert("frail", "y", Some(0.8));

        let jobs = vec![
            Job::new(0, "spread", 4, 10.0, 100.0, 10.0),
            Job::new(0, "compact", 4, 10.0, 130.0, 10.0),
            Job::new(0, "robust", 4, 10.0, 160.0, 10.0),
            Job::new(0, "frail", 4, 10.0, 190.0, 10.0),
        ];
        let mut engine = engine_with(jobs, heatmap, 2, &[2, 2]);
        engine.setup().expect("setup succeeds");

        let queue = &engine.state().database.preloaded_queue;
        assert_eq!(queue[0].submit_time, 0.0, "earliest submit shifts to zero");
        assert_eq!(queue[1].submit_time, 30.0);
        assert_eq!(queue.iter().map(|j| j.id).collect::<Vec<_>>(), vec![0, 1, 2, 3]);
        assert_eq!(queue[0].character, JobCharacter::Spread);
        assert_eq!(queue[1].character, JobCharacter::Compact);
        assert_eq!(queue[2].character, JobCharacter::Robust);
        assert_eq!(queue[3].character, JobCharacter::Frail);
        assert_eq!(queue[0].full_socket_nodes, 1);
        assert_eq!(queue[0].half_socket_nodes, 2);
    }

    #[test]
    fn missing_heatmap_row_falls_back_to_unit_speedup() {
        let jobs = vec![Job::new(0, "unknown", 4, 10.0, 0.0, 10.0)];
        let mut engine = engine_with(jobs, Heatmap::new(), 1, &[2, 2]);
        engine.setup().expect("setup succeeds");
        let job = &engine.state().database.preloaded_queue[0];
        assert_eq!(job.avg_speedup, 1.0);
        assert_eq!(job.character, JobCharacter::Robust);
    }

    #[test]
    fn admission_at_the_same_makespan_is_idempotent() {
        let jobs = vec![
            Job::new(0, "a", 4, 10.0, 0.0, 10.0),
            Job::new(0, "b", 4, 10.0, 0.0, 10.0),
        ];
        let mut engine = engine_with(jobs, Heatmap::new(), 2, &[2, 2]);
        engine.setup().expect("setup succeeds");

        engine.admit_arrivals();
        assert_eq!(engine.state().cluster.waiting_queue.len(), 2);
        assert!(engine.state().database.preloaded_queue.is_empty());

        engine.admit_arrivals();
        assert_eq!(
            engine.state().cluster.waiting_queue.len(),
            2,
            "a second admission pass at the same makespan changes nothing"
        );
    }

    #[test]
    fn empty_workload_is_rejected_at_setup() {
        let mut engine = engine_with(Vec::new(), Heatmap::new(), 1, &[2, 2]);
        assert!(matches!(engine.setup(), Err(Error::EmptyWorkload)));
    }

    #[test]
    fn speedup_round_trip_restores_remaining_time() {
        let mut heatmap = Heatmap::new();
        heatmap.insert("a", "a", Some(1.0));
        heatmap.insert("a", "b", Some(0.5));
        heatmap.insert("b", "b", Some(1.0));
        heatmap.insert("b", "a", Some(0.5));

        let jobs = vec![
            Job::new(0, "a", 4, 10.0, 0.0, 10.0),
            Job::new(0, "b", 4, 10.0, 0.0, 10.0),
        ];
        let mut engine = engine_with(jobs, heatmap, 1, &[4, 4]);
        engine.setup().expect("setup succeeds");
        engine.admit_arrivals();

        // Place both jobs on the host under the half shape by hand.
        let half = engine.state.cluster.half_socket_allocation().clone();
        for _ in 0..2 {
            let Some(job) = engine.state.cluster.waiting_queue.pop_front() else {
                panic!("two jobs admitted");
            };
            engine
                .state
                .deploy_job_to_hosts(job, &[cosim_model::HostId(0)], &half)
                .expect("host has room");
        }

        let full = engine.state.cluster.full_socket_allocation().clone();
        let mut a = engine.state.cluster.execution_list.remove(0);
        recompute_speedup(&mut engine.state, &mut a, &full);
        assert_eq!(a.sim_speedup, 0.5);
        assert_eq!(a.remaining_time, 20.0);

        // Neighbor leaves at the same makespan; the rescale reverses.
        let mut b = engine.state.cluster.execution_list.remove(0);
        engine
            .state
            .clean_job_from_hosts(&mut b)
            .expect("release succeeds");
        recompute_speedup(&mut engine.state, &mut a, &full);
        assert_eq!(a.sim_speedup, 1.0, "alone again at max speedup");
        assert_eq!(a.remaining_time, 10.0, "remaining time round-trips");
    }

    #[test]
    fn compact_jobs_never_recompute_speedup() {
        let mut heatmap = Heatmap::new();
        heatmap.insert("a", "b", Some(0.5));
        let jobs = vec![Job::new(0, "a", 4, 10.0, 0.0, 10.0)];
        let mut engine = engine_with(jobs, heatmap, 1, &[2, 2]);
        engine.setup().expect("setup succeeds");
        engine.admit_arrivals();

        let full = engine.state.cluster.full_socket_allocation().clone();
        let Some(job) = engine.state.cluster.waiting_queue.pop_front() else {
            panic!("one job admitted");
        };
        engine
            .state
            .deploy_job_to_hosts(job, &[cosim_model::HostId(0)], &full)
            .expect("host has room");

        let mut job = engine.state.cluster.execution_list.remove(0);
        recompute_speedup(&mut engine.state, &mut job, &full);
        assert_eq!(job.sim_speedup, 1.0);
        assert_eq!(job.remaining_time, 10.0);
    }
}

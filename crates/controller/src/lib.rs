// Copyright The CoSim Authors
// SPDX-License-Identifier: Apache-2.0

//! Parallel driver for multi-policy simulation suites.
//!
//! One suite drives several scheduling policies against identical inputs.
//! The parallelism unit is a simulation configuration: every worker thread
//! owns a full `(database, cluster, scheduler, logger, engine)` quintuple
//! built from read-only snapshots of the workload and heatmap, so workers
//! share no mutable state and each run is deterministic. The baseline
//! policy runs on the caller's thread while the workers run the rest;
//! utilization and makespan-speedup comparisons are computed once every
//! simulation has finished.

use std::sync::Arc;
use std::thread;
use std::time::Instant;

use cosim_engine::{ComputeEngine, Logger, PolicyOptions, SimState, build};
use cosim_model::{Cluster, Database, Heatmap, Job, SocketConf};
use tracing::info;

pub mod error;
pub mod progress;
pub mod report;

pub use error::Error;
pub use progress::{NoopReporter, ProgressReporter, TracingReporter};
pub use report::{PolicyReport, SuiteResult};

/// A workload, a cluster shape, and the policies to race against it.
pub struct SimulationSuite {
    jobs: Arc<Vec<Job>>,
    heatmap: Arc<Heatmap>,
    nodes: usize,
    socket_conf: SocketConf,
    queue_size: Option<usize>,
    policies: Vec<(String, PolicyOptions)>,
    baseline: String,
}

impl SimulationSuite {
    /// Builds a suite.
    ///
    /// Fails with [`Error::UnknownBaseline`] when `baseline` is not among
    /// the policy names.
    pub fn new(
        jobs: Vec<Job>,
        heatmap: Heatmap,
        nodes: usize,
        socket_conf: SocketConf,
        queue_size: Option<usize>,
        policies: Vec<(String, PolicyOptions)>,
        baseline: impl Into<String>,
    ) -> Result<Self, Error> {
        let baseline = baseline.into();
        if !policies.iter().any(|(name, _)| *name == baseline) {
            return Err(Error::UnknownBaseline { baseline });
        }
        Ok(Self {
            jobs: Arc::new(jobs),
            heatmap: Arc::new(heatmap),
            nodes,
            socket_conf,
            queue_size,
            policies,
            baseline,
        })
    }

    /// Runs every policy (the baseline on this thread, the rest on worker
    /// threads) and assembles the comparison reports in configuration
    /// order.
    pub fn run(&self, reporter: &dyn ProgressReporter) -> Result<SuiteResult, Error> {
        let mut states: Vec<(String, SimState)> = Vec::with_capacity(self.policies.len());

        thread::scope(|scope| -> Result<(), Error> {
            let mut handles = Vec::new();
            for (name, options) in &self.policies {
                if *name == self.baseline {
                    continue;
                }
                info!(policy = %name, "submitted");
                let builder = thread::Builder::new().name(format!("cosim-{name}"));
                let handle = builder
                    .spawn_scoped(scope, move || self.run_one(name, options.clone(), reporter))
                    .map_err(|e| Error::ThreadSpawn {
                        policy: name.clone(),
                        details: e.to_string(),
                    })?;
                handles.push((name.clone(), handle));
            }

            info!(policy = %self.baseline, "running the baseline on the main thread");
            let baseline_options = self
                .policies
                .iter()
                .find(|(name, _)| *name == self.baseline)
                .map(|(_, options)| options.clone())
                .unwrap_or_default();
            let baseline_state = self.run_one(&self.baseline, baseline_options, reporter)?;
            states.push((self.baseline.clone(), baseline_state));

            for (name, handle) in handles {
                match handle.join() {
                    Ok(Ok(state)) => states.push((name, state)),
                    Ok(Err(e)) => return Err(e),
                    Err(panic) => {
                        return Err(Error::WorkerPanic {
                            policy: name,
                            panic_message: format!("{panic:?}"),
                        });
                    }
                }
            }
            Ok(())
        })?;

        let (baseline_state, baseline_makespan) = {
            let (_, state) = states
                .iter()
                .find(|(name, _)| *name == self.baseline)
                .expect("baseline ran");
            (state, state.cluster.makespan())
        };

        // Reports follow the configured policy order, baseline included.
        let mut reports = Vec::with_capacity(self.policies.len());
        for (name, _) in &self.policies {
            let Some((_, state)) = states.iter().find(|(state_name, _)| state_name == name)
            else {
                continue;
            };
            let baseline = if *name == self.baseline {
                None
            } else {
                Some((baseline_state, baseline_makespan))
            };
            reports.push(PolicyReport::from_state(name, state, baseline));
        }

        Ok(SuiteResult {
            baseline: self.baseline.clone(),
            reports,
        })
    }

    /// Runs one policy's simulation to completion, reporting progress as
    /// whole-percent milestones.
    fn run_one(
        &self,
        policy: &str,
        options: PolicyOptions,
        reporter: &dyn ProgressReporter,
    ) -> Result<SimState, Error> {
        let wrap = |source| Error::Simulation {
            policy: policy.to_owned(),
            source,
        };

        let mut cluster = Cluster::new(self.nodes, self.socket_conf.clone())?;
        cluster.queue_size = self.queue_size;
        let scheduler = build(policy, options).map_err(wrap)?;
        let database = Database::new(self.jobs.as_ref().clone(), self.heatmap.as_ref().clone());
        let mut engine = ComputeEngine::new(database, cluster, scheduler, Logger::new());

        let started = Instant::now();
        engine.setup().map_err(wrap)?;
        let mut last_percent = -1i64;
        while !engine.is_done() {
            engine.step().map_err(wrap)?;
            let percent = (engine.progress() * 100.0).floor() as i64;
            if percent > last_percent {
                reporter.report(policy, percent as f64);
                last_percent = percent;
            }
        }
        engine
            .state()
            .cluster
            .verify_core_accounting()
            .map_err(Error::Model)?;

        reporter.report_times(policy, started.elapsed().as_secs_f64(), engine.makespan());
        Ok(engine.into_state())
    }
}

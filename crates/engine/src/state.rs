// Copyright The CoSim Authors
// SPDX-License-Identifier: Apache-2.0

//! The mutable state of one simulation, owned by the compute engine.
//!
//! Schedulers receive a borrow of this state instead of holding back
//! references to the cluster, database, or logger. The two resource
//! mutation paths, deploy and clean-up, live here; a scheduler's
//! allocation hands its proposal to the deploy path and never touches a
//! host itself.

use cosim_model::{Cluster, Database, HostId, Job, JobState, SocketConf};
use cosim_procset::ProcSet;
use tracing::debug;

use crate::error::Error;
use crate::logger::{LogEvent, Logger};

/// The database, cluster, and logger of one running simulation.
#[derive(Debug)]
pub struct SimState {
    /// The preloaded workload and the interference heatmap.
    pub database: Database,
    /// Hosts, queues, and the wallclock cursor.
    pub cluster: Cluster,
    /// The in-memory trace of the run.
    pub logger: Logger,
    pub(crate) total_jobs: usize,
}

impl SimState {
    /// Bundles the parts of a simulation.
    #[must_use]
    pub fn new(database: Database, cluster: Cluster, logger: Logger) -> Self {
        Self {
            database,
            cluster,
            logger,
            total_jobs: 0,
        }
    }

    /// Deploys a job (already removed from the waiting queue) onto `hosts`
    /// under `shape`: takes the cores per host, updates the idle-core
    /// counter, and appends the job to the execution list.
    ///
    /// Emits `JobStart` once and `JobDeployedToHost` per host.
    pub(crate) fn deploy_job_to_hosts(
        &mut self,
        mut job: Job,
        hosts: &[HostId],
        shape: &SocketConf,
    ) -> Result<(), Error> {
        let makespan = self.cluster.makespan();
        let sig = job.signature();
        debug!(job = %sig, hosts = hosts.len(), "deploying job");

        job.socket_conf = Some(shape.clone());
        job.state = JobState::Executing;
        job.start_time = Some(makespan);

        self.logger.log(
            makespan,
            self.cluster.idle_cores(),
            LogEvent::JobStart {
                sig: sig.clone(),
                submit: job.submit_time,
                start: makespan,
            },
        );

        for id in hosts {
            let held = self.cluster.host_mut(*id).allocate(shape, sig.clone())?;
            let taken: usize = held.iter().map(ProcSet::len).sum();
            self.cluster.charge_cores(taken);
            job.assigned_hosts.push(*id);
            self.logger.log(
                makespan,
                self.cluster.idle_cores(),
                LogEvent::JobDeployedToHost {
                    sig: sig.clone(),
                    host: *id,
                    psets: held,
                },
            );
        }

        self.cluster.execution_list.push(job);
        Ok(())
    }

    /// Cleans a finished job off its hosts: returns every held core,
    /// credits the idle counter, and stamps the finish time.
    ///
    /// Emits `JobCleanedFromHost` per host and `JobFinish` once.
    pub(crate) fn clean_job_from_hosts(&mut self, job: &mut Job) -> Result<(), Error> {
        let makespan = self.cluster.makespan();
        let sig = job.signature();
        debug!(job = %sig, "cleaning job off its hosts");

        job.finish_time = Some(makespan);
        job.state = JobState::Finished;

        for id in std::mem::take(&mut job.assigned_hosts) {
            self.logger.log(
                makespan,
                self.cluster.idle_cores(),
                LogEvent::JobCleanedFromHost {
                    sig: sig.clone(),
                    host: id,
                },
            );
            let released = self.cluster.host_mut(id).release(&sig)?;
            let returned: usize = released.iter().map(ProcSet::len).sum();
            self.cluster.credit_cores(returned);
        }

        self.logger.log(
            makespan,
            self.cluster.idle_cores(),
            LogEvent::JobFinish {
                sig,
                finish: makespan,
            },
        );
        Ok(())
    }
}

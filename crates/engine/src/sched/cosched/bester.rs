// Copyright The CoSim Authors
// SPDX-License-Identifier: Apache-2.0

//! Ranks variant that scores pairings by fit and mutual benefit.

use cosim_model::{Host, Job};

use crate::error::Error;
use crate::sched::cosched::{RankTable, backfill_coscheduled, deploy_coscheduled};
use crate::sched::{HostScore, PolicyOptions, Scheduler};
use crate::state::SimState;

/// Ranks co-scheduler whose host score is the tuple `(points, avg pair
/// speedup)`: a point for pairings that keep fragmentation down, a point
/// for similar-duration pairings with a beneficial average speedup. Idle
/// hosts outrank everything.
pub struct BesterRanks {
    options: PolicyOptions,
    ranks: RankTable,
}

impl BesterRanks {
    /// Builds the policy.
    #[must_use]
    pub fn new(options: PolicyOptions) -> Self {
        Self {
            options,
            ranks: RankTable::default(),
        }
    }
}

impl Scheduler for BesterRanks {
    fn name(&self) -> &'static str {
        "ranks.bester"
    }

    fn description(&self) -> &'static str {
        "Co-scheduler that pairs jobs of matching size and duration with mutual speedup"
    }

    fn setup(&mut self, state: &mut SimState) {
        self.ranks.update(state, self.options.ranks_threshold);
    }

    fn deploy(&mut self, state: &mut SimState) -> Result<bool, Error> {
        let depth = self.options.queue_depth;
        deploy_coscheduled(self, state, depth)
    }

    fn backfill_enabled(&self) -> bool {
        true
    }

    fn backfill(&mut self, state: &mut SimState) -> Result<bool, Error> {
        let depth = self.options.backfill_depth;
        backfill_coscheduled(self, state, depth)
    }

    fn host_alloc_condition(&self, state: &SimState, host: &Host, job: &Job) -> HostScore {
        if host.occupant_count() == 0 {
            return HostScore(f64::INFINITY, f64::INFINITY);
        }

        // Judge the pairing against the host's longest-resident occupant
        // (smallest id keeps the choice deterministic).
        let Some(co_sig) = host.occupant_sigs().min_by_key(|sig| sig.id) else {
            return HostScore::NEUTRAL;
        };
        let Some(co_job) = state
            .cluster
            .execution_list
            .iter()
            .find(|xjob| xjob.id == co_sig.id)
        else {
            return HostScore::NEUTRAL;
        };

        let mut points = 0.0;

        // Equal-size pairings reduce fragmentation while the cluster still
        // has headroom.
        if state.cluster.idle_cores() as f64 > 0.25 * state.cluster.used_cores() as f64
            && f64::from(job.half_socket_nodes) >= f64::from(co_job.half_socket_nodes) / 2.0
        {
            points += 1.0;
        }

        let heatmap = &state.database.heatmap;
        let (Some(sp), Some(co_sp)) = (
            heatmap.speedup(&job.name, &co_job.name),
            heatmap.speedup(&co_job.name, &job.name),
        ) else {
            return HostScore(points, job.avg_speedup);
        };
        let avg_speedup = (sp + co_sp) / 2.0;

        // Similar estimated co-run duration with a beneficial pairing.
        let estimated_rem = co_job.start_time.unwrap_or(0.0) + co_job.wall_time
            - state.cluster.makespan();
        if estimated_rem > 0.0
            && (job.wall_time - estimated_rem).abs() / estimated_rem < 0.2
            && avg_speedup >= 1.0
        {
            points += 1.0;
        }

        HostScore(points, avg_speedup)
    }
}

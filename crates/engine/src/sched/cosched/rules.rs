// Copyright The CoSim Authors
// SPDX-License-Identifier: Apache-2.0

//! Character-based co-scheduling: pairing is a matter of rules, not scores.
//!
//! A spread job pairs with a robust one, and a frail job pairs with a
//! robust one; every other combination forces a compact allocation. The
//! control flow is the shared co-scheduling flow, with the pairing rules
//! applied as a host filter so a forbidden resident vetoes the host.

use cosim_model::{Host, Job, JobCharacter};

use crate::error::Error;
use crate::sched::cosched::{backfill_coscheduled, worst_neighbor_score};
use crate::sched::{HostScore, PolicyOptions, Scheduler, allocation, compact_allocation};
use crate::state::SimState;

/// Whether two characters are allowed to share a host.
#[must_use]
pub fn pairing_allowed(a: JobCharacter, b: JobCharacter) -> bool {
    matches!(
        (a, b),
        (JobCharacter::Spread, JobCharacter::Robust)
            | (JobCharacter::Robust, JobCharacter::Spread)
            | (JobCharacter::Frail, JobCharacter::Robust)
            | (JobCharacter::Robust, JobCharacter::Frail)
    )
}

/// Rules-based co-scheduler.
pub struct Rules {
    options: PolicyOptions,
}

impl Rules {
    /// Builds the policy.
    #[must_use]
    pub fn new(options: PolicyOptions) -> Self {
        Self { options }
    }
}

impl Scheduler for Rules {
    fn name(&self) -> &'static str {
        "rules"
    }

    fn description(&self) -> &'static str {
        "Rules-based co-scheduling driven by job characterization"
    }

    fn deploy(&mut self, state: &mut SimState) -> Result<bool, Error> {
        let depth = self.options.queue_depth.unwrap_or(usize::MAX);
        let half = state.cluster.half_socket_allocation().clone();
        let candidates: Vec<(u64, JobCharacter)> = state
            .cluster
            .waiting_queue
            .iter()
            .take(depth)
            .map(|job| (job.id, job.character))
            .collect();

        let mut deployed = false;
        for (id, character) in candidates {
            let placed = match character {
                // A compact job pairs with nothing.
                JobCharacter::Compact => compact_allocation(self, state, id, false)?,
                _ => {
                    if allocation(self, state, id, &half, false)? {
                        true
                    } else {
                        compact_allocation(self, state, id, false)?
                    }
                }
            };
            if placed {
                deployed = true;
            } else {
                break;
            }
        }
        Ok(deployed)
    }

    fn backfill_enabled(&self) -> bool {
        true
    }

    fn backfill(&mut self, state: &mut SimState) -> Result<bool, Error> {
        let depth = self.options.backfill_depth;
        backfill_coscheduled(self, state, depth)
    }

    fn host_alloc_condition(&self, state: &SimState, host: &Host, job: &Job) -> HostScore {
        worst_neighbor_score(state, host, job)
    }

    fn accepts_host(&self, state: &SimState, host: &Host, job: &Job) -> bool {
        host.occupant_sigs().all(|sig| {
            state
                .cluster
                .execution_list
                .iter()
                .find(|xjob| xjob.id == sig.id)
                .is_none_or(|resident| pairing_allowed(job.character, resident.character))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_robust_pairings_are_allowed() {
        assert!(pairing_allowed(JobCharacter::Spread, JobCharacter::Robust));
        assert!(pairing_allowed(JobCharacter::Robust, JobCharacter::Frail));
        assert!(!pairing_allowed(JobCharacter::Spread, JobCharacter::Spread));
        assert!(!pairing_allowed(JobCharacter::Frail, JobCharacter::Frail));
        assert!(!pairing_allowed(JobCharacter::Compact, JobCharacter::Robust));
        assert!(!pairing_allowed(JobCharacter::Spread, JobCharacter::Frail));
    }
}

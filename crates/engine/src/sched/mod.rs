// Copyright The CoSim Authors
// SPDX-License-Identifier: Apache-2.0

//! The scheduling policy seam.
//!
//! A policy implements [`Scheduler`]: `deploy` and `backfill` drive the
//! waiting queue, while the two scoring hooks (`host_alloc_condition`,
//! `waiting_queue_reorder`) and the `accepts_host` filter parameterize the
//! shared matching logic in this module. Schedulers never mutate hosts
//! directly: [`allocation`] computes a placement proposal and hands it to
//! the engine's deploy path, which owns every resource mutation.

use std::cmp::Ordering;

use cosim_model::{Host, HostAllocation, HostId, HostState, Job, SocketConf};

use crate::error::Error;
use crate::state::SimState;

pub mod conservative;
pub mod cosched;
pub mod easy;
pub mod fifo;

pub use conservative::Conservative;
pub use cosched::bester::BesterRanks;
pub use cosched::filler::FillerRanks;
pub use cosched::jungle::JungleRanks;
pub use cosched::random::RandomRanks;
pub use cosched::rules::Rules;
pub use easy::Easy;
pub use fifo::Fifo;

/// Tunables shared by every policy, passed to the constructor.
#[derive(Debug, Clone)]
pub struct PolicyOptions {
    /// How much of the waiting queue one deploy pass considers
    /// (`None` = the whole queue).
    pub queue_depth: Option<usize>,
    /// How far past the blocked head backfilling reaches.
    pub backfill_depth: usize,
    /// Bidirectional average speedup a pair must exceed to count as a good
    /// pairing in the rank computation.
    pub ranks_threshold: f64,
}

impl Default for PolicyOptions {
    fn default() -> Self {
        Self {
            queue_depth: None,
            backfill_depth: 100,
            ranks_threshold: 1.0,
        }
    }
}

/// A two-component lexicographic host score; bigger is better.
///
/// Scalar scorers leave the second component at zero; the tuple scorers of
/// the co-scheduling variants use both.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HostScore(pub f64, pub f64);

impl HostScore {
    /// The indifferent score.
    pub const NEUTRAL: Self = Self(1.0, 0.0);

    /// Total order over scores (NaN sorts low).
    #[must_use]
    pub fn cmp_score(&self, other: &Self) -> Ordering {
        self.0
            .total_cmp(&other.0)
            .then(self.1.total_cmp(&other.1))
    }
}

/// The capability set every scheduling policy satisfies.
pub trait Scheduler {
    /// Registered policy name.
    fn name(&self) -> &'static str;

    /// One-line description of the policy.
    fn description(&self) -> &'static str;

    /// One-time preparation before the first step (rank computation and the
    /// like). The default does nothing.
    fn setup(&mut self, _state: &mut SimState) {}

    /// Tries to move waiting jobs to the execution list. Returns whether
    /// anything was deployed.
    fn deploy(&mut self, state: &mut SimState) -> Result<bool, Error>;

    /// Whether the engine should invoke [`backfill`](Self::backfill) after
    /// a deploy pass.
    fn backfill_enabled(&self) -> bool {
        false
    }

    /// Tries to move jobs past a blocked head without delaying it. Returns
    /// whether anything was deployed.
    fn backfill(&mut self, _state: &mut SimState) -> Result<bool, Error> {
        Ok(false)
    }

    /// Ranks candidate hosts for a job; higher scores are allocated first.
    fn host_alloc_condition(&self, _state: &SimState, _host: &Host, _job: &Job) -> HostScore {
        HostScore::NEUTRAL
    }

    /// Scores a waiting job for deploy-order sorting; higher goes first.
    fn waiting_queue_reorder(&self, _state: &SimState, _job: &Job) -> f64 {
        1.0
    }

    /// Whether a host may be considered for this job at all. Pairing-rule
    /// policies veto hosts whose residents they must not share with.
    fn accepts_host(&self, _state: &SimState, _host: &Host, _job: &Job) -> bool {
        true
    }
}

/// Scans hosts in cluster order and reserves, on every host where each
/// socket can cover `shape` and the policy accepts the pairing, the first
/// `shape[i]` free cores per socket.
///
/// With `immediate` set, returns as soon as the aggregated cores cover
/// `req_cores`, possibly naming more hosts than strictly necessary;
/// otherwise all hosts are scanned. The flag is true iff the aggregated
/// cores cover the request. The reservations are proposals only; nothing
/// is taken until the engine's deploy applies them.
pub fn find_suitable_nodes(
    sched: &dyn Scheduler,
    state: &SimState,
    req_cores: u32,
    shape: &SocketConf,
    immediate: bool,
    job: &Job,
) -> (Vec<HostAllocation>, bool) {
    let cores_per_host = i64::from(shape.total());
    let mut req = i64::from(req_cores);
    let mut suitable = Vec::new();
    for host in state.cluster.hosts() {
        if host.state() == HostState::Down {
            continue;
        }
        if !sched.accepts_host(state, host, job) {
            continue;
        }
        let Some(psets) = host.preview(shape) else {
            continue;
        };
        req -= cores_per_host;
        suitable.push(HostAllocation {
            host: host.id(),
            psets,
        });
        if immediate && req <= 0 {
            return (suitable, true);
        }
    }
    (suitable, req <= 0)
}

/// Allocates the waiting job with id `job_id` under `shape`.
///
/// Matches resources, sorts candidates by the policy's host score
/// (descending, stable), takes `⌈processes / Σshape⌉` hosts, and hands the
/// proposal to the engine's deploy path. Resource shortfalls are the
/// boolean `false`, never an error.
pub fn allocation(
    sched: &dyn Scheduler,
    state: &mut SimState,
    job_id: u64,
    shape: &SocketConf,
    immediate: bool,
) -> Result<bool, Error> {
    let Some(idx) = state
        .cluster
        .waiting_queue
        .iter()
        .position(|j| j.id == job_id)
    else {
        return Ok(false);
    };
    let job = state.cluster.waiting_queue[idx].clone();

    let (candidates, ok) = find_suitable_nodes(sched, state, job.processes, shape, immediate, &job);
    if !ok {
        return Ok(false);
    }

    let mut scored: Vec<(HostScore, HostId)> = candidates
        .into_iter()
        .map(|proposal| {
            (
                sched.host_alloc_condition(state, state.cluster.host(proposal.host), &job),
                proposal.host,
            )
        })
        .collect();
    scored.sort_by(|a, b| b.0.cmp_score(&a.0));

    let needed = job.processes.div_ceil(shape.total()) as usize;
    if scored.len() < needed {
        return Ok(false);
    }
    let hosts: Vec<HostId> = scored.into_iter().take(needed).map(|(_, id)| id).collect();

    let Some(job) = state.cluster.waiting_queue.remove(idx) else {
        return Ok(false);
    };
    state.deploy_job_to_hosts(job, &hosts, shape)?;
    Ok(true)
}

/// Compact, exclusive allocation: every core of every allocated socket.
pub fn compact_allocation(
    sched: &dyn Scheduler,
    state: &mut SimState,
    job_id: u64,
    immediate: bool,
) -> Result<bool, Error> {
    let shape = state.cluster.full_socket_allocation().clone();
    allocation(sched, state, job_id, &shape, immediate)
}

/// FIFO deploy pass shared by the queueing policies: take the head, try a
/// compact allocation, stop at the first job that does not fit.
pub fn deploy_fifo(
    sched: &dyn Scheduler,
    state: &mut SimState,
    queue_depth: Option<usize>,
) -> Result<bool, Error> {
    let mut budget = queue_depth.unwrap_or(usize::MAX);
    let mut deployed = false;
    while budget > 0 {
        let Some(head) = state.cluster.waiting_queue.front() else {
            break;
        };
        let id = head.id;
        if compact_allocation(sched, state, id, true)? {
            deployed = true;
            budget -= 1;
        } else {
            break;
        }
    }
    Ok(deployed)
}

/// Estimated seconds until an executing job frees its hosts, based on its
/// wall-time bound.
pub(crate) fn wall_clock_eta(job: &Job, makespan: f64) -> f64 {
    job.wall_time + job.start_time.unwrap_or(0.0) - makespan
}

/// Builds a registered policy by name.
///
/// Unknown names are a setup-time input error.
pub fn build(name: &str, options: PolicyOptions) -> Result<Box<dyn Scheduler>, Error> {
    match name {
        "fifo" => Ok(Box::new(Fifo::new(options))),
        "easy" => Ok(Box::new(Easy::new(options))),
        "conservative" => Ok(Box::new(Conservative::new(options))),
        "ranks.random" => Ok(Box::new(RandomRanks::new(options))),
        "ranks.filler" => Ok(Box::new(FillerRanks::new(options))),
        "ranks.bester" => Ok(Box::new(BesterRanks::new(options))),
        "ranks.jungle" => Ok(Box::new(JungleRanks::new(options))),
        "rules" => Ok(Box::new(Rules::new(options))),
        other => Err(Error::UnknownScheduler {
            name: other.to_owned(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn host_scores_order_lexicographically() {
        let high = HostScore(2.0, 0.0);
        let tie_a = HostScore(1.0, 3.0);
        let tie_b = HostScore(1.0, 1.0);
        assert_eq!(high.cmp_score(&tie_a), Ordering::Greater);
        assert_eq!(tie_a.cmp_score(&tie_b), Ordering::Greater);
        assert_eq!(tie_b.cmp_score(&tie_b), Ordering::Equal);
    }

    #[test]
    fn registry_knows_every_policy() {
        for name in [
            "fifo",
            "easy",
            "conservative",
            "ranks.random",
            "ranks.filler",
            "ranks.bester",
            "ranks.jungle",
            "rules",
        ] {
            assert!(build(name, PolicyOptions::default()).is_ok(), "{name}");
        }
        assert!(matches!(
            build("sjf", PolicyOptions::default()),
            Err(Error::UnknownScheduler { .. })
        ));
    }
}

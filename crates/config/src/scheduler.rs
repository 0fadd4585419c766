// Copyright The CoSim Authors
// SPDX-License-Identifier: Apache-2.0

//! Scheduler section of the simulation spec.

use serde::{Deserialize, Serialize};

/// One scheduling policy to drive against the workload.
///
/// `name` selects the policy from the engine's registry (`fifo`, `easy`,
/// `conservative`, `ranks.random`, `ranks.filler`, `ranks.bester`,
/// `ranks.jungle`, `rules`); unknown names are rejected when the policy is
/// built. The remaining fields override the policy's defaults.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchedulerSpec {
    /// Registered policy name.
    pub name: String,
    /// How much of the waiting queue a deploy pass considers
    /// (`None` = the whole queue).
    #[serde(default)]
    pub queue_depth: Option<usize>,
    /// How far past the blocked head backfilling reaches.
    #[serde(default)]
    pub backfill_depth: Option<usize>,
    /// Bidirectional average speedup a pair must exceed to count as a good
    /// pairing in the rank computation.
    #[serde(default)]
    pub ranks_threshold: Option<f64>,
}

/// Whether the named policy places jobs under the half-socket shape.
///
/// Used by validation: co-scheduling halves every socket, so the cluster
/// needs two or more cores per socket.
#[must_use]
pub fn is_coscheduler(name: &str) -> bool {
    name.starts_with("ranks.") || name == "rules"
}

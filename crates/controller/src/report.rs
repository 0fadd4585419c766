// Copyright The CoSim Authors
// SPDX-License-Identifier: Apache-2.0

//! Result documents of a simulation suite.

use serde::Serialize;
use std::collections::BTreeMap;

use cosim_engine::SimState;
use cosim_engine::logger::views::{GanttRow, JobUtilization, Series, WorkloadRow};

/// Everything one policy's simulation produced, ready for export.
#[derive(Debug, Serialize)]
pub struct PolicyReport {
    /// The policy's registered name.
    pub policy: String,
    /// Total simulated seconds from first admission to last completion.
    pub makespan: f64,
    /// `baseline makespan / this makespan` (1.0 for the baseline itself).
    pub makespan_speedup: f64,
    /// Per-job placement rows.
    pub gantt: Vec<GanttRow>,
    /// Idle cores per checkpoint.
    pub unused_cores: Series,
    /// Cumulative finished jobs per checkpoint.
    pub throughput: Series,
    /// Waiting jobs per checkpoint.
    pub waiting_queue: Series,
    /// Per-job comparison against the baseline run (empty for the
    /// baseline itself).
    pub utilization: BTreeMap<String, JobUtilization>,
    /// The run as replayable workload rows.
    pub workload: Vec<WorkloadRow>,
}

impl PolicyReport {
    /// Extracts a report from a finished simulation's state.
    #[must_use]
    pub fn from_state(policy: &str, state: &SimState, baseline: Option<(&SimState, f64)>) -> Self {
        let makespan = state.cluster.makespan();
        let (utilization, makespan_speedup) = match baseline {
            Some((baseline_state, baseline_makespan)) => (
                state.logger.utilization_against(&baseline_state.logger),
                baseline_makespan / makespan,
            ),
            None => (BTreeMap::new(), 1.0),
        };
        Self {
            policy: policy.to_owned(),
            makespan,
            makespan_speedup,
            gantt: state.logger.gantt(),
            unused_cores: state.logger.unused_cores(),
            throughput: state.logger.throughput(),
            waiting_queue: state.logger.waiting_queue_graph(),
            utilization,
            workload: state.logger.workload(),
        }
    }
}

/// The result of driving every configured policy against one workload.
#[derive(Debug, Serialize)]
pub struct SuiteResult {
    /// Name of the policy the others are compared against.
    pub baseline: String,
    /// One report per policy, in configuration order.
    pub reports: Vec<PolicyReport>,
}

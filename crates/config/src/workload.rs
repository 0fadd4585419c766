// Copyright The CoSim Authors
// SPDX-License-Identifier: Apache-2.0

//! Workload section of the simulation spec.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::error::Error;

/// A named job shape the synthetic generators draw from.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobTemplate {
    /// Workload name; must match a heatmap row for interference lookups.
    pub name: String,
    /// Processes the job needs.
    pub processes: u32,
    /// Simulated runtime in seconds.
    pub run_time: f64,
    /// Requested wall time; defaults to the runtime when absent.
    #[serde(default)]
    pub wall_time: Option<f64>,
}

/// Where the workload's jobs come from.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum WorkloadSource {
    /// A Standard Workload Format trace file.
    Swf {
        /// Path to the `.swf` file.
        path: String,
    },
    /// A comma-separated workload export (replays a logged run).
    CsvList {
        /// Path to the CSV file.
        path: String,
    },
    /// `count` jobs drawn uniformly at random from the catalog.
    Random {
        /// Templates to draw from.
        catalog: Vec<JobTemplate>,
        /// Number of jobs to generate.
        count: usize,
    },
    /// Each template repeated by its frequency, then shuffled.
    Frequencies {
        /// Templates to instantiate.
        catalog: Vec<JobTemplate>,
        /// Repetitions per template name.
        frequencies: BTreeMap<String, u32>,
    },
    /// The named templates instantiated in order, optionally shuffled
    /// while keeping the original submit-time sequence.
    Names {
        /// Templates to instantiate.
        catalog: Vec<JobTemplate>,
        /// Template names, one job each, in submit order.
        names: Vec<String>,
        /// Shuffle job order while preserving the submit-time sequence.
        #[serde(default)]
        shuffle: bool,
    },
}

/// How submit times are distributed over the generated jobs.
///
/// Distribution transforms mutate only `submit_time`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DistributionSpec {
    /// A fixed inter-arrival step.
    Constant {
        /// Seconds between consecutive submits.
        time_step: f64,
    },
    /// Uniform random inter-arrival in `[0, time_step)`.
    Uniform {
        /// Upper bound of the inter-arrival draw.
        time_step: f64,
    },
    /// Exponential (Poisson-process) inter-arrival with mean `time_step`.
    Poisson {
        /// Mean seconds between consecutive submits.
        time_step: f64,
    },
}

/// The workload: a source of jobs plus an optional arrival distribution.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkloadSpec {
    /// Where the jobs come from.
    pub source: WorkloadSource,
    /// Optional submit-time transform applied after generation.
    #[serde(default)]
    pub distribution: Option<DistributionSpec>,
    /// Seed for every random draw; a fixed default keeps runs reproducible.
    #[serde(default)]
    pub seed: Option<u64>,
}

impl WorkloadSpec {
    pub(crate) fn validate(&self, errors: &mut Vec<Error>) {
        match &self.source {
            WorkloadSource::Swf { .. } | WorkloadSource::CsvList { .. } => {}
            WorkloadSource::Random { catalog, count } => {
                if catalog.is_empty() {
                    errors.push(Error::EmptyCatalog);
                }
                if *count == 0 {
                    errors.push(Error::EmptyWorkload);
                }
            }
            WorkloadSource::Frequencies {
                catalog,
                frequencies,
            } => {
                if catalog.is_empty() {
                    errors.push(Error::EmptyCatalog);
                }
                if frequencies.values().all(|f| *f == 0) {
                    errors.push(Error::EmptyWorkload);
                }
            }
            WorkloadSource::Names { catalog, names, .. } => {
                if catalog.is_empty() {
                    errors.push(Error::EmptyCatalog);
                }
                if names.is_empty() {
                    errors.push(Error::EmptyWorkload);
                }
            }
        }
    }
}

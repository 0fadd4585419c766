// Copyright The CoSim Authors
// SPDX-License-Identifier: Apache-2.0

//! Derived views over a finished simulation's trace.
//!
//! Every view is a pure function over the recorded state and returns
//! neutral, serializable data; rendering is a downstream concern.

use serde::Serialize;
use std::collections::BTreeMap;

use super::Logger;

/// One Gantt row: where and when a job ran.
#[derive(Debug, Clone, Serialize)]
pub struct GanttRow {
    /// The job signature (`id:name`).
    pub job: String,
    /// Admission time.
    pub submit: f64,
    /// Deploy time.
    pub start: f64,
    /// Clean-up time.
    pub finish: f64,
    /// `start - submit`.
    pub waiting: f64,
    /// Requested processes.
    pub processes: u32,
    /// Hosts the job ran on, rendered `host{n}`.
    pub hosts: Vec<String>,
    /// Contiguous core intervals held, as inclusive `(lo, hi)` pairs.
    pub intervals: Vec<(u32, u32)>,
}

/// A checkpointed counter series.
#[derive(Debug, Clone, Serialize)]
pub struct Series {
    /// Checkpoint times in seconds, sorted.
    pub checkpoints: Vec<f64>,
    /// The counter value at each checkpoint.
    pub values: Vec<usize>,
}

/// One row of the Standard Workload Format subset export.
#[derive(Debug, Clone, Serialize)]
pub struct WorkloadRow {
    /// Job number.
    pub job: u64,
    /// Submit time.
    pub submit: f64,
    /// Waiting time.
    pub wait: f64,
    /// Actual run time (`finish - start`).
    pub run: f64,
    /// Processors the job actually held.
    pub allocated_procs: usize,
    /// Processors the job requested.
    pub req_procs: u32,
    /// Requested wall time.
    pub req_time: f64,
    /// Completion status; always 1 (finished) for a completed run.
    pub status: u32,
    /// The workload name.
    pub name: String,
}

/// Per-job comparison against a baseline run of the same workload.
#[derive(Debug, Clone, Serialize)]
pub struct JobUtilization {
    /// `baseline run time / this run time`.
    pub speedup: f64,
    /// `baseline turnaround / this turnaround`.
    pub turnaround_ratio: f64,
    /// `baseline waiting - this waiting`.
    pub waiting_delta: f64,
}

impl Logger {
    /// Per-job placement rows, sorted by job id.
    #[must_use]
    pub fn gantt(&self) -> Vec<GanttRow> {
        let mut rows: Vec<GanttRow> = self
            .records()
            .iter()
            .map(|(sig, record)| GanttRow {
                job: sig.to_string(),
                submit: record.submit,
                start: record.start,
                finish: record.finish,
                waiting: record.waiting,
                processes: record.processes,
                hosts: record.hosts.iter().map(ToString::to_string).collect(),
                intervals: record
                    .assigned_procs
                    .intervals()
                    .map(|run| (run.lo(), run.hi() - 1))
                    .collect(),
            })
            .collect();
        rows.sort_by_key(|row| {
            row.job
                .split(':')
                .next()
                .and_then(|id| id.parse::<u64>().ok())
                .unwrap_or(u64::MAX)
        });
        rows
    }

    /// Jobs waiting (`submit ≤ t < start`) at each checkpoint.
    #[must_use]
    pub fn waiting_queue_graph(&self) -> Series {
        let (checkpoints, _, _) = self.checkpoint_trace();
        let values = checkpoints
            .iter()
            .map(|t| {
                self.records()
                    .values()
                    .filter(|record| record.submit <= *t && record.start > *t)
                    .count()
            })
            .collect();
        Series {
            checkpoints: checkpoints.to_vec(),
            values,
        }
    }

    /// Cumulative finished jobs at each checkpoint.
    #[must_use]
    pub fn throughput(&self) -> Series {
        let (checkpoints, _, finished) = self.checkpoint_trace();
        Series {
            checkpoints: checkpoints.to_vec(),
            values: finished.to_vec(),
        }
    }

    /// Idle cores at each checkpoint.
    #[must_use]
    pub fn unused_cores(&self) -> Series {
        let (checkpoints, unused, _) = self.checkpoint_trace();
        Series {
            checkpoints: checkpoints.to_vec(),
            values: unused.to_vec(),
        }
    }

    /// The run as Standard Workload Format subset rows.
    #[must_use]
    pub fn workload(&self) -> Vec<WorkloadRow> {
        self.records()
            .iter()
            .map(|(sig, record)| WorkloadRow {
                job: sig.id,
                submit: record.submit,
                wait: record.waiting,
                run: record.finish - record.start,
                allocated_procs: record.assigned_procs.len(),
                req_procs: record.processes,
                req_time: record.wall_time,
                status: 1,
                name: sig.name.clone(),
            })
            .collect()
    }

    /// The workload export in the comma-separated column layout the
    /// `csv_list` importer replays.
    #[must_use]
    pub fn workload_csv(&self) -> String {
        let mut out = String::from(
            "Job Number,Submit Time,Wait Time,Run Time,\
             Number of Allocated Processors,Average CPU Time Used,Used Memory,\
             Requested Number of Processors,Requested Time,Requested Memory,\
             Status,User ID,Group ID,Executable Number,\
             Queue Number,Partition Number,Preceding Job Number,Think Time from Preceding Job\n",
        );
        for row in self.workload() {
            out.push_str(&format!(
                "{},{},{},{},{},,,{},{},,{},,,{},,,,\n",
                row.job,
                row.submit,
                row.wait,
                row.run,
                row.allocated_procs,
                row.req_procs,
                row.req_time,
                row.status,
                row.name,
            ));
        }
        out
    }

    /// Per-job utilization metrics against a baseline run of the same
    /// workload (commonly the default scheduler's logger).
    #[must_use]
    pub fn utilization_against(&self, baseline: &Logger) -> BTreeMap<String, JobUtilization> {
        self.records()
            .iter()
            .filter_map(|(sig, record)| {
                let base = baseline.records().get(sig)?;
                Some((
                    sig.to_string(),
                    JobUtilization {
                        speedup: (base.finish - base.start) / (record.finish - record.start),
                        turnaround_ratio: (base.finish - base.submit)
                            / (record.finish - record.submit),
                        waiting_delta: base.waiting - record.waiting,
                    },
                ))
            })
            .collect()
    }
}

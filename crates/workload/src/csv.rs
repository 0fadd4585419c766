// Copyright The CoSim Authors
// SPDX-License-Identifier: Apache-2.0

//! Comma-separated workload replay.
//!
//! Reads the logger's workload export (a header line followed by the
//! SWF-subset columns, comma-separated) so a recorded run can be replayed
//! against a different policy. Rows with too few columns are skipped, the
//! way hand-edited exports tend to end with a stray line.

use cosim_model::Job;

use crate::error::Error;

// 0-based columns of the exported workload rows.
const JOB_NUMBER: usize = 0;
const SUBMIT_TIME: usize = 1;
const RUN_TIME: usize = 3;
const REQUESTED_PROCESSORS: usize = 7;
const REQUESTED_TIME: usize = 8;
const EXECUTABLE: usize = 13;
const COLUMNS: usize = 18;

/// Parses an exported workload document (header line included).
pub fn parse_csv(text: &str, origin: &str) -> Result<Vec<Job>, Error> {
    let mut jobs = Vec::new();
    for line in text.lines().skip(1) {
        let fields: Vec<&str> = line.split(',').collect();
        if fields.len() < COLUMNS {
            continue;
        }
        let num = |idx: usize| fields[idx].trim().parse::<f64>().unwrap_or(0.0);
        let job = Job::new(
            num(JOB_NUMBER) as u64,
            fields[EXECUTABLE].trim().to_owned(),
            num(REQUESTED_PROCESSORS) as u32,
            num(RUN_TIME),
            num(SUBMIT_TIME),
            num(REQUESTED_TIME),
        );
        jobs.push(job);
    }
    if jobs.is_empty() {
        return Err(Error::EmptyWorkload {
            path: origin.to_owned(),
        });
    }
    Ok(jobs)
}

/// Reads and parses an exported workload file.
pub fn import_csv_file(path: &str) -> Result<Vec<Job>, Error> {
    let text = std::fs::read_to_string(path).map_err(|e| Error::FileReadError {
        path: path.to_owned(),
        details: e.to_string(),
    })?;
    parse_csv(&text, path)
}

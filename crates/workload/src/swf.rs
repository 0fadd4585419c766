// Copyright The CoSim Authors
// SPDX-License-Identifier: Apache-2.0

//! Standard Workload Format import.
//!
//! SWF traces are whitespace-separated records, one job per line, with `;`
//! comment lines. The importer reads the fields the simulator needs:
//! submit time, run time, requested processors, requested time, and the
//! executable number, which becomes the job's workload name.

use cosim_model::Job;

use crate::error::Error;

// 0-based SWF column indices.
const JOB_NUMBER: usize = 0;
const SUBMIT_TIME: usize = 1;
const RUN_TIME: usize = 3;
const REQUESTED_PROCESSORS: usize = 7;
const REQUESTED_TIME: usize = 8;
const EXECUTABLE_NUMBER: usize = 13;

/// Parses one SWF record line.
fn parse_record(line: &str, line_no: usize) -> Result<Job, Error> {
    let fields: Vec<&str> = line.split_whitespace().collect();
    if fields.len() <= EXECUTABLE_NUMBER {
        return Err(Error::MalformedSwfLine {
            line: line_no,
            details: format!(
                "expected at least {} fields, found {}",
                EXECUTABLE_NUMBER + 1,
                fields.len()
            ),
        });
    }
    let num = |idx: usize, what: &str| {
        fields[idx]
            .parse::<f64>()
            .map_err(|e| Error::MalformedSwfLine {
                line: line_no,
                details: format!("field {idx} ({what}): {e}"),
            })
    };

    let id = num(JOB_NUMBER, "job number")? as u64;
    let submit = num(SUBMIT_TIME, "submit time")?;
    let run = num(RUN_TIME, "run time")?;
    let processes = num(REQUESTED_PROCESSORS, "requested processors")? as u32;
    let wall = num(REQUESTED_TIME, "requested time")?;
    let name = fields[EXECUTABLE_NUMBER].to_owned();

    Ok(Job::new(id, name, processes, run, submit, wall))
}

/// Parses a whole SWF document.
pub fn parse_swf(text: &str, origin: &str) -> Result<Vec<Job>, Error> {
    let mut jobs = Vec::new();
    for (idx, line) in text.lines().enumerate() {
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with(';') {
            continue;
        }
        jobs.push(parse_record(trimmed, idx + 1)?);
    }
    if jobs.is_empty() {
        return Err(Error::EmptyWorkload {
            path: origin.to_owned(),
        });
    }
    Ok(jobs)
}

/// Reads and parses an SWF trace file.
pub fn import_swf_file(path: &str) -> Result<Vec<Job>, Error> {
    let text = std::fs::read_to_string(path).map_err(|e| Error::FileReadError {
        path: path.to_owned(),
        details: e.to_string(),
    })?;
    parse_swf(&text, path)
}

#[cfg(test)]
mod tests {
    use super::*;

    const TRACE: &str = "\
; UnixStartTime: 0
; MaxNodes: 8
1 0 0 100 4 -1 -1 4 120 -1 1 1 1 7 -1 -1 -1 -1
2 30 0 50 8 -1 -1 8 60 -1 1 1 1 9 -1 -1 -1 -1
";

    #[test]
    fn comments_are_skipped_and_fields_mapped() {
        let jobs = parse_swf(TRACE, "trace.swf").expect("trace parses");
        assert_eq!(jobs.len(), 2);
        assert_eq!(jobs[0].id, 1);
        assert_eq!(jobs[0].name, "7");
        assert_eq!(jobs[0].processes, 4);
        assert_eq!(jobs[0].remaining_time, 100.0);
        assert_eq!(jobs[0].wall_time, 120.0);
        assert_eq!(jobs[1].submit_time, 30.0);
    }

    #[test]
    fn short_record_is_rejected_with_its_line_number() {
        let err = parse_swf("1 0 0 100\n", "x.swf").unwrap_err();
        match err {
            Error::MalformedSwfLine { line, .. } => assert_eq!(line, 1),
            other => panic!("expected malformed line, got: {other:?}"),
        }
    }

    #[test]
    fn comment_only_trace_is_empty() {
        assert!(matches!(
            parse_swf("; nothing here\n", "x.swf"),
            Err(Error::EmptyWorkload { .. })
        ));
    }
}

// Copyright The CoSim Authors
// SPDX-License-Identifier: Apache-2.0

//! Errors for the workload crate.

/// Errors that can occur while importing or generating a workload.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// A workload file could not be read.
    #[error("file read error for `{path}`: {details}")]
    FileReadError {
        /// The path that failed to read.
        path: String,
        /// A description of the I/O failure.
        details: String,
    },

    /// A Standard Workload Format line did not parse.
    #[error("malformed SWF record at line {line}: {details}")]
    MalformedSwfLine {
        /// 1-based line number in the trace file.
        line: usize,
        /// A description of the parse failure.
        details: String,
    },

    /// The imported trace produced no jobs.
    #[error("workload `{path}` contains no job records")]
    EmptyWorkload {
        /// The file that was imported.
        path: String,
    },

    /// A generator referenced a template name missing from the catalog.
    #[error("unknown job template `{name}`")]
    UnknownTemplate {
        /// The missing template name.
        name: String,
    },
}

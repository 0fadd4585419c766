// Copyright The CoSim Authors
// SPDX-License-Identifier: Apache-2.0

//! Errors for the procset crate.

/// Errors that can occur while building a processor set.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// An interval was given with a lower bound above its upper bound.
    #[error("invalid interval: {lo}-{hi} (lower bound above upper bound)")]
    InvalidInterval {
        /// The lower bound of the offending interval.
        lo: u32,
        /// The upper bound of the offending interval.
        hi: u32,
    },

    /// A textual interval could not be parsed.
    #[error("malformed interval token `{token}`")]
    Malformed {
        /// The token that failed to parse.
        token: String,
    },
}

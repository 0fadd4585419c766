// Copyright The CoSim Authors
// SPDX-License-Identifier: Apache-2.0

//! Cluster shape section of the simulation spec.

use serde::{Deserialize, Serialize};

use crate::error::Error;

/// The simulated cluster: identical nodes with a shared socket shape.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClusterSpec {
    /// Number of nodes.
    pub nodes: usize,
    /// Ordered core count per socket, e.g. `[16, 16]`.
    pub socket_conf: Vec<u32>,
    /// Optional cap on the waiting queue (`None` = unbounded).
    #[serde(default)]
    pub queue_size: Option<usize>,
}

impl ClusterSpec {
    pub(crate) fn validate(&self, errors: &mut Vec<Error>) {
        if self.nodes == 0 {
            errors.push(Error::NoNodes);
        }
        if self.socket_conf.is_empty() {
            errors.push(Error::EmptySocketConf);
        }
        for (socket, cores) in self.socket_conf.iter().enumerate() {
            if *cores == 0 {
                errors.push(Error::ZeroCoreSocket { socket });
            }
        }
    }
}

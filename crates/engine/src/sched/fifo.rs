// Copyright The CoSim Authors
// SPDX-License-Identifier: Apache-2.0

//! First-come-first-served scheduling.

use crate::error::Error;
use crate::sched::{PolicyOptions, Scheduler, deploy_fifo};
use crate::state::SimState;

/// FIFO: compact-allocate the head of the waiting queue until the first
/// job that does not fit.
pub struct Fifo {
    options: PolicyOptions,
}

impl Fifo {
    /// Builds the policy.
    #[must_use]
    pub fn new(options: PolicyOptions) -> Self {
        Self { options }
    }
}

impl Scheduler for Fifo {
    fn name(&self) -> &'static str {
        "fifo"
    }

    fn description(&self) -> &'static str {
        "First in, first out / first come, first served scheduling policy"
    }

    fn deploy(&mut self, state: &mut SimState) -> Result<bool, Error> {
        let depth = self.options.queue_depth;
        deploy_fifo(self, state, depth)
    }
}

// Copyright The CoSim Authors
// SPDX-License-Identifier: Apache-2.0

//! Preloaded workload plus the interference table of one simulation.

use crate::{Heatmap, Job, SpeedupPredictor};

/// The preloaded job queue and the heatmap a simulation reads from.
///
/// The heatmap is filled exactly once, either supplied up front or
/// populated by an attached [`SpeedupPredictor`] at [`setup`](Self::setup),
/// and treated as immutable for the duration of the simulation.
pub struct Database {
    /// Jobs not yet admitted, sorted by submit time at engine setup.
    pub preloaded_queue: Vec<Job>,
    /// The pairwise interference table.
    pub heatmap: Heatmap,
    predictor: Option<Box<dyn SpeedupPredictor>>,
}

impl std::fmt::Debug for Database {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Database")
            .field("preloaded", &self.preloaded_queue.len())
            .field("has_predictor", &self.predictor.is_some())
            .finish()
    }
}

impl Database {
    /// Builds a database from a workload and a prefilled heatmap.
    #[must_use]
    pub fn new(jobs_set: Vec<Job>, heatmap: Heatmap) -> Self {
        Self {
            preloaded_queue: jobs_set,
            heatmap,
            predictor: None,
        }
    }

    /// Attaches an inference engine used to fill an empty heatmap.
    #[must_use]
    pub fn with_predictor(mut self, predictor: Box<dyn SpeedupPredictor>) -> Self {
        self.predictor = Some(predictor);
        self
    }

    /// Removes and returns the head of the preloaded queue.
    pub fn pop(&mut self) -> Option<Job> {
        if self.preloaded_queue.is_empty() {
            None
        } else {
            Some(self.preloaded_queue.remove(0))
        }
    }

    /// Populates the heatmap for every unordered pair of preloaded jobs by
    /// querying the predictor in both directions with the concatenation of
    /// the two jobs' feature tags.
    ///
    /// A no-op unless a predictor is attached and the heatmap is empty.
    pub fn setup(&mut self) {
        let Some(predictor) = self.predictor.as_deref() else {
            return;
        };
        if !self.heatmap.is_empty() {
            return;
        }
        for job in &self.preloaded_queue {
            self.heatmap.ensure_row(&job.name);
        }
        for (i, job) in self.preloaded_queue.iter().enumerate() {
            for co_job in &self.preloaded_queue[i + 1..] {
                let mut tags = job.tags.clone();
                tags.extend(co_job.tags.iter().cloned());
                self.heatmap
                    .insert(&job.name, &co_job.name, predictor.predict(&tags));

                let mut co_tags = co_job.tags.clone();
                co_tags.extend(job.tags.iter().cloned());
                self.heatmap
                    .insert(&co_job.name, &job.name, predictor.predict(&co_tags));
            }
        }
    }
}

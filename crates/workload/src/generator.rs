// Copyright The CoSim Authors
// SPDX-License-Identifier: Apache-2.0

//! Synthetic job generators over a template catalog.
//!
//! Every generator produces the same [`Job`] shape the importers do, and
//! is deterministic given the caller's seeded RNG.

use rand::RngExt;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use std::collections::BTreeMap;
use std::collections::HashMap;

use cosim_config::JobTemplate;
use cosim_model::Job;

use crate::error::Error;

/// A source of jobs: a trace importer or a synthetic generator.
pub trait WorkloadGenerator {
    /// Human-readable generator name, used in setup diagnostics.
    fn name(&self) -> &'static str;

    /// Produces the job set. All randomness is drawn from `rng` so a
    /// seeded run is reproducible.
    fn generate_jobs_set(&self, rng: &mut StdRng) -> Result<Vec<Job>, Error>;
}

fn instantiate(id: u64, template: &JobTemplate) -> Job {
    let wall = template.wall_time.unwrap_or(template.run_time);
    let mut job = Job::new(
        id,
        template.name.clone(),
        template.processes,
        template.run_time,
        0.0,
        wall,
    );
    job.tags = vec![template.name.clone()];
    job
}

fn catalog_index(catalog: &[JobTemplate]) -> HashMap<&str, &JobTemplate> {
    catalog
        .iter()
        .map(|template| (template.name.as_str(), template))
        .collect()
}

/// `count` jobs drawn uniformly at random from the catalog.
pub struct RandomFromCatalog {
    /// Templates to draw from.
    pub catalog: Vec<JobTemplate>,
    /// Number of jobs to produce.
    pub count: usize,
}

impl WorkloadGenerator for RandomFromCatalog {
    fn name(&self) -> &'static str {
        "random"
    }

    fn generate_jobs_set(&self, rng: &mut StdRng) -> Result<Vec<Job>, Error> {
        let mut jobs = Vec::with_capacity(self.count);
        for id in 0..self.count {
            let template = &self.catalog[rng.random_range(0..self.catalog.len())];
            jobs.push(instantiate(id as u64, template));
        }
        Ok(jobs)
    }
}

/// Each template repeated by its configured frequency, then shuffled.
pub struct FrequencyCatalog {
    /// Templates to instantiate.
    pub catalog: Vec<JobTemplate>,
    /// Repetitions per template name.
    pub frequencies: BTreeMap<String, u32>,
}

impl WorkloadGenerator for FrequencyCatalog {
    fn name(&self) -> &'static str {
        "frequencies"
    }

    fn generate_jobs_set(&self, rng: &mut StdRng) -> Result<Vec<Job>, Error> {
        let index = catalog_index(&self.catalog);
        let mut jobs = Vec::new();
        for (name, freq) in &self.frequencies {
            let template = index
                .get(name.as_str())
                .ok_or_else(|| Error::UnknownTemplate { name: name.clone() })?;
            for _ in 0..*freq {
                jobs.push(instantiate(jobs.len() as u64, template));
            }
        }
        jobs.shuffle(rng);
        Ok(jobs)
    }
}

/// The named templates instantiated in order, one job each.
pub struct NamesCatalog {
    /// Templates to instantiate.
    pub catalog: Vec<JobTemplate>,
    /// Template names in submit order.
    pub names: Vec<String>,
    /// Shuffle the job order while keeping ids stable.
    pub shuffle: bool,
}

impl WorkloadGenerator for NamesCatalog {
    fn name(&self) -> &'static str {
        "names"
    }

    fn generate_jobs_set(&self, rng: &mut StdRng) -> Result<Vec<Job>, Error> {
        let index = catalog_index(&self.catalog);
        let mut jobs = Vec::with_capacity(self.names.len());
        for (id, name) in self.names.iter().enumerate() {
            let template = index
                .get(name.as_str())
                .ok_or_else(|| Error::UnknownTemplate { name: name.clone() })?;
            jobs.push(instantiate(id as u64, template));
        }
        if self.shuffle {
            jobs.shuffle(rng);
        }
        Ok(jobs)
    }
}

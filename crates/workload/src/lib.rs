// Copyright The CoSim Authors
// SPDX-License-Identifier: Apache-2.0

//! Workload construction for the simulator.
//!
//! A workload is built in two steps: a [`WorkloadGenerator`] produces the
//! job set (from a trace file or a synthetic catalog), then an optional
//! [`DistributionTransform`] rewrites the submit times. Both steps draw
//! every random number from one seeded RNG, so a `(spec, seed)` pair always
//! produces the same workload, which is the contract the parallel driver
//! relies on.

use rand::SeedableRng;
use rand::rngs::StdRng;

use cosim_config::{DistributionSpec, WorkloadSource, WorkloadSpec};
use cosim_model::Job;

pub mod csv;
pub mod distribution;
pub mod error;
pub mod generator;
pub mod swf;

pub use distribution::{
    ConstantDistribution, DistributionTransform, PoissonDistribution, UniformDistribution,
};
pub use error::Error;
pub use generator::{FrequencyCatalog, NamesCatalog, RandomFromCatalog, WorkloadGenerator};

/// Seed used when the spec leaves `seed` unset.
pub const DEFAULT_SEED: u64 = 0x0c05_1a1b;

struct SwfImporter {
    path: String,
}

impl WorkloadGenerator for SwfImporter {
    fn name(&self) -> &'static str {
        "swf"
    }

    fn generate_jobs_set(&self, _rng: &mut StdRng) -> Result<Vec<Job>, Error> {
        swf::import_swf_file(&self.path)
    }
}

struct CsvImporter {
    path: String,
}

impl WorkloadGenerator for CsvImporter {
    fn name(&self) -> &'static str {
        "csv_list"
    }

    fn generate_jobs_set(&self, _rng: &mut StdRng) -> Result<Vec<Job>, Error> {
        csv::import_csv_file(&self.path)
    }
}

/// Builds the generator a workload source describes.
#[must_use]
pub fn generator_for(source: &WorkloadSource) -> Box<dyn WorkloadGenerator> {
    match source {
        WorkloadSource::Swf { path } => Box::new(SwfImporter { path: path.clone() }),
        WorkloadSource::CsvList { path } => Box::new(CsvImporter { path: path.clone() }),
        WorkloadSource::Random { catalog, count } => Box::new(RandomFromCatalog {
            catalog: catalog.clone(),
            count: *count,
        }),
        WorkloadSource::Frequencies {
            catalog,
            frequencies,
        } => Box::new(FrequencyCatalog {
            catalog: catalog.clone(),
            frequencies: frequencies.clone(),
        }),
        WorkloadSource::Names {
            catalog,
            names,
            shuffle,
        } => Box::new(NamesCatalog {
            catalog: catalog.clone(),
            names: names.clone(),
            shuffle: *shuffle,
        }),
    }
}

/// Builds the transform a distribution spec describes.
#[must_use]
pub fn transform_for(spec: &DistributionSpec) -> Box<dyn DistributionTransform> {
    match spec {
        DistributionSpec::Constant { time_step } => Box::new(ConstantDistribution {
            time_step: *time_step,
        }),
        DistributionSpec::Uniform { time_step } => Box::new(UniformDistribution {
            time_step: *time_step,
        }),
        DistributionSpec::Poisson { time_step } => Box::new(PoissonDistribution {
            time_step: *time_step,
        }),
    }
}

/// Produces the workload a spec describes: generate, then distribute
/// submit times. Deterministic for a fixed spec.
pub fn build_jobs(spec: &WorkloadSpec) -> Result<Vec<Job>, Error> {
    let mut rng = StdRng::seed_from_u64(spec.seed.unwrap_or(DEFAULT_SEED));
    let mut jobs = generator_for(&spec.source).generate_jobs_set(&mut rng)?;
    if let Some(distribution) = &spec.distribution {
        transform_for(distribution).apply(&mut jobs, &mut rng);
    }
    Ok(jobs)
}

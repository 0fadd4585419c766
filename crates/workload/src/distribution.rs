// Copyright The CoSim Authors
// SPDX-License-Identifier: Apache-2.0

//! Submit-time distribution transforms.
//!
//! A transform mutates only `submit_time`; job order, demands, and runtimes
//! are untouched. The compute engine later shifts the whole workload so the
//! earliest submit lands at zero.

use rand::RngExt;
use rand::rngs::StdRng;

use cosim_model::Job;

/// A submit-time transform over a generated job set.
pub trait DistributionTransform {
    /// Human-readable distribution name.
    fn name(&self) -> &'static str;

    /// Rewrites the submit times of `jobs` in place.
    fn apply(&self, jobs: &mut [Job], rng: &mut StdRng);
}

/// Fixed inter-arrival step starting from the first job's submit time.
pub struct ConstantDistribution {
    /// Seconds between consecutive submits.
    pub time_step: f64,
}

impl DistributionTransform for ConstantDistribution {
    fn name(&self) -> &'static str {
        "constant"
    }

    fn apply(&self, jobs: &mut [Job], _rng: &mut StdRng) {
        let Some(first) = jobs.first() else { return };
        let mut submit = first.submit_time;
        for job in jobs {
            job.submit_time = submit;
            submit += self.time_step;
        }
    }
}

/// Uniform random inter-arrival in `[0, time_step)`.
pub struct UniformDistribution {
    /// Upper bound of each inter-arrival draw.
    pub time_step: f64,
}

impl DistributionTransform for UniformDistribution {
    fn name(&self) -> &'static str {
        "uniform"
    }

    fn apply(&self, jobs: &mut [Job], rng: &mut StdRng) {
        let mut submit = rng.random::<f64>() * self.time_step;
        for job in jobs {
            job.submit_time = submit;
            submit += rng.random::<f64>() * self.time_step;
        }
    }
}

/// Exponential (Poisson-process) inter-arrival with mean `time_step`.
pub struct PoissonDistribution {
    /// Mean seconds between consecutive submits.
    pub time_step: f64,
}

impl PoissonDistribution {
    fn draw(&self, rng: &mut StdRng) -> f64 {
        // Inverse-CDF sampling; 1 - u keeps the argument strictly positive.
        -(1.0 - rng.random::<f64>()).ln() * self.time_step
    }
}

impl DistributionTransform for PoissonDistribution {
    fn name(&self) -> &'static str {
        "poisson"
    }

    fn apply(&self, jobs: &mut [Job], rng: &mut StdRng) {
        let mut submit = self.draw(rng);
        for job in jobs {
            job.submit_time = submit;
            submit += self.draw(rng);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    fn jobs(n: usize) -> Vec<Job> {
        (0..n)
            .map(|i| Job::new(i as u64, format!("j{i}"), 4, 10.0, 0.0, 10.0))
            .collect()
    }

    #[test]
    fn constant_spaces_submits_evenly() {
        let mut set = jobs(4);
        ConstantDistribution { time_step: 30.0 }.apply(&mut set, &mut StdRng::seed_from_u64(0));
        let submits: Vec<f64> = set.iter().map(|j| j.submit_time).collect();
        assert_eq!(submits, vec![0.0, 30.0, 60.0, 90.0]);
    }

    #[test]
    fn random_distributions_are_monotone_and_seeded() {
        for transform in [
            Box::new(UniformDistribution { time_step: 10.0 }) as Box<dyn DistributionTransform>,
            Box::new(PoissonDistribution { time_step: 10.0 }),
        ] {
            let mut a = jobs(8);
            let mut b = jobs(8);
            transform.apply(&mut a, &mut StdRng::seed_from_u64(5));
            transform.apply(&mut b, &mut StdRng::seed_from_u64(5));
            for (x, y) in a.iter().zip(b.iter()) {
                assert_eq!(x.submit_time, y.submit_time, "{} not seeded", transform.name());
            }
            for pair in a.windows(2) {
                assert!(pair[0].submit_time <= pair[1].submit_time);
            }
        }
    }

    #[test]
    fn transforms_touch_only_submit_time() {
        let mut set = jobs(3);
        PoissonDistribution { time_step: 5.0 }.apply(&mut set, &mut StdRng::seed_from_u64(1));
        assert!(set.iter().all(|j| j.remaining_time == 10.0));
        assert!(set.iter().all(|j| j.wall_time == 10.0));
    }
}

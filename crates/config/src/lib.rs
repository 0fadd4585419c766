// Copyright The CoSim Authors
// SPDX-License-Identifier: Apache-2.0

//! Simulation configuration.
//!
//! Data model:
//! - simulation spec
//!   - cluster shape
//!   - workload source (+ arrival distribution, seed)
//!   - heatmap path
//!   - schedulers to compare (+ baseline)
//!
//! A spec file is YAML or JSON; [`SimulationSpec::from_file`] picks the
//! format from the extension. Validation collects every failure rather
//! than stopping at the first.

use serde::{Deserialize, Serialize};
use std::path::Path;

pub mod cluster;
pub mod error;
pub mod scheduler;
pub mod workload;

pub use cluster::ClusterSpec;
pub use error::Error;
pub use scheduler::{SchedulerSpec, is_coscheduler};
pub use workload::{DistributionSpec, JobTemplate, WorkloadSource, WorkloadSpec};

/// Everything one simulation run needs: cluster, workload, heatmap, and
/// the set of policies to drive against the same inputs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationSpec {
    /// The simulated cluster.
    pub cluster: ClusterSpec,
    /// The workload to schedule.
    pub workload: WorkloadSpec,
    /// Path to the pairwise interference heatmap (JSON); omit for an
    /// interference-free run.
    #[serde(default)]
    pub heatmap: Option<String>,
    /// The policies to simulate, one worker each.
    pub schedulers: Vec<SchedulerSpec>,
    /// Name of the policy the others are compared against; defaults to the
    /// first configured scheduler.
    #[serde(default)]
    pub baseline: Option<String>,
}

impl SimulationSpec {
    /// Parses a spec from YAML text.
    pub fn from_yaml(text: &str) -> Result<Self, Error> {
        let spec: Self = serde_yaml::from_str(text).map_err(|e| Error::DeserializationError {
            format: "YAML".to_owned(),
            details: e.to_string(),
        })?;
        spec.validate()?;
        Ok(spec)
    }

    /// Parses a spec from JSON text.
    pub fn from_json(text: &str) -> Result<Self, Error> {
        let spec: Self = serde_json::from_str(text).map_err(|e| Error::DeserializationError {
            format: "JSON".to_owned(),
            details: e.to_string(),
        })?;
        spec.validate()?;
        Ok(spec)
    }

    /// Loads a spec file, picking the format from its extension.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, Error> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| Error::FileReadError {
            path: path.display().to_string(),
            details: e.to_string(),
        })?;
        match path
            .extension()
            .and_then(|ext| ext.to_str())
            .unwrap_or_default()
        {
            "yaml" | "yml" => Self::from_yaml(&text),
            "json" => Self::from_json(&text),
            other => Err(Error::UnsupportedFormat {
                extension: other.to_owned(),
            }),
        }
    }

    /// The effective baseline policy name.
    #[must_use]
    pub fn baseline_name(&self) -> Option<&str> {
        self.baseline
            .as_deref()
            .or_else(|| self.schedulers.first().map(|s| s.name.as_str()))
    }

    /// Checks the spec, collecting every failure into
    /// [`Error::InvalidConfiguration`].
    pub fn validate(&self) -> Result<(), Error> {
        let mut errors = Vec::new();

        self.cluster.validate(&mut errors);
        self.workload.validate(&mut errors);

        if self.schedulers.is_empty() {
            errors.push(Error::NoSchedulers);
        }
        if let Some(baseline) = &self.baseline {
            if !self.schedulers.iter().any(|s| &s.name == baseline) {
                errors.push(Error::UnknownBaseline {
                    baseline: baseline.clone(),
                });
            }
        }

        // Co-scheduling halves every socket; a 1-core socket would silently
        // produce a zero-sized half shape.
        for sched in &self.schedulers {
            if is_coscheduler(&sched.name) {
                for (socket, cores) in self.cluster.socket_conf.iter().enumerate() {
                    if *cores < 2 {
                        errors.push(Error::SocketTooSmallForCoscheduling {
                            scheduler: sched.name.clone(),
                            socket,
                            cores: *cores,
                        });
                    }
                }
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(Error::InvalidConfiguration { errors })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_yaml() -> &'static str {
        r#"
cluster:
  nodes: 2
  socket_conf: [2, 2]
workload:
  source:
    type: swf
    path: workload.swf
  seed: 7
heatmap: heatmap.json
schedulers:
  - name: fifo
  - name: ranks.filler
    queue_depth: 8
baseline: fifo
"#
    }

    #[test]
    fn from_yaml_accepts_a_full_spec() {
        let spec = SimulationSpec::from_yaml(valid_yaml()).expect("valid spec");
        assert_eq!(spec.cluster.nodes, 2);
        assert_eq!(spec.schedulers.len(), 2);
        assert_eq!(spec.baseline_name(), Some("fifo"));
        assert_eq!(spec.schedulers[1].queue_depth, Some(8));
    }

    #[test]
    fn from_yaml_rejects_missing_sections() {
        let err = SimulationSpec::from_yaml("cluster:\n  nodes: 1\n").unwrap_err();
        match err {
            Error::DeserializationError { details, .. } => {
                assert!(details.contains("socket_conf") || details.contains("missing field"));
            }
            other => panic!("expected deserialization error, got: {other:?}"),
        }
    }

    #[test]
    fn validation_collects_every_failure() {
        let yaml = r#"
cluster:
  nodes: 0
  socket_conf: [2, 0]
workload:
  source:
    type: random
    catalog: []
    count: 0
schedulers: []
"#;
        let err = SimulationSpec::from_yaml(yaml).unwrap_err();
        match err {
            Error::InvalidConfiguration { errors } => {
                assert!(errors.iter().any(|e| matches!(e, Error::NoNodes)));
                assert!(
                    errors
                        .iter()
                        .any(|e| matches!(e, Error::ZeroCoreSocket { socket: 1 }))
                );
                assert!(errors.iter().any(|e| matches!(e, Error::EmptyCatalog)));
                assert!(errors.iter().any(|e| matches!(e, Error::NoSchedulers)));
            }
            other => panic!("expected invalid configuration, got: {other:?}"),
        }
    }

    #[test]
    fn coscheduler_requires_two_cores_per_socket() {
        let yaml = r#"
cluster:
  nodes: 1
  socket_conf: [1, 4]
workload:
  source:
    type: swf
    path: workload.swf
schedulers:
  - name: ranks.bester
"#;
        let err = SimulationSpec::from_yaml(yaml).unwrap_err();
        match err {
            Error::InvalidConfiguration { errors } => {
                assert!(errors.iter().any(|e| matches!(
                    e,
                    Error::SocketTooSmallForCoscheduling { socket: 0, .. }
                )));
            }
            other => panic!("expected invalid configuration, got: {other:?}"),
        }
    }

    #[test]
    fn unknown_baseline_is_rejected() {
        let yaml = r#"
cluster:
  nodes: 1
  socket_conf: [4]
workload:
  source:
    type: swf
    path: workload.swf
schedulers:
  - name: fifo
baseline: easy
"#;
        let err = SimulationSpec::from_yaml(yaml).unwrap_err();
        match err {
            Error::InvalidConfiguration { errors } => {
                assert!(
                    errors
                        .iter()
                        .any(|e| matches!(e, Error::UnknownBaseline { .. }))
                );
            }
            other => panic!("expected invalid configuration, got: {other:?}"),
        }
    }
}

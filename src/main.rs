// Copyright The CoSim Authors
// SPDX-License-Identifier: Apache-2.0

//! `sim_engine`: drive scheduling-policy simulations from a spec file.

use std::io::Write;
use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing::info;

use cosim_config::SimulationSpec;
use cosim_controller::{SimulationSuite, TracingReporter};
use cosim_engine::PolicyOptions;
use cosim_model::Heatmap;

#[derive(Parser)]
#[command(name = "sim_engine", version, about = "HPC co-scheduling simulator")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run every configured policy and write the comparison report.
    Run {
        /// Path to the simulation spec (YAML or JSON).
        #[arg(long)]
        spec: PathBuf,
        /// Where to write the JSON report (`-` for stdout).
        #[arg(long, default_value = "results.json")]
        output: PathBuf,
    },
    /// Parse and validate a spec without running anything.
    Validate {
        /// Path to the simulation spec (YAML or JSON).
        #[arg(long)]
        spec: PathBuf,
    },
}

fn policy_options(sched: &cosim_config::SchedulerSpec) -> PolicyOptions {
    let defaults = PolicyOptions::default();
    PolicyOptions {
        queue_depth: sched.queue_depth,
        backfill_depth: sched.backfill_depth.unwrap_or(defaults.backfill_depth),
        ranks_threshold: sched.ranks_threshold.unwrap_or(defaults.ranks_threshold),
    }
}

fn build_suite(spec: &SimulationSpec) -> anyhow::Result<SimulationSuite> {
    let jobs = cosim_workload::build_jobs(&spec.workload).context("building the workload")?;

    let heatmap = match &spec.heatmap {
        Some(path) => {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("reading heatmap `{path}`"))?;
            Heatmap::from_json(&text).with_context(|| format!("parsing heatmap `{path}`"))?
        }
        None => Heatmap::new(),
    };

    let socket_conf = cosim_model::SocketConf::new(spec.cluster.socket_conf.iter().copied())
        .context("building the socket shape")?;
    let policies = spec
        .schedulers
        .iter()
        .map(|sched| (sched.name.clone(), policy_options(sched)))
        .collect();
    let baseline = spec
        .baseline_name()
        .context("at least one scheduler must be configured")?
        .to_owned();

    SimulationSuite::new(
        jobs,
        heatmap,
        spec.cluster.nodes,
        socket_conf,
        spec.cluster.queue_size,
        policies,
        baseline,
    )
    .context("assembling the simulation suite")
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    match cli.command {
        Command::Validate { spec } => {
            let parsed = SimulationSpec::from_file(&spec)
                .with_context(|| format!("loading spec `{}`", spec.display()))?;
            info!(
                schedulers = parsed.schedulers.len(),
                nodes = parsed.cluster.nodes,
                "spec is valid"
            );
            Ok(())
        }
        Command::Run { spec, output } => {
            let parsed = SimulationSpec::from_file(&spec)
                .with_context(|| format!("loading spec `{}`", spec.display()))?;
            let suite = build_suite(&parsed)?;

            let result = suite.run(&TracingReporter)?;
            for report in &result.reports {
                info!(
                    policy = %report.policy,
                    makespan = report.makespan,
                    speedup = report.makespan_speedup,
                    "simulation report"
                );
            }

            let rendered =
                serde_json::to_string_pretty(&result).context("serializing the report")?;
            if output.as_os_str() == "-" {
                std::io::stdout()
                    .lock()
                    .write_all(rendered.as_bytes())
                    .context("writing the report to stdout")?;
            } else {
                std::fs::write(&output, rendered)
                    .with_context(|| format!("writing `{}`", output.display()))?;
                info!(output = %output.display(), "report written");
            }
            Ok(())
        }
    }
}

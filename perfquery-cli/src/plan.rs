use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use perfquery_core::{
    load_profiles, ProfilesConfig, QueryPlanner, RequestSpec, SensorKind, SystemClock,
};
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

#[derive(Debug, Parser)]
pub struct Plan {
    #[arg(
        long,
        short = 'c',
        help = "YAML file with the host_perf / vm_perf profiles. Default: built-in profiles"
    )]
    pub config_file: Option<PathBuf>,

    #[arg(
        long,
        short = 'k',
        value_enum,
        default_value = "host",
        help = "Sensor kind to plan the query for"
    )]
    pub kind: KindArg,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum KindArg {
    Host,
    Vm,
}

impl From<KindArg> for SensorKind {
    fn from(kind: KindArg) -> Self {
        match kind {
            KindArg::Host => SensorKind::Host,
            KindArg::Vm => SensorKind::VirtualMachine,
        }
    }
}

#[derive(Debug, Serialize)]
struct PlanOutput {
    kind: SensorKind,
    metrics: Vec<String>,
    spec: RequestSpec,
}

pub fn handle_plan(plan: Plan) -> Result<()> {
    let profiles = match &plan.config_file {
        Some(path) => load_profiles(path)
            .with_context(|| format!("failed to load profiles from {}", path.display()))?,
        None => ProfilesConfig::default(),
    };

    let kind = SensorKind::from(plan.kind);
    let planner = QueryPlanner::new(
        kind,
        profiles.profile(kind).clone(),
        Arc::new(SystemClock),
    );
    let planned = planner.plan().context("failed to plan the query")?;

    info!(kind = %kind, window_end = %planned.window_end, "planned query");

    let output = PlanOutput {
        kind,
        metrics: planned.query.metrics().to_vec(),
        spec: planned.query.to_spec(),
    };
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

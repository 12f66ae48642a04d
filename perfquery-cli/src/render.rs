use anyhow::{Context, Result};
use chrono::{DateTime, TimeDelta, Utc};
use clap::Parser;
use perfquery_core::{parse_duration, PerfQuery};
use tracing::info;

#[derive(Debug, Parser)]
#[command(after_help = EXAMPLES_TEXT)]
pub struct Render {
    #[arg(
        long = "metric",
        short = 'm',
        help = "Counter to query, repeat for several. Example: cpu.usagemhz.average"
    )]
    pub metrics: Vec<String>,

    #[arg(
        long,
        short = 'i',
        help = "Instance selector applied to every counter. Default: '*'"
    )]
    pub instance: Option<String>,

    #[arg(
        long,
        short = 'n',
        allow_negative_numbers = true,
        help = "Maximum number of samples to return. Default: 1"
    )]
    pub max_samples: Option<i64>,

    #[arg(
        long,
        value_parser = parse_duration_arg,
        allow_hyphen_values = true,
        help = "Interval between samples, e.g. 20s. Default: the service interval"
    )]
    pub interval: Option<TimeDelta>,

    #[arg(
        long,
        value_parser = parse_duration_arg,
        conflicts_with_all = ["start", "end"],
        help = "Query the last period of time, e.g. 5m"
    )]
    pub last: Option<TimeDelta>,

    #[arg(long, requires = "end", help = "Window start (RFC 3339)")]
    pub start: Option<DateTime<Utc>>,

    #[arg(long, requires = "start", help = "Window end (RFC 3339)")]
    pub end: Option<DateTime<Utc>>,
}

const EXAMPLES_TEXT: &str = r#"
EXAMPLES:
    perfquery render -m cpu.ready.summation -m mem.active.average --interval 20s --last 5m
    perfquery render -m net.bytesRx.average -i vmnic0 -n 20 --start 2024-05-01T10:00:00Z --end 2024-05-01T10:05:00Z
"#;

pub fn parse_duration_arg(s: &str) -> Result<TimeDelta, String> {
    parse_duration(s).map_err(|e| e.to_string())
}

pub fn build_query(render: Render) -> Result<PerfQuery> {
    let mut builder = PerfQuery::builder().with_metrics(render.metrics);

    if let Some(instance) = render.instance {
        builder = builder.with_instance(instance);
    }
    if let Some(max_samples) = render.max_samples {
        builder = builder.with_max_samples(max_samples);
    }
    if let Some(interval) = render.interval {
        builder = builder.with_interval(interval);
    }
    if let Some(last) = render.last {
        builder = builder.with_duration_window(-last.abs());
    }
    if let (Some(start), Some(end)) = (render.start, render.end) {
        builder = builder.with_window(start, end);
    }

    builder.build().context("invalid query options")
}

pub fn handle_render(render: Render) -> Result<()> {
    let query = build_query(render)?;
    let spec = query.to_spec();
    info!(
        selectors = spec.metric_id.len(),
        bounded = spec.is_bounded(),
        "rendered query"
    );

    println!("{}", serde_json::to_string_pretty(&spec)?);
    Ok(())
}

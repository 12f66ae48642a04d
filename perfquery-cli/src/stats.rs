use anyhow::{Context, Result};
use clap::Parser;
use perfquery_core::{all_true, average, sum};
use serde_json::json;

#[derive(Debug, Parser)]
pub struct Stats {
    #[arg(long, help = "Treat the values as booleans and report whether all are true")]
    pub bools: bool,

    #[arg(
        allow_negative_numbers = true,
        help = "Values to aggregate. Integers are summed exactly unless the total overflows, anything else as floats"
    )]
    pub values: Vec<String>,
}

pub fn handle_stats(stats: Stats) -> Result<()> {
    let output = if stats.bools {
        let values = stats
            .values
            .iter()
            .map(|v| {
                v.parse::<bool>()
                    .with_context(|| format!("not a boolean: {}", v))
            })
            .collect::<Result<Vec<bool>>>()?;
        json!({
            "count": values.len(),
            "all_true": all_true(&values),
        })
    } else if let Some(values) = parse_all::<i64>(&stats.values)
        .ok()
        .filter(|values| checked_sum(values).is_some())
    {
        json!({
            "count": values.len(),
            "sum": sum(&values),
            "average": average(&values),
        })
    } else {
        // not integers, or an integer total beyond i64
        let values = parse_all::<f64>(&stats.values)?;
        json!({
            "count": values.len(),
            "sum": sum(&values),
            "average": average(&values),
        })
    };

    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

fn checked_sum(values: &[i64]) -> Option<i64> {
    values.iter().try_fold(0i64, |acc, v| acc.checked_add(*v))
}

fn parse_all<T>(values: &[String]) -> Result<Vec<T>>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    values
        .iter()
        .map(|v| {
            v.parse::<T>()
                .with_context(|| format!("not a number: {}", v))
        })
        .collect()
}

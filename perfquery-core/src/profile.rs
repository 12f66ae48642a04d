use chrono::TimeDelta;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt::{Display, Formatter};
use std::path::Path;

use crate::errors::{PerfQueryError, Result};
use crate::query::ALL_INSTANCES;

/// Kind of managed entity a performance profile queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SensorKind {
    Host,
    VirtualMachine,
}

impl Display for SensorKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            SensorKind::Host => write!(f, "host"),
            SensorKind::VirtualMachine => write!(f, "virtual_machine"),
        }
    }
}

/// Counters queried for hosts when default metrics are enabled.
pub fn default_host_metrics() -> Vec<String> {
    [
        "cpu.usagemhz.average",
        "cpu.demand.average",
        "cpu.latency.average",
        "cpu.entitlement.latest",
        "cpu.ready.summation",
        "cpu.readiness.average",
        "cpu.costop.summation",
        "cpu.maxlimited.summation",
        "mem.entitlement.average",
        "mem.active.average",
        "mem.shared.average",
        "mem.vmmemctl.average",
        "mem.swapped.average",
        "mem.consumed.average",
        "net.bytesRx.average",
        "net.bytesTx.average",
        "net.errorsRx.summation",
        "net.errorsTx.summation",
        "net.droppedRx.summation",
        "net.droppedTx.summation",
        "datastore.read.average",
        "datastore.write.average",
    ]
    .into_iter()
    .map(String::from)
    .collect()
}

/// Counters queried for virtual machines when default metrics are enabled.
pub fn default_vm_metrics() -> Vec<String> {
    [
        "cpu.usagemhz.average",
        "cpu.capacity.provisioned.average",
        "cpu.readiness.average",
        "cpu.costop.summation",
        "cpu.maxlimited.summation",
        "cpu.ready.summation",
        "mem.active.average",
        "mem.granted.average",
        "mem.consumed.average",
        "disk.throughput.contention.average",
        "disk.throughput.usage.average",
    ]
    .into_iter()
    .map(String::from)
    .collect()
}

/// Profile settings as written in the configuration file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoadProfile {
    /// Longest window a single query may cover, e.g. "5m"
    #[serde(default = "default_max_sample_window")]
    pub max_sample_window: String,
    /// Spacing between samples, e.g. "20s"; "0s" selects the service default
    #[serde(default = "default_sample_interval")]
    pub sample_interval: String,
    /// Sample cap per query
    #[serde(default = "default_max_samples")]
    pub max_samples: i64,
    /// Instance selector applied to every counter
    #[serde(default = "default_instance")]
    pub instance: String,
    /// Query the built-in counter list for the sensor kind
    #[serde(default = "default_true")]
    pub default_metrics: bool,
    /// Additional counters, appended after the defaults
    #[serde(default)]
    pub extra_metrics: Vec<String>,
}

fn default_max_sample_window() -> String {
    "5m".to_string()
}

fn default_sample_interval() -> String {
    "20s".to_string()
}

fn default_max_samples() -> i64 {
    20
}

fn default_instance() -> String {
    ALL_INSTANCES.to_string()
}

fn default_true() -> bool {
    true
}

impl Default for LoadProfile {
    fn default() -> Self {
        Self {
            max_sample_window: default_max_sample_window(),
            sample_interval: default_sample_interval(),
            max_samples: default_max_samples(),
            instance: default_instance(),
            default_metrics: true,
            extra_metrics: vec![],
        }
    }
}

/// Validated settings driving the queries of one sensor kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PerfProfile {
    pub max_sample_window: TimeDelta,
    pub sample_interval: TimeDelta,
    pub max_samples: i32,
    pub instance: String,
    pub default_metrics: bool,
    pub extra_metrics: Vec<String>,
}

impl PerfProfile {
    /// Counters to query: the defaults for `kind` when enabled, then the
    /// extra ones, keeping the first occurrence of duplicates.
    pub fn metrics(&self, kind: SensorKind) -> Vec<String> {
        let mut metrics = Vec::new();
        if self.default_metrics {
            metrics.extend(match kind {
                SensorKind::Host => default_host_metrics(),
                SensorKind::VirtualMachine => default_vm_metrics(),
            });
        }
        metrics.extend(self.extra_metrics.iter().cloned());

        let mut seen = HashSet::new();
        metrics.retain(|m| seen.insert(m.clone()));
        metrics
    }
}

impl Default for PerfProfile {
    fn default() -> Self {
        Self {
            max_sample_window: TimeDelta::minutes(5),
            sample_interval: TimeDelta::seconds(20),
            max_samples: 20,
            instance: ALL_INSTANCES.to_string(),
            default_metrics: true,
            extra_metrics: vec![],
        }
    }
}

impl TryFrom<LoadProfile> for PerfProfile {
    type Error = PerfQueryError;

    fn try_from(config: LoadProfile) -> Result<Self> {
        let max_sample_window = parse_duration(&config.max_sample_window)?;
        if max_sample_window <= TimeDelta::zero() {
            return Err(PerfQueryError::InvalidConfig(format!(
                "max_sample_window must be positive, got {}",
                config.max_sample_window
            )));
        }

        let sample_interval = parse_duration(&config.sample_interval)?;
        if sample_interval < TimeDelta::zero() {
            return Err(PerfQueryError::InvalidConfig(format!(
                "sample_interval cannot be negative, got {}",
                config.sample_interval
            )));
        }

        let max_samples = i32::try_from(config.max_samples)
            .ok()
            .filter(|n| *n > 0)
            .ok_or_else(|| {
                PerfQueryError::InvalidConfig(format!(
                    "max_samples must be a positive 32-bit integer, got {}",
                    config.max_samples
                ))
            })?;

        Ok(PerfProfile {
            max_sample_window,
            sample_interval,
            max_samples,
            instance: config.instance,
            default_metrics: config.default_metrics,
            extra_metrics: config.extra_metrics,
        })
    }
}

/// Performance profiles loaded from the configuration file
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct LoadConfiguration {
    #[serde(default)]
    pub host_perf: LoadProfile,
    #[serde(default)]
    pub vm_perf: LoadProfile,
}

/// Validated profiles for every sensor kind.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProfilesConfig {
    pub host_perf: PerfProfile,
    pub vm_perf: PerfProfile,
}

impl ProfilesConfig {
    pub fn from_yaml(content: &str) -> Result<Self> {
        let load_config: LoadConfiguration = serde_yaml::from_str(content)?;
        load_config.try_into()
    }

    pub fn profile(&self, kind: SensorKind) -> &PerfProfile {
        match kind {
            SensorKind::Host => &self.host_perf,
            SensorKind::VirtualMachine => &self.vm_perf,
        }
    }
}

impl TryFrom<LoadConfiguration> for ProfilesConfig {
    type Error = PerfQueryError;

    fn try_from(config: LoadConfiguration) -> Result<Self> {
        Ok(ProfilesConfig {
            host_perf: config.host_perf.try_into()?,
            vm_perf: config.vm_perf.try_into()?,
        })
    }
}

/// Load the performance profiles from a YAML file.
pub fn load_profiles<P: AsRef<Path>>(path: P) -> Result<ProfilesConfig> {
    let content = std::fs::read_to_string(path.as_ref())?;
    ProfilesConfig::from_yaml(&content)
}

/// Parse a duration such as "20s", "5m", "1.5h", "500ms" or "-5m".
///
/// A bare number is read as seconds. Precision is kept to the millisecond.
pub fn parse_duration(s: &str) -> Result<TimeDelta> {
    let s = s.trim();
    let (negative, s) = match s.strip_prefix('-') {
        Some(rest) => (true, rest.trim_start()),
        None => (false, s),
    };
    if s.is_empty() {
        return Err(PerfQueryError::InvalidDuration(
            "empty duration string".to_string(),
        ));
    }

    let num_end = s
        .find(|c: char| !c.is_ascii_digit() && c != '.')
        .unwrap_or(s.len());
    if num_end == 0 {
        return Err(PerfQueryError::InvalidDuration(format!(
            "duration must start with a number: {}",
            s
        )));
    }

    let (number, unit) = s.split_at(num_end);
    let value: f64 = number
        .parse()
        .map_err(|_| PerfQueryError::InvalidDuration(format!("invalid number: {}", number)))?;

    let millis_per_unit = match unit {
        "ms" => 1.0,
        "s" | "" => 1_000.0,
        "m" => 60_000.0,
        "h" => 3_600_000.0,
        "d" => 86_400_000.0,
        _ => {
            return Err(PerfQueryError::InvalidDuration(format!(
                "unknown duration unit: {}",
                unit
            )));
        }
    };

    let millis = value * millis_per_unit;
    if !millis.is_finite() || millis > i64::MAX as f64 {
        return Err(PerfQueryError::InvalidDuration(format!(
            "duration out of range: {}",
            s
        )));
    }
    let delta = TimeDelta::try_milliseconds(millis as i64).ok_or_else(|| {
        PerfQueryError::InvalidDuration(format!("duration out of range: {}", s))
    })?;

    Ok(if negative { -delta } else { delta })
}

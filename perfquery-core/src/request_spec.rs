use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::query::PerfQuery;

/// Counter selector of a [`RequestSpec`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PerfMetricId {
    /// Counter name, `None` for the service's default counters.
    pub counter: Option<String>,
    /// Instance selector, shared by every selector of the request.
    pub instance: String,
}

/// Request shape consumed by the metrics service client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestSpec {
    pub max_sample: i32,
    pub metric_id: Vec<PerfMetricId>,
    /// Whole seconds between samples, 0 for the service default.
    pub interval_id: i32,
    pub start_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
}

impl RequestSpec {
    /// Whether the request carries an explicit time window.
    pub fn is_bounded(&self) -> bool {
        self.start_time.is_some() && self.end_time.is_some()
    }
}

impl PerfQuery {
    /// Renders the descriptor into the request shape.
    ///
    /// A descriptor without a window renders both timestamps as `None`: the
    /// service then answers with the latest `max_sample` samples.
    pub fn to_spec(&self) -> RequestSpec {
        let metric_id = if self.metrics.is_empty() {
            vec![PerfMetricId {
                counter: None,
                instance: self.instance.clone(),
            }]
        } else {
            self.metrics
                .iter()
                .map(|counter| PerfMetricId {
                    counter: Some(counter.clone()),
                    instance: self.instance.clone(),
                })
                .collect()
        };

        // num_seconds truncates toward zero; the range is checked by set_interval
        let interval_id = self
            .sample_interval
            .map(|interval| i32::try_from(interval.num_seconds()).unwrap_or(i32::MAX))
            .unwrap_or(0);

        let (start_time, end_time) = match self.window {
            Some((start, end)) => (Some(start), Some(end)),
            None => {
                warn!(
                    max_samples = self.max_samples,
                    "rendering perf query without a time window, the service returns the latest samples"
                );
                (None, None)
            }
        };

        debug!(
            selectors = metric_id.len(),
            interval_id, "rendered perf query spec"
        );

        RequestSpec {
            max_sample: self.max_samples,
            metric_id,
            interval_id,
            start_time,
            end_time,
        }
    }
}

impl From<&PerfQuery> for RequestSpec {
    fn from(query: &PerfQuery) -> Self {
        query.to_spec()
    }
}

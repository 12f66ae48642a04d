use chrono::{DateTime, TimeDelta, Utc};
use std::fmt::Display;
use tracing::{debug, trace};

use crate::clock::{Clock, SystemClock};
use crate::errors::{PerfQueryError, Result};

/// Instance selector matching every instance of a counter.
pub const ALL_INSTANCES: &str = "*";

/// Sample cap used when no option sets one: only the latest sample.
pub const DEFAULT_MAX_SAMPLES: i32 = 1;

/// Descriptor of a performance query.
///
/// A `PerfQuery` is produced by folding [`PerfOption`] values over the
/// defaults and is read-only afterwards. Render it with
/// [`PerfQuery::to_spec`] before handing it to the metrics service client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PerfQuery {
    pub(crate) metrics: Vec<String>,
    pub(crate) instance: String,
    pub(crate) max_samples: i32,
    pub(crate) sample_interval: Option<TimeDelta>,
    pub(crate) window: Option<(DateTime<Utc>, DateTime<Utc>)>,
}

impl PerfQuery {
    /// Creates a descriptor with the defaults and applies `options` in order.
    ///
    /// Conflicting options are not an error, the last one touching a field wins.
    pub fn new<I>(options: I) -> Self
    where
        I: IntoIterator<Item = PerfOption>,
    {
        let mut query = PerfQuery {
            metrics: Vec::new(),
            instance: ALL_INSTANCES.to_string(),
            max_samples: DEFAULT_MAX_SAMPLES,
            sample_interval: None,
            window: None,
        };

        let mut applied = 0usize;
        for option in options {
            trace!(option = ?option.kind, "applying perf query option");
            option.apply(&mut query);
            applied += 1;
        }

        debug!(
            options = applied,
            metrics = query.metrics.len(),
            instance = %query.instance,
            max_samples = query.max_samples,
            "perf query resolved"
        );
        query
    }

    pub fn builder() -> PerfQueryBuilder {
        PerfQueryBuilder::default()
    }

    /// Requested counters, in insertion order. Empty means the service defaults.
    pub fn metrics(&self) -> &[String] {
        &self.metrics
    }

    pub fn instance(&self) -> &str {
        &self.instance
    }

    pub fn max_samples(&self) -> i32 {
        self.max_samples
    }

    /// `None` when the service's default interval applies.
    pub fn sample_interval(&self) -> Option<TimeDelta> {
        self.sample_interval
    }

    /// `(start, end)` with `start <= end` unless built from a positive duration window.
    pub fn window(&self) -> Option<(DateTime<Utc>, DateTime<Utc>)> {
        self.window
    }
}

impl Default for PerfQuery {
    fn default() -> Self {
        PerfQuery::new(std::iter::empty::<PerfOption>())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum OptionKind {
    AddMetrics(Vec<String>),
    SetMetrics(Vec<String>),
    SetInstance(String),
    SetMaxSamples(i32),
    SetInterval(Option<TimeDelta>),
    SetWindow {
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    },
}

/// A single mutation of a [`PerfQuery`].
///
/// Values are validated when constructed, so applying an option never fails.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PerfOption {
    kind: OptionKind,
}

impl PerfOption {
    fn new(kind: OptionKind) -> Self {
        PerfOption { kind }
    }

    /// Appends counters after the ones already requested.
    pub fn add_metrics<I, S>(ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(OptionKind::AddMetrics(
            ids.into_iter().map(Into::into).collect(),
        ))
    }

    /// Replaces the requested counters.
    pub fn set_metrics<I, S>(ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(OptionKind::SetMetrics(
            ids.into_iter().map(Into::into).collect(),
        ))
    }

    pub fn set_instance(selector: impl Into<String>) -> Self {
        Self::new(OptionKind::SetInstance(selector.into()))
    }

    /// Sets the sample cap. The value must be positive and fit in an `i32`.
    pub fn set_max_samples<T>(num: T) -> Result<Self>
    where
        T: TryInto<i32> + Copy + Display,
    {
        let cap: i32 = num.try_into().map_err(|_| {
            PerfQueryError::MaxSamplesOutOfRange(format!(
                "{} does not fit in a 32-bit sample cap",
                num
            ))
        })?;
        if cap <= 0 {
            return Err(PerfQueryError::InvalidMaxSamples(format!(
                "{} is not a positive sample count",
                cap
            )));
        }
        Ok(Self::new(OptionKind::SetMaxSamples(cap)))
    }

    /// Sets the spacing between samples. Zero selects the service default.
    pub fn set_interval(interval: TimeDelta) -> Result<Self> {
        if interval < TimeDelta::zero() {
            return Err(PerfQueryError::InvalidInterval(format!(
                "{} is negative",
                interval
            )));
        }
        if i32::try_from(interval.num_seconds()).is_err() {
            return Err(PerfQueryError::InvalidInterval(format!(
                "{} seconds does not fit in a 32-bit interval",
                interval.num_seconds()
            )));
        }
        let interval = (!interval.is_zero()).then_some(interval);
        Ok(Self::new(OptionKind::SetInterval(interval)))
    }

    /// Sets an absolute window. Endpoints given in reverse order are swapped.
    pub fn set_window(t1: DateTime<Utc>, t2: DateTime<Utc>) -> Self {
        let (start, end) = if t1 > t2 { (t2, t1) } else { (t1, t2) };
        Self::new(OptionKind::SetWindow { start, end })
    }

    /// Sets a window ending now and starting at `now + delta`.
    ///
    /// "Now" is read when this option is created, not when it is applied.
    /// Pass a negative `delta` for the last N units of time; a positive one
    /// yields a window that starts in the future and is not swapped.
    pub fn set_duration_window(delta: TimeDelta) -> Self {
        Self::set_duration_window_at(&SystemClock, delta)
    }

    /// Same as [`PerfOption::set_duration_window`] with an explicit clock.
    pub fn set_duration_window_at(clock: &dyn Clock, delta: TimeDelta) -> Self {
        let end = clock.now();
        let start = end.checked_add_signed(delta).unwrap_or(if delta < TimeDelta::zero() {
            DateTime::<Utc>::MIN_UTC
        } else {
            DateTime::<Utc>::MAX_UTC
        });
        Self::new(OptionKind::SetWindow { start, end })
    }

    pub(crate) fn apply(self, query: &mut PerfQuery) {
        match self.kind {
            OptionKind::AddMetrics(mut ids) => query.metrics.append(&mut ids),
            OptionKind::SetMetrics(ids) => query.metrics = ids,
            OptionKind::SetInstance(selector) => query.instance = selector,
            OptionKind::SetMaxSamples(cap) => query.max_samples = cap,
            OptionKind::SetInterval(interval) => query.sample_interval = interval,
            OptionKind::SetWindow { start, end } => query.window = Some((start, end)),
        }
    }
}

/// Fluent construction of a [`PerfQuery`].
///
/// Each `with_*` call records one option, in call order. Validation errors
/// are held back until [`PerfQueryBuilder::build`], which reports the first.
#[derive(Debug, Default)]
pub struct PerfQueryBuilder {
    options: Vec<PerfOption>,
    error: Option<PerfQueryError>,
}

impl PerfQueryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends counters to the requested set.
    pub fn add_metrics<I, S>(self, ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.with_option(PerfOption::add_metrics(ids))
    }

    /// Replaces the requested counters.
    pub fn with_metrics<I, S>(self, ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.with_option(PerfOption::set_metrics(ids))
    }

    pub fn with_instance(self, selector: impl Into<String>) -> Self {
        self.with_option(PerfOption::set_instance(selector))
    }

    pub fn with_max_samples<T>(self, num: T) -> Self
    where
        T: TryInto<i32> + Copy + Display,
    {
        self.with_result(PerfOption::set_max_samples(num))
    }

    pub fn with_interval(self, interval: TimeDelta) -> Self {
        self.with_result(PerfOption::set_interval(interval))
    }

    pub fn with_window(self, t1: DateTime<Utc>, t2: DateTime<Utc>) -> Self {
        self.with_option(PerfOption::set_window(t1, t2))
    }

    /// Captures the current time now, see [`PerfOption::set_duration_window`].
    pub fn with_duration_window(self, delta: TimeDelta) -> Self {
        self.with_option(PerfOption::set_duration_window(delta))
    }

    pub fn with_option(mut self, option: PerfOption) -> Self {
        self.options.push(option);
        self
    }

    fn with_result(mut self, option: Result<PerfOption>) -> Self {
        match option {
            Ok(option) => self.options.push(option),
            Err(e) => {
                if self.error.is_none() {
                    self.error = Some(e);
                }
            }
        }
        self
    }

    pub fn build(self) -> Result<PerfQuery> {
        if let Some(e) = self.error {
            return Err(e);
        }
        Ok(PerfQuery::new(self.options))
    }
}

use chrono::{DateTime, TimeDelta, Utc};
use std::sync::Arc;
use tracing::debug;

use crate::clock::Clock;
use crate::errors::Result;
use crate::profile::{PerfProfile, SensorKind};
use crate::query::{PerfOption, PerfQuery};

/// Seconds a fresh window reaches back before anything was committed.
pub const INITIAL_LOOKBACK_SECS: i64 = 300;

/// Window tracker for periodic queries.
///
/// Each window ends at the current time and starts where the last committed
/// query ended, but never further back than `max_window`.
pub struct SlidingWindow {
    clock: Arc<dyn Clock>,
    max_window: TimeDelta,
    last_query_end: DateTime<Utc>,
}

impl std::fmt::Debug for SlidingWindow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SlidingWindow")
            .field("max_window", &self.max_window)
            .field("last_query_end", &self.last_query_end)
            .finish()
    }
}

impl SlidingWindow {
    pub fn new(clock: Arc<dyn Clock>, max_window: TimeDelta) -> Self {
        let now = clock.now();
        let last_query_end = now
            .checked_sub_signed(TimeDelta::seconds(INITIAL_LOOKBACK_SECS))
            .unwrap_or(DateTime::<Utc>::MIN_UTC);
        SlidingWindow {
            clock,
            max_window,
            last_query_end,
        }
    }

    /// `(start, end)` of the next query.
    pub fn next_window(&self) -> (DateTime<Utc>, DateTime<Utc>) {
        let end = self.clock.now();
        let earliest = end
            .checked_sub_signed(self.max_window)
            .unwrap_or(DateTime::<Utc>::MIN_UTC);
        let start = std::cmp::max(earliest, self.last_query_end);
        // a clock moved backwards still yields an ordered window
        (std::cmp::min(start, end), end)
    }

    /// Records that data up to `end` was retrieved.
    pub fn commit(&mut self, end: DateTime<Utc>) {
        if end > self.last_query_end {
            self.last_query_end = end;
        }
    }

    pub fn last_query_end(&self) -> DateTime<Utc> {
        self.last_query_end
    }
}

/// Query produced by [`QueryPlanner::plan`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedQuery {
    pub kind: SensorKind,
    pub query: PerfQuery,
    pub window_end: DateTime<Utc>,
}

/// Builds the periodic performance query of one sensor kind from its profile.
#[derive(Debug)]
pub struct QueryPlanner {
    kind: SensorKind,
    profile: PerfProfile,
    window: SlidingWindow,
}

impl QueryPlanner {
    pub fn new(kind: SensorKind, profile: PerfProfile, clock: Arc<dyn Clock>) -> Self {
        let window = SlidingWindow::new(clock, profile.max_sample_window);
        QueryPlanner {
            kind,
            profile,
            window,
        }
    }

    pub fn kind(&self) -> SensorKind {
        self.kind
    }

    pub fn profile(&self) -> &PerfProfile {
        &self.profile
    }

    pub fn window(&self) -> &SlidingWindow {
        &self.window
    }

    /// Builds the next query. The window only moves on [`QueryPlanner::commit`].
    pub fn plan(&self) -> Result<PlannedQuery> {
        let (start, end) = self.window.next_window();
        let options = vec![
            PerfOption::set_max_samples(self.profile.max_samples)?,
            PerfOption::set_interval(self.profile.sample_interval)?,
            PerfOption::set_window(start, end),
            PerfOption::set_metrics(self.profile.metrics(self.kind)),
            PerfOption::set_instance(self.profile.instance.clone()),
        ];
        let query = PerfQuery::new(options);

        debug!(
            kind = %self.kind,
            start = %start,
            end = %end,
            metrics = query.metrics().len(),
            "planned perf query"
        );

        Ok(PlannedQuery {
            kind: self.kind,
            query,
            window_end: end,
        })
    }

    /// Advances the window once the planned query was executed successfully.
    pub fn commit(&mut self, planned: &PlannedQuery) {
        self.window.commit(planned.window_end);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::MockClock;
    use crate::profile::ProfilesConfig;
    use chrono::TimeZone;

    fn start_time() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 1, 8, 0, 0).unwrap()
    }

    #[test]
    fn test_fresh_window_looks_back_five_minutes() {
        let clock = Arc::new(MockClock::with_time(start_time()));
        let window = SlidingWindow::new(clock, TimeDelta::minutes(10));

        let (start, end) = window.next_window();
        assert_eq!(end, start_time());
        assert_eq!(start, start_time() - TimeDelta::minutes(5));
    }

    #[test]
    fn test_window_capped_by_max_window() {
        let clock = Arc::new(MockClock::with_time(start_time()));
        let window = SlidingWindow::new(clock.clone(), TimeDelta::minutes(2));

        let (start, end) = window.next_window();
        assert_eq!(end - start, TimeDelta::minutes(2));

        clock.advance(TimeDelta::hours(1));
        let (start, end) = window.next_window();
        assert_eq!(end, start_time() + TimeDelta::hours(1));
        assert_eq!(end - start, TimeDelta::minutes(2));
    }

    #[test]
    fn test_window_resumes_from_last_commit() {
        let clock = Arc::new(MockClock::with_time(start_time()));
        let mut window = SlidingWindow::new(clock.clone(), TimeDelta::minutes(5));

        let (_, end) = window.next_window();
        window.commit(end);
        clock.advance(TimeDelta::seconds(60));

        let (start, end) = window.next_window();
        assert_eq!(start, start_time());
        assert_eq!(end, start_time() + TimeDelta::seconds(60));
    }

    #[test]
    fn test_oversized_max_window_falls_back_to_last_commit() {
        let clock = Arc::new(MockClock::with_time(start_time()));
        let window = SlidingWindow::new(clock, TimeDelta::MAX);

        let (start, end) = window.next_window();
        assert_eq!(end, start_time());
        assert_eq!(start, start_time() - TimeDelta::minutes(5));
    }

    #[test]
    fn test_plan_with_huge_configured_window() {
        let config = ProfilesConfig::from_yaml("host_perf:\n  max_sample_window: 100000000d\n")
            .unwrap();
        let clock = Arc::new(MockClock::with_time(start_time()));
        let planner = QueryPlanner::new(
            SensorKind::Host,
            config.profile(SensorKind::Host).clone(),
            clock,
        );

        let planned = planner.plan().unwrap();
        assert_eq!(
            planned.query.window(),
            Some((start_time() - TimeDelta::minutes(5), start_time()))
        );
    }

    #[test]
    fn test_commit_never_moves_backwards() {
        let clock = Arc::new(MockClock::with_time(start_time()));
        let mut window = SlidingWindow::new(clock, TimeDelta::minutes(5));

        window.commit(start_time());
        window.commit(start_time() - TimeDelta::minutes(1));
        assert_eq!(window.last_query_end(), start_time());
    }

    #[test]
    fn test_plan_uses_profile() {
        let clock = Arc::new(MockClock::with_time(start_time()));
        let profile = PerfProfile {
            instance: "vmnic0".to_string(),
            default_metrics: false,
            extra_metrics: vec!["net.bytesRx.average".to_string()],
            ..PerfProfile::default()
        };
        let planner = QueryPlanner::new(SensorKind::Host, profile, clock);

        let planned = planner.plan().unwrap();
        assert_eq!(planned.kind, SensorKind::Host);
        assert_eq!(planned.window_end, start_time());

        let query = &planned.query;
        assert_eq!(query.max_samples(), 20);
        assert_eq!(query.sample_interval(), Some(TimeDelta::seconds(20)));
        assert_eq!(query.instance(), "vmnic0");
        assert_eq!(query.metrics(), ["net.bytesRx.average".to_string()]);
        assert_eq!(
            query.window(),
            Some((start_time() - TimeDelta::minutes(5), start_time()))
        );
    }

    #[test]
    fn test_plan_advances_only_after_commit() {
        let clock = Arc::new(MockClock::with_time(start_time()));
        let mut planner = QueryPlanner::new(
            SensorKind::VirtualMachine,
            PerfProfile::default(),
            clock.clone(),
        );

        let first = planner.plan().unwrap();
        clock.advance(TimeDelta::seconds(30));

        // not committed: the window still reaches back to the initial lookback
        let retry = planner.plan().unwrap();
        assert_eq!(
            retry.query.window().map(|(start, _)| start),
            Some(start_time() - TimeDelta::minutes(4) - TimeDelta::seconds(30))
        );

        planner.commit(&first);
        let next = planner.plan().unwrap();
        assert_eq!(
            next.query.window(),
            Some((start_time(), start_time() + TimeDelta::seconds(30)))
        );
    }
}

//! Builder for time-windowed performance metric queries.
//!
//! A [`PerfQuery`] is assembled from [`PerfOption`] values applied in order
//! and rendered into the [`RequestSpec`] consumed by the metrics service
//! client. The [`aggregate`] helpers reduce the returned sample values.

pub mod aggregate;
pub mod clock;
mod errors;
pub mod planner;
pub mod profile;
mod query;
mod request_spec;

pub use aggregate::{all_true, average, sum, Numeric};
pub use clock::{Clock, MockClock, SystemClock};
pub use errors::{PerfQueryError, Result};
pub use planner::{PlannedQuery, QueryPlanner, SlidingWindow};
pub use profile::{load_profiles, parse_duration, PerfProfile, ProfilesConfig, SensorKind};
pub use query::{PerfOption, PerfQuery, PerfQueryBuilder, ALL_INSTANCES, DEFAULT_MAX_SAMPLES};
pub use request_spec::{PerfMetricId, RequestSpec};

//! Actual-vs-expected arithmetic for completed jobs.
//!
//! The expected duration of a job is the `production_time` of the controller family that was
//! assigned to the job's line at `job_date`. Resolving that assignment is a query
//! (see [`crate::db::handlers::Efficiency`]); this module only does the numbers.

use chrono::{DateTime, NaiveTime, Utc};

use crate::datetime::clock_time_seconds;

/// Actual and expected duration of one job, in whole seconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Durations {
    pub actual_seconds: i64,
    pub expected_seconds: i64,
}

impl Durations {
    pub fn measure(start_time: DateTime<Utc>, end_time: DateTime<Utc>, production_time: NaiveTime) -> Self {
        Self {
            actual_seconds: (end_time - start_time).num_seconds(),
            expected_seconds: clock_time_seconds(production_time),
        }
    }

    pub fn actual_minutes(&self) -> f64 {
        round2(self.actual_seconds as f64 / 60.0)
    }

    pub fn expected_minutes(&self) -> f64 {
        round2(self.expected_seconds as f64 / 60.0)
    }

    /// Positive when the job ran over its baseline
    pub fn deviation_seconds(&self) -> i64 {
        self.actual_seconds - self.expected_seconds
    }

    /// `expected / actual`: above 1.0 the operator beat the baseline. `None` for zero-length jobs.
    pub fn efficiency(&self) -> Option<f64> {
        (self.actual_seconds > 0).then(|| round2(self.expected_seconds as f64 / self.actual_seconds as f64))
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn durations(actual: i64, production: &str) -> Durations {
        let start = Utc::now();
        let production = NaiveTime::parse_from_str(production, "%H:%M:%S").unwrap();
        Durations::measure(start, start + Duration::seconds(actual), production)
    }

    #[test]
    fn test_production_time_as_seconds() {
        let d = durations(6000, "01:30:00");
        assert_eq!(d.expected_seconds, 5400);
        assert_eq!(d.actual_seconds, 6000);
        assert_eq!(d.deviation_seconds(), 600);
    }

    #[test]
    fn test_minutes_rounded_to_two_places() {
        let d = durations(100, "00:00:50");
        assert_eq!(d.actual_minutes(), 1.67);
        assert_eq!(d.expected_minutes(), 0.83);
    }

    #[test]
    fn test_efficiency_ratio() {
        assert_eq!(durations(2700, "01:30:00").efficiency(), Some(2.0));
        assert_eq!(durations(5400, "01:30:00").efficiency(), Some(1.0));
        assert_eq!(durations(0, "01:30:00").efficiency(), None);
    }
}

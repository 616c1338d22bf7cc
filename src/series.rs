//! Per-method call count series across ticks.

use serde::{Deserialize, Serialize};

use crate::Report;

pub const DEFAULT_TICK_LABEL_PREFIX: &str = "Tick";

/// Turns a tick number into a presentation label.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TickLabeler {
    prefix: String,
}

impl TickLabeler {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }

    pub fn label(&self, tick: u64) -> String {
        if self.prefix.is_empty() {
            return tick.to_string();
        }
        format!("{} {tick}", self.prefix)
    }
}

impl Default for TickLabeler {
    fn default() -> Self {
        Self::new(DEFAULT_TICK_LABEL_PREFIX)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SeriesPoint {
    pub label: String,
    pub tick: u64,
    pub count: u64,
    /// Count strictly above the report's excessive-call threshold.
    pub excessive: bool,
    pub problem_tick: bool,
}

/// Call counts for one method, one point per tick, in tick order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MethodSeries {
    pub method: String,
    pub points: Vec<SeriesPoint>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SeriesStats {
    pub total_calls: u64,
    pub max_calls: u64,
    pub avg_calls_per_tick: f64,
    /// Ticks in which the method was called at all.
    pub active_ticks: usize,
    pub excessive_ticks: usize,
}

impl MethodSeries {
    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn labels(&self) -> Vec<String> {
        self.points.iter().map(|p| p.label.clone()).collect()
    }

    pub fn counts(&self) -> Vec<u64> {
        self.points.iter().map(|p| p.count).collect()
    }

    pub fn stats(&self) -> SeriesStats {
        let mut total = 0u64;
        let mut max = 0u64;
        let mut active = 0usize;
        let mut excessive = 0usize;
        for p in &self.points {
            total = total.saturating_add(p.count);
            max = max.max(p.count);
            if p.count > 0 {
                active += 1;
            }
            if p.excessive {
                excessive += 1;
            }
        }
        let avg = if self.points.is_empty() {
            0.0
        } else {
            total as f64 / self.points.len() as f64
        };
        SeriesStats {
            total_calls: total,
            max_calls: max,
            avg_calls_per_tick: avg,
            active_ticks: active,
            excessive_ticks: excessive,
        }
    }
}

pub fn extract_series(report: &Report, method: &str) -> MethodSeries {
    extract_series_with(report, method, &TickLabeler::default())
}

/// Projects `method` onto every tick of the report.
///
/// Ticks that do not mention the method contribute a zero, so the result
/// always has exactly one point per tick, even for a method the report never
/// saw.
pub fn extract_series_with(report: &Report, method: &str, labeler: &TickLabeler) -> MethodSeries {
    let threshold = report.metadata.excessive_call_threshold;
    let points: Vec<SeriesPoint> = report
        .ticks
        .iter()
        .map(|tick| {
            let count = tick.method_counts.count(method);
            SeriesPoint {
                label: labeler.label(tick.tick),
                tick: tick.tick,
                count,
                excessive: count as f64 > threshold,
                problem_tick: tick.is_problem_tick,
            }
        })
        .collect();
    tracing::debug!(method, points = points.len(), "extracted method series");
    MethodSeries {
        method: method.to_string(),
        points,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::{report, report_json_from_ticks, two_tick_report};
    use proptest::prelude::*;

    #[test]
    fn zero_fills_ticks_without_the_method() {
        let report = two_tick_report();
        assert_eq!(extract_series(&report, "a").counts(), vec![3, 0]);
        assert_eq!(extract_series(&report, "b").counts(), vec![0, 5]);
    }

    #[test]
    fn unknown_method_gives_all_zero_series() {
        let report = two_tick_report();
        let series = extract_series(&report, "c");
        assert_eq!(series.counts(), vec![0, 0]);
        assert_eq!(series.method, "c");
    }

    #[test]
    fn labels_follow_tick_order() {
        let series = extract_series(&report(), "net.minecraft.Entity.tick");
        assert_eq!(series.labels(), vec!["Tick 0", "Tick 1", "Tick 2"]);
        assert_eq!(series.counts(), vec![400, 1500, 200]);
    }

    #[test]
    fn custom_label_prefix() {
        let series = extract_series_with(&two_tick_report(), "a", &TickLabeler::new("t"));
        assert_eq!(series.labels(), vec!["t 0", "t 1"]);
        let bare = extract_series_with(&two_tick_report(), "a", &TickLabeler::new(""));
        assert_eq!(bare.labels(), vec!["0", "1"]);
    }

    #[test]
    fn flags_excessive_and_problem_ticks() {
        let series = extract_series(&report(), "net.minecraft.Entity.tick");
        let excessive: Vec<bool> = series.points.iter().map(|p| p.excessive).collect();
        let problem: Vec<bool> = series.points.iter().map(|p| p.problem_tick).collect();
        assert_eq!(excessive, vec![false, true, false]);
        assert_eq!(problem, vec![false, true, false]);
    }

    #[test]
    fn threshold_is_exclusive() {
        let mut doc = crate::testutil::two_tick_report_json();
        doc["metadata"]["excessive_call_threshold"] = serde_json::json!(5);
        let report = crate::Report::from_value(doc).expect("report");
        let series = extract_series(&report, "b");
        assert!(!series.points[1].excessive);
    }

    #[test]
    fn stats_summarize_the_series() {
        let stats = extract_series(&report(), "net.minecraft.World.getBlockState").stats();
        assert_eq!(stats.total_calls, 210);
        assert_eq!(stats.max_calls, 120);
        assert_eq!(stats.active_ticks, 2);
        assert_eq!(stats.excessive_ticks, 0);
        assert!((stats.avg_calls_per_tick - 70.0).abs() < f64::EPSILON);
    }

    #[test]
    fn empty_report_gives_empty_series() {
        let mut doc = crate::testutil::two_tick_report_json();
        doc["ticks"] = serde_json::json!([]);
        let report = crate::Report::from_value(doc).expect("report");
        let series = extract_series(&report, "a");
        assert!(series.is_empty());
        assert_eq!(series.stats().avg_calls_per_tick, 0.0);
    }

    fn arb_ticks() -> impl Strategy<Value = Vec<(u64, Vec<(String, u64)>)>> {
        prop::collection::vec(
            (1u64..4, prop::collection::vec(("[abc]", 0u64..1000), 0..4)),
            0..8,
        )
        .prop_map(|gaps| {
            let mut tick = 0u64;
            gaps.into_iter()
                .map(|(gap, counts)| {
                    tick += gap;
                    (tick, counts)
                })
                .collect()
        })
    }

    proptest! {
        #[test]
        fn prop_series_has_one_point_per_tick(ticks in arb_ticks(), method in "[a-d]") {
            let report = crate::Report::from_value(report_json_from_ticks(&ticks)).expect("report");
            let series = extract_series(&report, &method);
            prop_assert_eq!(series.len(), report.ticks.len());
        }

        #[test]
        fn prop_series_matches_recorded_counts(ticks in arb_ticks(), method in "[abc]") {
            let report = crate::Report::from_value(report_json_from_ticks(&ticks)).expect("report");
            let series = extract_series(&report, &method);
            for (tick, point) in report.ticks.iter().zip(&series.points) {
                prop_assert_eq!(point.tick, tick.tick);
                if tick.method_counts.contains(&method) {
                    prop_assert_eq!(point.count, tick.method_counts.count(&method));
                } else {
                    prop_assert_eq!(point.count, 0);
                }
            }
        }
    }
}

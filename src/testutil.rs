//! Report fixtures shared by unit tests.

use serde_json::{Value, json};

use std::sync::Arc;

use crate::{Report, ReportId, ReportSnapshot};

pub fn report_json() -> Value {
    json!({
        "server_name": "survival-1",
        "server_version": "1.20.4-paper",
        "metadata": {
            "sampling_rate_ms": 50,
            "excessive_call_threshold": 1000,
            "method_filters": ["net.minecraft"]
        },
        "summary": {
            "unique_method_count": 3,
            "avg_calls_per_tick": 812.5,
            "top_methods": [
                {
                    "method_name": "net.minecraft.Entity.tick",
                    "avg_calls_per_tick": 700.0,
                    "max_calls": 1500,
                    "total_calls": 2100
                },
                {
                    "method_name": "net.minecraft.World.getBlockState",
                    "avg_calls_per_tick": 100.0,
                    "max_calls": 120,
                    "total_calls": 300
                }
            ]
        },
        "ticks": [
            {
                "tick": 0,
                "timestamp": 1700000000000i64,
                "tick_duration_ms": 42.5,
                "method_counts": {
                    "net.minecraft.Entity.tick": 400,
                    "net.minecraft.World.getBlockState": 90
                },
                "method_trends": { "net.minecraft.Entity.tick": 0.0 },
                "is_problem_tick": false
            },
            {
                "tick": 1,
                "timestamp": 1700000000050i64,
                "tick_duration_ms": 61.0,
                "method_counts": {
                    "net.minecraft.Entity.tick": 1500,
                    "org.bukkit.Scheduler.run": 12
                },
                "method_trends": { "net.minecraft.Entity.tick": 2.75 },
                "is_problem_tick": true
            },
            {
                "tick": 2,
                "timestamp": 1700000000100i64,
                "tick_duration_ms": 38.25,
                "method_counts": {
                    "net.minecraft.Entity.tick": 200,
                    "net.minecraft.World.getBlockState": 120
                },
                "method_trends": {},
                "is_problem_tick": false
            }
        ]
    })
}

/// Two ticks with disjoint methods: tick 0 calls `a` three times, tick 1
/// calls `b` five times.
pub fn two_tick_report_json() -> Value {
    json!({
        "server_name": "s",
        "server_version": "v",
        "metadata": {
            "sampling_rate_ms": 50,
            "excessive_call_threshold": 4,
            "method_filters": []
        },
        "summary": {
            "unique_method_count": 2,
            "avg_calls_per_tick": 4.0,
            "top_methods": []
        },
        "ticks": [
            {
                "tick": 0,
                "timestamp": 0,
                "tick_duration_ms": 50,
                "method_counts": { "a": 3 },
                "method_trends": {},
                "is_problem_tick": false
            },
            {
                "tick": 1,
                "timestamp": 50,
                "tick_duration_ms": 50,
                "method_counts": { "b": 5 },
                "method_trends": {},
                "is_problem_tick": true
            }
        ]
    })
}

pub fn report() -> Report {
    Report::from_value(report_json()).expect("fixture report")
}

pub fn two_tick_report() -> Report {
    Report::from_value(two_tick_report_json()).expect("fixture report")
}

pub fn snapshot(value: Value) -> ReportSnapshot {
    let bytes = serde_json::to_vec(&value).expect("fixture bytes");
    ReportSnapshot {
        id: ReportId::from_bytes(&bytes),
        source: None,
        report: Arc::new(Report::from_value(value).expect("fixture report")),
    }
}

/// Builds a report JSON document from per-tick `(tick, counts)` pairs.
pub fn report_json_from_ticks(ticks: &[(u64, Vec<(String, u64)>)]) -> Value {
    let ticks: Vec<Value> = ticks
        .iter()
        .map(|(tick, counts)| {
            let counts: serde_json::Map<String, Value> = counts
                .iter()
                .map(|(m, c)| (m.clone(), json!(c)))
                .collect();
            json!({
                "tick": tick,
                "timestamp": tick * 50,
                "tick_duration_ms": 50,
                "method_counts": counts,
                "method_trends": {},
                "is_problem_tick": false
            })
        })
        .collect();
    json!({
        "server_name": "prop",
        "server_version": "0",
        "metadata": {
            "sampling_rate_ms": 50,
            "excessive_call_threshold": 10,
            "method_filters": []
        },
        "summary": {
            "unique_method_count": 0,
            "avg_calls_per_tick": 0,
            "top_methods": []
        },
        "ticks": ticks
    })
}

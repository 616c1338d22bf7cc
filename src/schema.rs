//! Report schema introspection for exporters and tooling.

use serde::Serialize;

use crate::MediaType;

#[derive(Debug, Clone, Serialize)]
pub struct SchemaDoc {
    #[serde(rename = "schemaVersion")]
    pub schema_version: String,
    #[serde(rename = "mediaTypes")]
    pub media_types: Vec<MediaTypeDoc>,
    #[serde(rename = "requiredTopLevelKeys")]
    pub required_top_level_keys: Vec<&'static str>,
    #[serde(rename = "requiredMetadataKeys")]
    pub required_metadata_keys: Vec<&'static str>,
    #[serde(rename = "requiredSummaryKeys")]
    pub required_summary_keys: Vec<&'static str>,
    #[serde(rename = "requiredTopMethodKeys")]
    pub required_top_method_keys: Vec<&'static str>,
    #[serde(rename = "requiredTickKeys")]
    pub required_tick_keys: Vec<&'static str>,
    #[serde(rename = "minimalExample")]
    pub minimal_example: serde_json::Value,
}

#[derive(Debug, Clone, Serialize)]
pub struct MediaTypeDoc {
    pub mime: &'static str,
    pub extensions: Vec<&'static str>,
    pub supported: bool,
}

pub fn schema_doc() -> SchemaDoc {
    SchemaDoc {
        schema_version: "callfreq.schema_doc.v1".to_string(),
        media_types: vec![
            MediaTypeDoc {
                mime: MediaType::Json.mime(),
                extensions: vec![".json"],
                supported: true,
            },
            MediaTypeDoc {
                mime: MediaType::OctetStream.mime(),
                extensions: vec![".bin", ".data"],
                supported: false,
            },
        ],
        required_top_level_keys: vec![
            "server_name",
            "server_version",
            "metadata",
            "summary",
            "ticks",
        ],
        required_metadata_keys: vec![
            "sampling_rate_ms",
            "excessive_call_threshold",
            "method_filters",
        ],
        required_summary_keys: vec!["unique_method_count", "avg_calls_per_tick", "top_methods"],
        required_top_method_keys: vec![
            "method_name",
            "avg_calls_per_tick",
            "max_calls",
            "total_calls",
        ],
        required_tick_keys: vec![
            "tick",
            "timestamp",
            "tick_duration_ms",
            "method_counts",
            "method_trends",
            "is_problem_tick",
        ],
        minimal_example: serde_json::json!({
            "server_name": "survival-1",
            "server_version": "1.20.4",
            "metadata": {
                "sampling_rate_ms": 50,
                "excessive_call_threshold": 1000,
                "method_filters": []
            },
            "summary": {
                "unique_method_count": 1,
                "avg_calls_per_tick": 12.0,
                "top_methods": [
                    {
                        "method_name": "net.minecraft.Entity.tick",
                        "avg_calls_per_tick": 12.0,
                        "max_calls": 12,
                        "total_calls": 12
                    }
                ]
            },
            "ticks": [
                {
                    "tick": 0,
                    "timestamp": 1700000000000i64,
                    "tick_duration_ms": 48.5,
                    "method_counts": { "net.minecraft.Entity.tick": 12 },
                    "method_trends": { "net.minecraft.Entity.tick": 0.0 },
                    "is_problem_tick": false
                }
            ]
        }),
    }
}

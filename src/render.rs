//! Render requests handed to a presentation layer.

use serde::Serialize;
use serde_json::Value;

use crate::{CallfreqResult, MethodSeries, ReportSnapshot};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CatalogRender {
    /// Filtered catalog, in catalog order.
    pub methods: Vec<String>,
    pub selected: Option<String>,
    pub filter: String,
    /// Size of the unfiltered catalog.
    pub total: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartSeries {
    pub label: String,
    pub points: Vec<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartRender {
    pub labels: Vec<String>,
    pub series: Vec<ChartSeries>,
}

impl ChartRender {
    pub fn from_series(series: &MethodSeries) -> Self {
        Self {
            labels: series.labels(),
            series: vec![ChartSeries {
                label: format!("Calls per tick for {}", series.method),
                points: series.points.iter().map(|p| p.count as f64).collect(),
            }],
        }
    }
}

/// Report provenance plus the `summary` and `metadata` objects as submitted,
/// unknown fields and number formatting included.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SummaryRender {
    pub server_name: String,
    pub server_version: String,
    pub tick_count: usize,
    pub metadata: Value,
    pub summary: Value,
}

impl SummaryRender {
    pub fn from_snapshot(snapshot: &ReportSnapshot) -> Self {
        let report = snapshot.report();
        Self {
            server_name: report.server_name.clone(),
            server_version: report.server_version.clone(),
            tick_count: report.tick_count(),
            metadata: report.raw.metadata.clone(),
            summary: report.raw.summary.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum StatusRender {
    Empty,
    Loading {
        ticket: u64,
    },
    Loaded {
        report_id: String,
        source: Option<String>,
        /// Most recent rejected replacement, if the previous report was kept.
        last_failure: Option<String>,
    },
    Error {
        kind: String,
        message: String,
    },
}

/// Consumer of render requests (a terminal, a web page, a test recorder).
pub trait PresentationSink {
    fn render_status(&mut self, status: &StatusRender) -> CallfreqResult<()>;

    fn render_summary(&mut self, summary: &SummaryRender) -> CallfreqResult<()>;

    fn render_catalog(&mut self, catalog: &CatalogRender) -> CallfreqResult<()>;

    fn render_chart(&mut self, chart: &ChartRender) -> CallfreqResult<()>;
}

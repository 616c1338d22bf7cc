//! Memoization of derived views, keyed by report identity.

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

use crate::{
    MethodCatalog, MethodSeries, ReportId, ReportSnapshot, TickLabeler, all_methods,
    extract_series_with,
};

/// Series kept per report. Older selections are evicted first.
pub const MAX_CACHED_SERIES: usize = 16;

/// Caches the catalog per report and series per (report, method).
///
/// Entries for any other report are dropped the first time a new report is
/// seen, so a replaced report can never leak stale derivations. At most
/// [`MAX_CACHED_SERIES`] series are held at once.
#[derive(Debug, Default)]
pub struct DerivedCache {
    enabled: bool,
    labeler: TickLabeler,
    report: Option<ReportId>,
    catalog: Option<Arc<MethodCatalog>>,
    series: HashMap<String, Arc<MethodSeries>>,
    /// Insertion order of `series`, oldest first.
    series_order: VecDeque<String>,
    hits: u64,
    misses: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub cached_series: usize,
}

impl DerivedCache {
    pub fn new(enabled: bool, labeler: TickLabeler) -> Self {
        Self {
            enabled,
            labeler,
            ..Self::default()
        }
    }

    pub fn catalog(&mut self, snapshot: &ReportSnapshot) -> Arc<MethodCatalog> {
        if !self.enabled {
            return Arc::new(all_methods(&snapshot.report));
        }
        self.retarget(snapshot);
        if let Some(catalog) = &self.catalog {
            self.hits += 1;
            return Arc::clone(catalog);
        }
        self.misses += 1;
        let catalog = Arc::new(all_methods(&snapshot.report));
        self.catalog = Some(Arc::clone(&catalog));
        catalog
    }

    pub fn series(&mut self, snapshot: &ReportSnapshot, method: &str) -> Arc<MethodSeries> {
        if !self.enabled {
            return Arc::new(extract_series_with(&snapshot.report, method, &self.labeler));
        }
        self.retarget(snapshot);
        if let Some(series) = self.series.get(method) {
            self.hits += 1;
            return Arc::clone(series);
        }
        self.misses += 1;
        let series = Arc::new(extract_series_with(&snapshot.report, method, &self.labeler));
        if self.series_order.len() >= MAX_CACHED_SERIES
            && let Some(oldest) = self.series_order.pop_front()
        {
            self.series.remove(&oldest);
        }
        self.series_order.push_back(method.to_string());
        self.series.insert(method.to_string(), Arc::clone(&series));
        series
    }

    pub fn clear(&mut self) {
        self.report = None;
        self.catalog = None;
        self.series.clear();
        self.series_order.clear();
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits,
            misses: self.misses,
            cached_series: self.series.len(),
        }
    }

    fn retarget(&mut self, snapshot: &ReportSnapshot) {
        if self.report.as_ref() == Some(&snapshot.id) {
            return;
        }
        tracing::debug!(report = snapshot.id.short(), "derived cache retargeted");
        self.clear();
        self.report = Some(snapshot.id.clone());
    }
}

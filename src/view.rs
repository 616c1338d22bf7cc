//! Interactive view state: which report is loaded, which method is selected,
//! and what the catalog filter is.
//!
//! Ingestion is a suspension point. [`ViewModel::submit`] enters `Loading`
//! synchronously and hands back an [`IngestTicket`]; whoever performs the
//! decode later reports the outcome with [`ViewModel::complete`]. Only the
//! ticket of the in-flight ingestion can change visible state.

use serde::Serialize;

use std::fmt;
use std::sync::Arc;

use crate::{
    Blob, CallfreqError, CallfreqResult, CatalogRender, ChartRender, Config, DerivedCache,
    IngestError, MethodSeries, PresentationSink, ReportSnapshot, StatusRender, SummaryRender,
    TickLabeler, ViewError, ingest,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct IngestTicket(u64);

impl IngestTicket {
    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for IngestTicket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct LoadedView {
    pub snapshot: ReportSnapshot,
    pub selected_method: Option<String>,
    pub filter_query: String,
    pub last_failure: Option<IngestError>,
}

impl LoadedView {
    fn fresh(snapshot: ReportSnapshot) -> Self {
        Self {
            snapshot,
            selected_method: None,
            filter_query: String::new(),
            last_failure: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ViewState {
    Empty,
    Loading {
        ticket: IngestTicket,
        /// The view being replaced; restored if the replacement fails.
        previous: Option<Box<LoadedView>>,
    },
    Loaded(LoadedView),
    Error(IngestError),
}

impl ViewState {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Empty => "empty",
            Self::Loading { .. } => "loading",
            Self::Loaded(_) => "loaded",
            Self::Error(_) => "error",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ViewEvent {
    Submit,
    IngestOk {
        ticket: IngestTicket,
        snapshot: ReportSnapshot,
    },
    IngestFail {
        ticket: IngestTicket,
        error: IngestError,
    },
    SelectMethod(String),
    SetFilter(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Completion {
    Applied,
    /// The ticket was not the in-flight one; nothing changed.
    Stale,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Submitted(IngestTicket),
    Completed(Completion),
    Updated,
}

#[derive(Debug)]
pub struct ViewModel {
    state: ViewState,
    next_ticket: u64,
    cache: DerivedCache,
}

impl Default for ViewModel {
    fn default() -> Self {
        Self::new(&Config::default())
    }
}

impl ViewModel {
    pub fn new(config: &Config) -> Self {
        Self {
            state: ViewState::Empty,
            next_ticket: 1,
            cache: DerivedCache::new(config.memoize, TickLabeler::new(&config.tick_label_prefix)),
        }
    }

    pub fn state(&self) -> &ViewState {
        &self.state
    }

    pub fn loaded(&self) -> Option<&LoadedView> {
        match &self.state {
            ViewState::Loaded(view) => Some(view),
            _ => None,
        }
    }

    pub fn cache(&self) -> &DerivedCache {
        &self.cache
    }

    pub fn handle(&mut self, event: ViewEvent) -> Result<Outcome, ViewError> {
        match event {
            ViewEvent::Submit => self.submit().map(Outcome::Submitted),
            ViewEvent::IngestOk { ticket, snapshot } => {
                Ok(Outcome::Completed(self.complete(ticket, Ok(snapshot))))
            }
            ViewEvent::IngestFail { ticket, error } => {
                Ok(Outcome::Completed(self.complete(ticket, Err(error))))
            }
            ViewEvent::SelectMethod(method) => self.select_method(method).map(|()| Outcome::Updated),
            ViewEvent::SetFilter(query) => self.set_filter(query).map(|()| Outcome::Updated),
        }
    }

    /// Starts an ingestion. Rejected while another one is in flight.
    pub fn submit(&mut self) -> Result<IngestTicket, ViewError> {
        let previous = match std::mem::replace(&mut self.state, ViewState::Empty) {
            ViewState::Loading { ticket, previous } => {
                tracing::warn!(in_flight = ticket.get(), "submit rejected: ingestion in flight");
                self.state = ViewState::Loading { ticket, previous };
                return Err(ViewError::Busy(ticket.get()));
            }
            ViewState::Loaded(view) => Some(Box::new(view)),
            ViewState::Empty | ViewState::Error(_) => None,
        };

        let ticket = IngestTicket(self.next_ticket);
        self.next_ticket = self.next_ticket.saturating_add(1);
        tracing::debug!(ticket = ticket.get(), replacing = previous.is_some(), "submit");
        self.state = ViewState::Loading { ticket, previous };
        Ok(ticket)
    }

    /// Applies the outcome of the ingestion identified by `ticket`.
    ///
    /// A failed replacement restores the previous report, untouched apart from
    /// `last_failure`. A failure with nothing to restore moves to `Error`.
    pub fn complete(
        &mut self,
        ticket: IngestTicket,
        result: Result<ReportSnapshot, IngestError>,
    ) -> Completion {
        let previous = match std::mem::replace(&mut self.state, ViewState::Empty) {
            ViewState::Loading {
                ticket: in_flight,
                previous,
            } if in_flight == ticket => previous,
            other => {
                tracing::warn!(
                    ticket = ticket.get(),
                    state = other.name(),
                    "ignoring stale ingestion completion"
                );
                self.state = other;
                return Completion::Stale;
            }
        };
        self.state = match (result, previous) {
            (Ok(snapshot), _) => ViewState::Loaded(LoadedView::fresh(snapshot)),
            (Err(error), Some(previous)) => {
                let mut view = *previous;
                view.last_failure = Some(error);
                ViewState::Loaded(view)
            }
            (Err(error), None) => ViewState::Error(error),
        };
        tracing::debug!(ticket = ticket.get(), state = self.state.name(), "ingestion completed");
        Completion::Applied
    }

    /// Submits `blob`, decodes it on the spot, and completes the ingestion.
    pub fn submit_blob(&mut self, blob: &Blob) -> Result<Completion, ViewError> {
        let ticket = self.submit()?;
        Ok(self.complete(ticket, ingest(blob)))
    }

    /// Selects a method. It need not appear in the catalog or in any tick.
    pub fn select_method(&mut self, method: impl Into<String>) -> Result<(), ViewError> {
        let view = self.loaded_mut()?;
        view.selected_method = Some(method.into());
        Ok(())
    }

    pub fn clear_selection(&mut self) -> Result<(), ViewError> {
        self.loaded_mut()?.selected_method = None;
        Ok(())
    }

    /// Updates the catalog filter. The selection is left alone.
    pub fn set_filter(&mut self, query: impl Into<String>) -> Result<(), ViewError> {
        self.loaded_mut()?.filter_query = query.into();
        Ok(())
    }

    /// Selects the method ranked `rank` (zero-based) in the report's top list.
    pub fn select_top_method(&mut self, rank: usize) -> CallfreqResult<String> {
        let view = self.loaded_mut()?;
        let top = &view.snapshot.report.summary.top_methods;
        let Some(entry) = top.get(rank) else {
            return Err(CallfreqError::InvalidArgument(format!(
                "top method rank {rank} out of range (report lists {})",
                top.len()
            )));
        };
        let method = entry.method_name.clone();
        view.selected_method = Some(method.clone());
        Ok(method)
    }

    pub fn status(&self) -> StatusRender {
        match &self.state {
            ViewState::Empty => StatusRender::Empty,
            ViewState::Loading { ticket, .. } => StatusRender::Loading {
                ticket: ticket.get(),
            },
            ViewState::Loaded(view) => StatusRender::Loaded {
                report_id: view.snapshot.id.to_string(),
                source: view.snapshot.source.clone(),
                last_failure: view.last_failure.as_ref().map(ToString::to_string),
            },
            ViewState::Error(error) => StatusRender::Error {
                kind: error.kind().to_string(),
                message: error.to_string(),
            },
        }
    }

    pub fn summary_view(&self) -> Option<SummaryRender> {
        self.loaded()
            .map(|view| SummaryRender::from_snapshot(&view.snapshot))
    }

    pub fn catalog_view(&mut self) -> Option<CatalogRender> {
        let ViewState::Loaded(view) = &self.state else {
            return None;
        };
        let catalog = self.cache.catalog(&view.snapshot);
        let methods = crate::filter_methods(&catalog, &view.filter_query)
            .into_iter()
            .map(str::to_string)
            .collect();
        Some(CatalogRender {
            methods,
            selected: view.selected_method.clone(),
            filter: view.filter_query.clone(),
            total: catalog.len(),
        })
    }

    pub fn series_view(&mut self) -> Option<Arc<MethodSeries>> {
        let ViewState::Loaded(view) = &self.state else {
            return None;
        };
        let method = view.selected_method.as_deref()?;
        Some(self.cache.series(&view.snapshot, method))
    }

    pub fn chart_view(&mut self) -> Option<ChartRender> {
        self.series_view()
            .map(|series| ChartRender::from_series(&series))
    }

    /// Pushes every render request the current state supports to `sink`.
    pub fn render<S: PresentationSink + ?Sized>(&mut self, sink: &mut S) -> CallfreqResult<()> {
        sink.render_status(&self.status())?;
        if let Some(summary) = self.summary_view() {
            sink.render_summary(&summary)?;
        }
        if let Some(catalog) = self.catalog_view() {
            sink.render_catalog(&catalog)?;
        }
        if let Some(chart) = self.chart_view() {
            sink.render_chart(&chart)?;
        }
        Ok(())
    }

    fn loaded_mut(&mut self) -> Result<&mut LoadedView, ViewError> {
        match &mut self.state {
            ViewState::Loaded(view) => Ok(view),
            other => Err(ViewError::NotLoaded(other.name())),
        }
    }
}

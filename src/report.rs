//! Method call frequency report model and structural validation.

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use std::collections::BTreeMap;

use crate::IngestError;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Report {
    pub server_name: String,
    pub server_version: String,
    pub metadata: SamplingMetadata,
    pub summary: SummaryStatistics,
    /// Strictly ascending by `tick`.
    pub ticks: Vec<Tick>,
    /// `metadata` and `summary` exactly as submitted.
    #[serde(skip)]
    pub raw: RawSections,
}

/// Untyped copies of the sections that are handed to presentation verbatim.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawSections {
    pub metadata: Value,
    pub summary: Value,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SamplingMetadata {
    pub sampling_rate_ms: f64,
    pub excessive_call_threshold: f64,
    pub method_filters: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SummaryStatistics {
    pub unique_method_count: u64,
    pub avg_calls_per_tick: f64,
    /// Upstream top-K, ranked by `total_calls`. Kept verbatim, never checked
    /// against the per-tick data.
    pub top_methods: Vec<TopMethod>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TopMethod {
    pub method_name: String,
    pub avg_calls_per_tick: f64,
    pub max_calls: u64,
    pub total_calls: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Tick {
    pub tick: u64,
    pub timestamp: i64,
    pub tick_duration_ms: f64,
    pub method_counts: MethodCounts,
    pub method_trends: BTreeMap<String, f64>,
    pub is_problem_tick: bool,
}

/// Per-tick call counts keyed by method identifier.
///
/// A method that has no entry was not called during the tick: [`MethodCounts::count`]
/// answers `0` for it, so readers never need their own default.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct MethodCounts(BTreeMap<String, u64>);

impl MethodCounts {
    pub fn count(&self, method: &str) -> u64 {
        self.0.get(method).copied().unwrap_or(0)
    }

    pub fn contains(&self, method: &str) -> bool {
        self.0.contains_key(method)
    }

    pub fn methods(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn total(&self) -> u64 {
        self.0.values().fold(0u64, |acc, v| acc.saturating_add(*v))
    }
}

impl<K: Into<String>> FromIterator<(K, u64)> for MethodCounts {
    fn from_iter<I: IntoIterator<Item = (K, u64)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }
}

impl Report {
    /// Validates a parsed JSON document and builds a report from it.
    ///
    /// Only shape and ranges are checked. Cross-field agreement (for instance
    /// `unique_method_count` against the observed methods) is not.
    pub fn from_value(value: Value) -> Result<Self, IngestError> {
        let mut root = Fields::new(String::new(), value)?;

        let server_name: String = root.take("server_name")?;
        let server_version: String = root.take("server_version")?;

        let (path, metadata_raw) = root.take_value("metadata")?;
        let metadata = SamplingMetadata::from_fields(Fields::new(path, metadata_raw.clone())?)?;

        let (path, summary_raw) = root.take_value("summary")?;
        let summary = SummaryStatistics::from_fields(Fields::new(path, summary_raw.clone())?)?;

        let ticks = root
            .array("ticks")?
            .into_iter()
            .map(|(path, raw)| Tick::from_fields(Fields::new(path, raw)?))
            .collect::<Result<Vec<_>, _>>()?;

        let report = Self {
            server_name,
            server_version,
            metadata,
            summary,
            ticks,
            raw: RawSections {
                metadata: metadata_raw,
                summary: summary_raw,
            },
        };
        report.validate_ranges()?;
        Ok(report)
    }

    pub fn tick_count(&self) -> usize {
        self.ticks.len()
    }

    fn validate_ranges(&self) -> Result<(), IngestError> {
        let rate = self.metadata.sampling_rate_ms;
        if !rate.is_finite() || rate <= 0.0 {
            return Err(IngestError::schema(
                "metadata.sampling_rate_ms",
                format!("must be greater than zero, got {rate}"),
            ));
        }
        non_negative(
            "metadata.excessive_call_threshold",
            self.metadata.excessive_call_threshold,
        )?;
        non_negative("summary.avg_calls_per_tick", self.summary.avg_calls_per_tick)?;
        for (idx, top) in self.summary.top_methods.iter().enumerate() {
            non_negative(
                &format!("summary.top_methods[{idx}].avg_calls_per_tick"),
                top.avg_calls_per_tick,
            )?;
        }

        let mut previous: Option<u64> = None;
        for (idx, tick) in self.ticks.iter().enumerate() {
            non_negative(&format!("ticks[{idx}].tick_duration_ms"), tick.tick_duration_ms)?;
            if let Some(prev) = previous
                && tick.tick <= prev
            {
                return Err(IngestError::schema(
                    format!("ticks[{idx}].tick"),
                    format!(
                        "ticks must be strictly ascending, found {} after {prev}",
                        tick.tick
                    ),
                ));
            }
            previous = Some(tick.tick);
        }
        Ok(())
    }
}

impl SamplingMetadata {
    fn from_fields(mut f: Fields) -> Result<Self, IngestError> {
        Ok(Self {
            sampling_rate_ms: f.take("sampling_rate_ms")?,
            excessive_call_threshold: f.take("excessive_call_threshold")?,
            method_filters: f.list("method_filters")?,
        })
    }
}

impl SummaryStatistics {
    fn from_fields(mut f: Fields) -> Result<Self, IngestError> {
        Ok(Self {
            unique_method_count: f.take("unique_method_count")?,
            avg_calls_per_tick: f.take("avg_calls_per_tick")?,
            top_methods: f
                .array("top_methods")?
                .into_iter()
                .map(|(path, raw)| TopMethod::from_fields(Fields::new(path, raw)?))
                .collect::<Result<_, _>>()?,
        })
    }
}

impl TopMethod {
    fn from_fields(mut f: Fields) -> Result<Self, IngestError> {
        Ok(Self {
            method_name: f.take("method_name")?,
            avg_calls_per_tick: f.take("avg_calls_per_tick")?,
            max_calls: f.take("max_calls")?,
            total_calls: f.take("total_calls")?,
        })
    }
}

impl Tick {
    fn from_fields(mut f: Fields) -> Result<Self, IngestError> {
        Ok(Self {
            tick: f.take("tick")?,
            timestamp: f.take("timestamp")?,
            tick_duration_ms: f.take("tick_duration_ms")?,
            method_counts: MethodCounts(f.keyed("method_counts")?),
            method_trends: f.keyed("method_trends")?,
            is_problem_tick: f.take("is_problem_tick")?,
        })
    }
}

/// One JSON object being taken apart field by field. `path` locates it in
/// the document (empty for the root) so every failure names its field.
struct Fields {
    path: String,
    map: Map<String, Value>,
}

impl Fields {
    fn new(path: String, value: Value) -> Result<Self, IngestError> {
        match value {
            Value::Object(map) => Ok(Self { path, map }),
            other => {
                let path = if path.is_empty() { "$".to_string() } else { path };
                Err(IngestError::schema(
                    path,
                    format!("expected an object, found {}", json_kind(&other)),
                ))
            }
        }
    }

    fn child(&self, key: &str) -> String {
        if self.path.is_empty() {
            return key.to_string();
        }
        format!("{}.{key}", self.path)
    }

    fn take_value(&mut self, key: &str) -> Result<(String, Value), IngestError> {
        let path = self.child(key);
        match self.map.remove(key) {
            Some(value) => Ok((path, value)),
            None => Err(IngestError::schema(path, "missing required field")),
        }
    }

    fn take<T: DeserializeOwned>(&mut self, key: &str) -> Result<T, IngestError> {
        let (path, value) = self.take_value(key)?;
        decode_at(&path, value)
    }

    /// Array elements paired with their `key[i]` paths.
    fn array(&mut self, key: &str) -> Result<Vec<(String, Value)>, IngestError> {
        let (path, value) = self.take_value(key)?;
        match value {
            Value::Array(items) => Ok(items
                .into_iter()
                .enumerate()
                .map(|(idx, item)| (format!("{path}[{idx}]"), item))
                .collect()),
            other => Err(IngestError::schema(
                path,
                format!("expected an array, found {}", json_kind(&other)),
            )),
        }
    }

    fn list<T: DeserializeOwned>(&mut self, key: &str) -> Result<Vec<T>, IngestError> {
        self.array(key)?
            .into_iter()
            .map(|(path, item)| decode_at(&path, item))
            .collect()
    }

    /// An object used as a map; entries are addressed as `key["entry"]`.
    fn keyed<T: DeserializeOwned>(&mut self, key: &str) -> Result<BTreeMap<String, T>, IngestError> {
        let (path, value) = self.take_value(key)?;
        let inner = Self::new(path, value)?;
        let mut out = BTreeMap::new();
        for (name, item) in inner.map {
            let value = decode_at(&format!("{}[{name:?}]", inner.path), item)?;
            out.insert(name, value);
        }
        Ok(out)
    }
}

fn decode_at<T: DeserializeOwned>(path: &str, value: Value) -> Result<T, IngestError> {
    T::deserialize(value).map_err(|e| IngestError::schema(path, e.to_string()))
}

fn non_negative(path: &str, value: f64) -> Result<(), IngestError> {
    if value.is_finite() && value >= 0.0 {
        return Ok(());
    }
    Err(IngestError::schema(
        path,
        format!("must be a non-negative number, got {value}"),
    ))
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

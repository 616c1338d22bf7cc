//! Blob ingestion: bytes with a declared media type in, validated report out.

use serde::{Deserialize, Serialize};
use serde_json::error::Category;

use std::fmt;
use std::path::Path;
use std::sync::Arc;

use crate::{CallfreqResult, IngestError, Report};

const UTF8_BOM: &str = "\u{feff}";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MediaType {
    Json,
    /// Binary-framed export. Selectable, but this build has no decoder for it.
    OctetStream,
}

impl MediaType {
    pub fn from_mime(mime: &str) -> Result<Self, IngestError> {
        let essence = mime.split(';').next().unwrap_or_default().trim();
        match essence.to_ascii_lowercase().as_str() {
            "application/json" => Ok(Self::Json),
            "application/octet-stream" => Ok(Self::OctetStream),
            _ => Err(IngestError::UnsupportedFormat(format!(
                "media type {mime:?} is not accepted (expected application/json or application/octet-stream)"
            ))),
        }
    }

    pub fn from_extension(ext: &str) -> Result<Self, IngestError> {
        match ext.to_ascii_lowercase().as_str() {
            "json" => Ok(Self::Json),
            "bin" | "data" => Ok(Self::OctetStream),
            _ => Err(IngestError::UnsupportedFormat(format!(
                "file extension {ext:?} is not accepted (expected .json, .bin or .data)"
            ))),
        }
    }

    pub fn mime(self) -> &'static str {
        match self {
            Self::Json => "application/json",
            Self::OctetStream => "application/octet-stream",
        }
    }
}

impl fmt::Display for MediaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.mime())
    }
}

/// One submitted input unit.
#[derive(Debug, Clone)]
pub struct Blob {
    pub name: Option<String>,
    pub media_type: MediaType,
    pub bytes: Vec<u8>,
}

impl Blob {
    pub fn new(media_type: MediaType, bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            name: None,
            media_type,
            bytes: bytes.into(),
        }
    }

    pub fn json(text: impl Into<String>) -> Self {
        Self::new(MediaType::Json, text.into().into_bytes())
    }

    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Reads a file, resolving its media type from the extension.
    pub fn from_path(path: &Path) -> CallfreqResult<Self> {
        let ext = path
            .extension()
            .and_then(|s| s.to_str())
            .unwrap_or_default();
        let media_type = MediaType::from_extension(ext)?;
        let bytes = std::fs::read(path)?;
        Ok(Self {
            name: Some(path.display().to_string()),
            media_type,
            bytes,
        })
    }
}

/// Content identity of an ingested report: blake3 of the submitted bytes.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ReportId(String);

impl ReportId {
    pub fn from_bytes(bytes: &[u8]) -> Self {
        Self(blake3::hash(bytes).to_hex().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn short(&self) -> &str {
        self.0.get(..12).unwrap_or(&self.0)
    }
}

impl fmt::Display for ReportId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// An immutable, shareable ingested report.
#[derive(Debug, Clone, PartialEq)]
pub struct ReportSnapshot {
    pub id: ReportId,
    pub source: Option<String>,
    pub report: Arc<Report>,
}

impl ReportSnapshot {
    pub fn report(&self) -> &Report {
        &self.report
    }
}

/// Decodes and validates one blob.
///
/// Pure with respect to the blob: the same bytes always yield an equal
/// snapshot, and a failure leaves nothing behind.
pub fn ingest(blob: &Blob) -> Result<ReportSnapshot, IngestError> {
    let source = blob.name.as_deref().unwrap_or("<blob>");
    let result = decode(blob);
    match &result {
        Ok(snapshot) => tracing::info!(
            source,
            server = %snapshot.report.server_name,
            ticks = snapshot.report.tick_count(),
            id = snapshot.id.short(),
            "ingested report"
        ),
        Err(err) => tracing::warn!(source, kind = err.kind(), "rejected report: {err}"),
    }
    result
}

fn decode(blob: &Blob) -> Result<ReportSnapshot, IngestError> {
    if blob.media_type == MediaType::OctetStream {
        return Err(IngestError::UnsupportedFormat(
            "binary-framed reports (application/octet-stream) cannot be decoded yet; export as JSON"
                .to_string(),
        ));
    }

    let text = std::str::from_utf8(&blob.bytes)
        .map_err(|e| IngestError::Decode(format!("input is not valid UTF-8: {e}")))?;
    let text = text.strip_prefix(UTF8_BOM).unwrap_or(text);

    let value: serde_json::Value = serde_json::from_str(text).map_err(|e| match e.classify() {
        Category::Io | Category::Syntax | Category::Eof => {
            IngestError::Decode(format!("input is not valid JSON: {e}"))
        }
        Category::Data => IngestError::schema("$", e.to_string()),
    })?;

    let report = Report::from_value(value)?;
    Ok(ReportSnapshot {
        id: ReportId::from_bytes(&blob.bytes),
        source: blob.name.clone(),
        report: Arc::new(report),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::report_json;

    fn json_blob() -> Blob {
        Blob::json(report_json().to_string()).named("report.json")
    }

    #[test]
    fn ingests_json_blob() {
        let snapshot = ingest(&json_blob()).expect("ingest");
        assert_eq!(snapshot.report.tick_count(), 3);
        assert_eq!(snapshot.source.as_deref(), Some("report.json"));
    }

    #[test]
    fn ingestion_is_idempotent() {
        let blob = json_blob();
        let a = ingest(&blob).expect("first");
        let b = ingest(&blob).expect("second");
        assert_eq!(a, b);
        assert_eq!(a.id, b.id);
    }

    #[test]
    fn different_bytes_get_different_ids() {
        let a = ingest(&json_blob()).expect("a");
        let mut doc = report_json();
        doc["server_name"] = serde_json::json!("creative-2");
        let b = ingest(&Blob::json(doc.to_string())).expect("b");
        assert_ne!(a.id, b.id);
    }

    #[test]
    fn malformed_json_is_decode_error() {
        let err = ingest(&Blob::json("{not json")).expect_err("malformed");
        assert!(matches!(err, IngestError::Decode(_)), "{err:?}");
    }

    #[test]
    fn truncated_json_is_decode_error() {
        let err = ingest(&Blob::json("{\"server_name\": ")).expect_err("eof");
        assert!(matches!(err, IngestError::Decode(_)), "{err:?}");
    }

    #[test]
    fn invalid_utf8_is_decode_error() {
        let err = ingest(&Blob::new(MediaType::Json, vec![0xff, 0xfe, 0x7b]))
            .expect_err("not utf-8");
        assert!(matches!(err, IngestError::Decode(_)), "{err:?}");
    }

    #[test]
    fn wrong_shape_is_schema_error() {
        let err = ingest(&Blob::json("{\"server_name\": 3}")).expect_err("schema");
        assert_eq!(err.kind(), "schema");
    }

    #[test]
    fn array_wrapped_report_is_schema_error() {
        let wrapped = serde_json::json!([report_json()]).to_string();
        let err = ingest(&Blob::json(wrapped)).expect_err("wrapped");
        assert_eq!(err.kind(), "schema");
    }

    #[test]
    fn binary_media_type_is_unsupported_even_for_json_bytes() {
        let blob = Blob::new(MediaType::OctetStream, report_json().to_string().into_bytes());
        let err = ingest(&blob).expect_err("binary");
        assert!(matches!(err, IngestError::UnsupportedFormat(_)), "{err:?}");
    }

    #[test]
    fn leading_bom_is_accepted() {
        let text = format!("{UTF8_BOM}{}", report_json());
        assert!(ingest(&Blob::json(text)).is_ok());
    }

    #[test]
    fn media_type_resolution() {
        assert_eq!(MediaType::from_mime("application/json").expect("json"), MediaType::Json);
        assert_eq!(
            MediaType::from_mime("Application/JSON; charset=utf-8").expect("json"),
            MediaType::Json
        );
        assert_eq!(
            MediaType::from_mime("application/octet-stream").expect("bin"),
            MediaType::OctetStream
        );
        assert!(MediaType::from_mime("text/csv").is_err());
        assert_eq!(MediaType::from_extension("JSON").expect("json"), MediaType::Json);
        assert_eq!(MediaType::from_extension("data").expect("data"), MediaType::OctetStream);
        assert!(matches!(
            MediaType::from_extension("csv"),
            Err(IngestError::UnsupportedFormat(_))
        ));
    }

    #[test]
    fn blob_from_path_reads_file_and_infers_type() {
        let dir = std::env::temp_dir().join(format!("callfreq-ingest-{}", uuid::Uuid::new_v4()));
        std::fs::create_dir_all(&dir).expect("mkdir");
        let path = dir.join("report.json");
        std::fs::write(&path, report_json().to_string()).expect("write");
        let blob = Blob::from_path(&path).expect("blob");
        assert_eq!(blob.media_type, MediaType::Json);
        assert!(ingest(&blob).is_ok());

        let bin = dir.join("report.bin");
        std::fs::write(&bin, [0u8, 1, 2]).expect("write");
        let blob = Blob::from_path(&bin).expect("blob");
        assert_eq!(blob.media_type, MediaType::OctetStream);
    }

    #[test]
    fn report_id_short_is_a_prefix() {
        let id = ReportId::from_bytes(b"abc");
        assert_eq!(id.short().len(), 12);
        assert!(id.as_str().starts_with(id.short()));
    }
}

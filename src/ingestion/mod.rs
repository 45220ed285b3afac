//! Batch ingestion of uploaded song payloads.

use crate::normalize::{coerce_record, extract_records, CoercionWarning};
use crate::song_store::{SongStore, UpsertOutcome};
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, warn};

#[derive(Debug, Error)]
pub enum IngestError {
    #[error("Malformed upload: {0}")]
    MalformedInput(String),
    #[error(transparent)]
    Storage(#[from] anyhow::Error),
}

/// A record that was dropped from the batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rejection {
    pub position: usize,
    pub reason: String,
}

/// Aggregate outcome of one upload.
#[derive(Debug, Default)]
pub struct IngestionReport {
    pub created: usize,
    pub updated: usize,
    pub rejected: Vec<Rejection>,
    pub warnings: Vec<CoercionWarning>,
}

impl IngestionReport {
    pub fn processed(&self) -> usize {
        self.created + self.updated + self.rejected.len()
    }

    pub fn summary(&self) -> String {
        format!(
            "Processed {} items: {} created, {} updated, {} rejected.",
            self.processed(),
            self.created,
            self.updated,
            self.rejected.len()
        )
    }
}

/// Run a parsed upload payload through normalization and store every usable
/// record.
///
/// Records apply in payload order, so a later record with a duplicate id
/// overwrites the earlier one. A record that fails coercion is rejected and
/// the rest of the batch still goes through. Storage failures abort the
/// batch; records already applied stay applied.
pub fn ingest_value(store: &dyn SongStore, data: &Value) -> Result<IngestionReport, IngestError> {
    let records = extract_records(data).ok_or_else(|| {
        IngestError::MalformedInput(
            "payload is neither a record batch nor a column table".to_string(),
        )
    })?;

    let mut report = IngestionReport::default();

    for (position, raw) in records.iter().enumerate() {
        match coerce_record(raw, position) {
            Ok((song, mut record_warnings)) => {
                for w in &record_warnings {
                    warn!(
                        "Record {} field {:?} defaulted: {}",
                        w.position, w.field, w.reason
                    );
                }
                report.warnings.append(&mut record_warnings);

                match store.upsert_song(&song)? {
                    UpsertOutcome::Created => report.created += 1,
                    UpsertOutcome::Updated => report.updated += 1,
                }
            }
            Err(reason) => {
                warn!("Rejecting record {}: {}", position, reason);
                report.rejected.push(Rejection { position, reason });
            }
        }
    }

    debug!("{}", report.summary());
    Ok(report)
}

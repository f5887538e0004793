use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::OnceLock;

use serde_json::Value;
use thiserror::Error;

use crate::model::Record;
use crate::partition_source::PartitionSource;

/// Why a single partition was skipped.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LoadError {
    #[error("transport error: {0}")]
    Transport(String),
    #[error("unexpected status {0}")]
    Status(u16),
    #[error("io error: {0}")]
    Io(String),
    #[error("malformed payload: {0}")]
    Malformed(String),
    #[error("payload is not a sequence")]
    NotASequence,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("record store was already loaded")]
    AlreadyLoaded,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PartitionStatus {
    Loaded(usize),
    Skipped(LoadError),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PartitionOutcome {
    pub partition: String,
    pub status: PartitionStatus,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadReport {
    pub outcomes: Vec<PartitionOutcome>,
}

impl LoadReport {
    pub fn record_count(&self) -> usize {
        self.outcomes
            .iter()
            .map(|outcome| match outcome.status {
                PartitionStatus::Loaded(count) => count,
                PartitionStatus::Skipped(_) => 0,
            })
            .sum()
    }

    pub fn skipped(&self) -> Vec<&str> {
        self.outcomes
            .iter()
            .filter(|outcome| matches!(outcome.status, PartitionStatus::Skipped(_)))
            .map(|outcome| outcome.partition.as_str())
            .collect()
    }
}

/// The corpus. Filled once by [`RecordStore::load_all`], read-only afterwards.
#[derive(Default)]
pub struct RecordStore {
    started: AtomicBool,
    corpus: OnceLock<Vec<Record>>,
}

impl RecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store that is already ready, holding `records` in the given order.
    pub fn from_records(records: Vec<Record>) -> Self {
        let store = Self::default();
        store.started.store(true, Ordering::SeqCst);
        let _ = store.corpus.set(records);
        store
    }

    pub fn is_ready(&self) -> bool {
        self.corpus.get().is_some()
    }

    /// Every record in insertion order; empty until the load finishes.
    pub fn records(&self) -> &[Record] {
        self.corpus.get().map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn len(&self) -> usize {
        self.records().len()
    }

    pub fn is_empty(&self) -> bool {
        self.records().is_empty()
    }

    /// Attempts every partition in order. Failed partitions are logged and
    /// skipped; the store becomes ready once all of them were attempted.
    pub async fn load_all(
        &self,
        source: &dyn PartitionSource,
        partitions: &[String],
    ) -> Result<LoadReport, StoreError> {
        if self.started.swap(true, Ordering::SeqCst) {
            return Err(StoreError::AlreadyLoaded);
        }

        let mut records = Vec::new();
        let mut report = LoadReport::default();

        for partition in partitions {
            let status = match fetch_partition(source, partition).await {
                Ok(entries) => {
                    let count = entries.len();
                    records.extend(
                        entries
                            .iter()
                            .enumerate()
                            .map(|(position, entry)| Record::from_raw(entry, partition, position)),
                    );
                    PartitionStatus::Loaded(count)
                }
                Err(error) => {
                    log::warn!(
                        "[plantfind] skipping partition {partition} ({}): {error}",
                        source.source_name()
                    );
                    PartitionStatus::Skipped(error)
                }
            };
            report.outcomes.push(PartitionOutcome {
                partition: partition.clone(),
                status,
            });
        }

        log::info!(
            "[plantfind] corpus ready records={} partitions={} skipped={}",
            records.len(),
            partitions.len(),
            report.skipped().len()
        );
        let _ = self.corpus.set(records);
        Ok(report)
    }
}

async fn fetch_partition(
    source: &dyn PartitionSource,
    partition: &str,
) -> Result<Vec<Value>, LoadError> {
    let payload = source.fetch(partition).await?;
    parse_partition(&payload)
}

pub fn parse_partition(payload: &[u8]) -> Result<Vec<Value>, LoadError> {
    let value: Value =
        serde_json::from_slice(payload).map_err(|error| LoadError::Malformed(error.to_string()))?;
    match value {
        Value::Array(entries) => Ok(entries),
        _ => Err(LoadError::NotASequence),
    }
}

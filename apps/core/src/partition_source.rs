use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use walkdir::WalkDir;

use crate::record_store::LoadError;

pub const PARTITION_EXTENSION: &str = "json";

pub fn partition_file_name(partition: &str) -> String {
    format!("{partition}.{PARTITION_EXTENSION}")
}

/// Supplies the raw payload bytes of one partition.
#[async_trait]
pub trait PartitionSource: Send + Sync {
    fn source_name(&self) -> &'static str;
    async fn fetch(&self, partition: &str) -> Result<Vec<u8>, LoadError>;
}

/// Fetches `<base>/data/<partition>.json` over HTTP.
pub struct HttpPartitionSource {
    client: reqwest::Client,
    base_url: String,
}

impl HttpPartitionSource {
    pub fn new(base_url: &str) -> Self {
        Self::with_client(reqwest::Client::new(), base_url)
    }

    pub fn with_client(client: reqwest::Client, base_url: &str) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn partition_url(&self, partition: &str) -> String {
        format!("{}/data/{}", self.base_url, partition_file_name(partition))
    }
}

#[async_trait]
impl PartitionSource for HttpPartitionSource {
    fn source_name(&self) -> &'static str {
        "http"
    }

    async fn fetch(&self, partition: &str) -> Result<Vec<u8>, LoadError> {
        let url = self.partition_url(partition);
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|error| LoadError::Transport(error.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(LoadError::Status(status.as_u16()));
        }

        let body = response
            .bytes()
            .await
            .map_err(|error| LoadError::Transport(error.to_string()))?;
        Ok(body.to_vec())
    }
}

/// Reads `<root>/<partition>.json` from a local data directory.
pub struct DirectoryPartitionSource {
    root: PathBuf,
}

impl DirectoryPartitionSource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Lists the partitions present in the directory, sorted by name.
    pub fn discover_partitions(&self) -> Vec<String> {
        let mut partitions: Vec<String> = WalkDir::new(&self.root)
            .min_depth(1)
            .max_depth(1)
            .into_iter()
            .filter_map(Result::ok)
            .filter(|entry| entry.file_type().is_file())
            .filter_map(|entry| {
                let path = entry.path();
                let is_json = path
                    .extension()
                    .and_then(|ext| ext.to_str())
                    .map(|ext| ext.eq_ignore_ascii_case(PARTITION_EXTENSION))
                    .unwrap_or(false);
                if !is_json {
                    return None;
                }
                path.file_stem()
                    .and_then(|stem| stem.to_str())
                    .map(str::to_string)
            })
            .collect();

        partitions.sort();
        partitions
    }
}

#[async_trait]
impl PartitionSource for DirectoryPartitionSource {
    fn source_name(&self) -> &'static str {
        "directory"
    }

    async fn fetch(&self, partition: &str) -> Result<Vec<u8>, LoadError> {
        let path = self.root.join(partition_file_name(partition));
        tokio::fs::read(&path)
            .await
            .map_err(|error| LoadError::Io(format!("{}: {error}", path.display())))
    }
}

/// Serves payloads held in memory.
#[derive(Default)]
pub struct StaticPartitionSource {
    payloads: BTreeMap<String, String>,
}

impl StaticPartitionSource {
    pub fn with_payload(mut self, partition: &str, payload: &str) -> Self {
        self.payloads
            .insert(partition.to_string(), payload.to_string());
        self
    }

    pub fn deterministic_fixture() -> Self {
        Self::default()
            .with_payload(
                "fruit_trees",
                r#"[
                    {"common_name": "Mango", "scientific_name": "Mangifera indica", "id": 1,
                     "image_url": "img/mango.jpg"},
                    {"common_name": "Rose Apple", "scientific_name": "Syzygium jambos", "id": 42}
                ]"#,
            )
            .with_payload(
                "medicinal_herbs",
                r#"[
                    {"common_name": "Holy Basil", "scientific_name": "Ocimum tenuiflorum"},
                    {"name": "Aloe Vera", "scientific_name": "Aloe barbadensis miller", "id": "aloe"}
                ]"#,
            )
    }
}

#[async_trait]
impl PartitionSource for StaticPartitionSource {
    fn source_name(&self) -> &'static str {
        "static"
    }

    async fn fetch(&self, partition: &str) -> Result<Vec<u8>, LoadError> {
        self.payloads
            .get(partition)
            .map(|payload| payload.as_bytes().to_vec())
            .ok_or(LoadError::Status(404))
    }
}

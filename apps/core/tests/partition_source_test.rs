use plantfind_core::partition_source::{
    partition_file_name, DirectoryPartitionSource, HttpPartitionSource, PartitionSource,
};
use plantfind_core::record_store::{LoadError, RecordStore};

#[test]
fn http_source_builds_data_urls() {
    let source = HttpPartitionSource::new("https://example.org/garden/");
    assert_eq!(
        source.partition_url("fruit_trees"),
        "https://example.org/garden/data/fruit_trees.json"
    );
    assert_eq!(source.source_name(), "http");
}

#[test]
fn directory_source_discovers_json_partitions() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("timber_trees.json"), b"[]").unwrap();
    std::fs::write(dir.path().join("fruit_trees.JSON"), b"[]").unwrap();
    std::fs::write(dir.path().join("README.md"), b"notes").unwrap();
    std::fs::create_dir(dir.path().join("nested")).unwrap();
    std::fs::write(dir.path().join("nested").join("hidden.json"), b"[]").unwrap();

    let source = DirectoryPartitionSource::new(dir.path());

    assert_eq!(
        source.discover_partitions(),
        vec!["fruit_trees".to_string(), "timber_trees".to_string()]
    );
}

#[tokio::test]
async fn directory_source_feeds_the_record_store() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(
        dir.path().join(partition_file_name("fruit_trees")),
        r#"[{"common_name": "Jackfruit", "scientific_name": "Artocarpus heterophyllus", "id": 11}]"#,
    )
    .unwrap();

    let source = DirectoryPartitionSource::new(dir.path());
    let store = RecordStore::new();
    let report = store
        .load_all(
            &source,
            &["fruit_trees".to_string(), "timber_trees".to_string()],
        )
        .await
        .unwrap();

    assert_eq!(store.len(), 1);
    assert_eq!(store.records()[0].id, "11");
    assert_eq!(report.skipped(), vec!["timber_trees"]);
}

#[tokio::test]
async fn directory_source_reports_missing_file_as_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let source = DirectoryPartitionSource::new(dir.path());

    let result = source.fetch("hook_climbers").await;

    assert!(matches!(result, Err(LoadError::Io(_))));
}

/// Minimal HTTP/1.1 responder: `/data/fruit_trees.json` gets a payload,
/// `/data/timber_trees.json` a 500, anything else a 404.
async fn serve_catalog() -> String {
    use tokio::io::{AsyncReadExt, AsyncWriteExt};

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let address = listener.local_addr().unwrap();
    tokio::spawn(async move {
        loop {
            let Ok((mut socket, _)) = listener.accept().await else {
                return;
            };
            tokio::spawn(async move {
                let mut request = Vec::new();
                let mut buffer = [0u8; 1024];
                while !request.windows(4).any(|window| window == b"\r\n\r\n") {
                    match socket.read(&mut buffer).await {
                        Ok(0) | Err(_) => return,
                        Ok(read) => request.extend_from_slice(&buffer[..read]),
                    }
                }
                let head = String::from_utf8_lossy(&request);
                let path = head.split_whitespace().nth(1).unwrap_or("/").to_string();
                let (status, body) = match path.as_str() {
                    "/data/fruit_trees.json" => (
                        "200 OK",
                        r#"[{"common_name": "Mango", "scientific_name": "Mangifera indica", "id": 1}]"#,
                    ),
                    "/data/timber_trees.json" => ("500 Internal Server Error", "boom"),
                    _ => ("404 Not Found", "missing"),
                };
                let response = format!(
                    "HTTP/1.1 {status}\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{body}",
                    body.len()
                );
                let _ = socket.write_all(response.as_bytes()).await;
                let _ = socket.shutdown().await;
            });
        }
    });
    format!("http://{address}")
}

async fn closed_port_url() -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let address = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{address}")
}

/// Sends `offline` partitions to an unreachable host and the rest to `live`.
struct SplitSource {
    live: HttpPartitionSource,
    offline: HttpPartitionSource,
}

#[async_trait::async_trait]
impl PartitionSource for SplitSource {
    fn source_name(&self) -> &'static str {
        "split"
    }

    async fn fetch(&self, partition: &str) -> Result<Vec<u8>, LoadError> {
        if partition == "offline" {
            self.offline.fetch(partition).await
        } else {
            self.live.fetch(partition).await
        }
    }
}

#[tokio::test]
async fn http_source_returns_body_and_maps_error_statuses() {
    let source = HttpPartitionSource::new(&serve_catalog().await);

    let body = source.fetch("fruit_trees").await.unwrap();
    assert!(String::from_utf8(body).unwrap().contains("Mangifera indica"));
    assert_eq!(
        source.fetch("timber_trees").await,
        Err(LoadError::Status(500))
    );
    assert_eq!(
        source.fetch("hook_climbers").await,
        Err(LoadError::Status(404))
    );
}

#[tokio::test]
async fn http_source_reports_unreachable_host_as_transport_error() {
    let source = HttpPartitionSource::new(&closed_port_url().await);

    let result = source.fetch("fruit_trees").await;

    assert!(matches!(result, Err(LoadError::Transport(_))));
}

#[tokio::test]
async fn http_failures_are_skipped_while_the_store_becomes_ready() {
    let source = SplitSource {
        live: HttpPartitionSource::new(&serve_catalog().await),
        offline: HttpPartitionSource::new(&closed_port_url().await),
    };
    let store = RecordStore::new();

    let report = store
        .load_all(
            &source,
            &[
                "timber_trees".to_string(),
                "offline".to_string(),
                "fruit_trees".to_string(),
            ],
        )
        .await
        .unwrap();

    assert!(store.is_ready());
    assert_eq!(store.len(), 1);
    assert_eq!(store.records()[0].name, "Mango");
    assert_eq!(report.skipped(), vec!["timber_trees", "offline"]);
}

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use thiserror::Error;
use tokio::io::BufReader;
use tokio::sync::mpsc;

use crate::config::{self, Config, ConfigError};
use crate::model::Query;
use crate::partition_source::{DirectoryPartitionSource, HttpPartitionSource, PartitionSource};
use crate::record_store::{RecordStore, StoreError};
use crate::routing::BaseLocation;
use crate::runtime::{spawn_load, MountError, SearchWidget, WidgetHost};
use crate::suggestions::{render_for_store, SuggestionView};
use crate::transport::{forward_lines, JsonLineSink};

const DEFAULT_PAGE_URL: &str = "http://localhost/index.html";

#[derive(Debug, Clone, Parser)]
#[command(name = "plantfind-core", about = "Plant catalog search suggestions")]
pub struct Cli {
    /// Config file (.toml, .json or .json5).
    #[arg(long)]
    pub config: Option<PathBuf>,
    /// Read partitions from this directory instead of the configured source.
    #[arg(long)]
    pub data_dir: Option<PathBuf>,
    /// Fetch partitions from `<base-url>/data/`.
    #[arg(long)]
    pub base_url: Option<String>,
    /// Address of the hosting page, used to build detail links.
    #[arg(long)]
    pub page_url: Option<String>,
    /// URL the widget script was served from, when known.
    #[arg(long)]
    pub script_src: Option<String>,
    /// Print suggestions for one query and exit instead of running the bridge.
    #[arg(long)]
    pub query: Option<String>,
}

#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error("config error: {0}")]
    Config(#[from] ConfigError),
    #[error("mount error: {0}")]
    Mount(#[from] MountError),
    #[error("store error: {0}")]
    Store(#[from] StoreError),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("no data source configured; pass --data-dir or --base-url")]
    NoSource,
}

pub fn apply_overrides(mut config: Config, cli: &Cli) -> Config {
    if let Some(dir) = &cli.data_dir {
        config.data_dir = Some(dir.clone());
    }
    if let Some(base) = &cli.base_url {
        config.base_url = Some(base.clone());
    }
    config
}

/// An empty partition list with a local data directory means "whatever
/// partitions the directory holds".
pub fn fill_partitions_from_data_dir(mut config: Config) -> Config {
    if !config.partitions.is_empty() {
        return config;
    }
    if let Some(dir) = &config.data_dir {
        config.partitions = DirectoryPartitionSource::new(dir.clone()).discover_partitions();
        log::info!(
            "[plantfind] discovered {} partitions in {}",
            config.partitions.len(),
            dir.display()
        );
    }
    config
}

pub fn source_for(config: &Config) -> Result<Arc<dyn PartitionSource>, RuntimeError> {
    if let Some(dir) = &config.data_dir {
        return Ok(Arc::new(DirectoryPartitionSource::new(dir.clone())));
    }
    if let Some(base) = &config.base_url {
        return Ok(Arc::new(HttpPartitionSource::new(base)));
    }
    Err(RuntimeError::NoSource)
}

fn widget_host(cli: &Cli, config: &Config) -> WidgetHost {
    let page_url = cli
        .page_url
        .clone()
        .or_else(|| {
            config
                .base_url
                .as_ref()
                .map(|base| format!("{}/index.html", base.trim_end_matches('/')))
        })
        .unwrap_or_else(|| DEFAULT_PAGE_URL.to_string());
    WidgetHost {
        has_search_input: true,
        script_src: cli.script_src.clone(),
        page_url,
    }
}

pub async fn run(cli: Cli) -> Result<(), RuntimeError> {
    let config = apply_overrides(config::load(cli.config.as_deref())?, &cli);
    crate::logging::init(config.log_path.as_deref())?;
    let config = fill_partitions_from_data_dir(config);
    config::validate(&config)?;
    log::info!(
        "[plantfind] startup config_path={} partitions={}",
        config.config_path.display(),
        config.partitions.len()
    );

    let source = source_for(&config)?;
    let store = Arc::new(RecordStore::new());
    let host = widget_host(&cli, &config);

    match &cli.query {
        Some(query) => run_query(&config, &host, store, source, query).await,
        None => run_bridge(&config, &host, store, source).await,
    }
}

async fn run_query(
    config: &Config,
    host: &WidgetHost,
    store: Arc<RecordStore>,
    source: Arc<dyn PartitionSource>,
    raw_query: &str,
) -> Result<(), RuntimeError> {
    store.load_all(source.as_ref(), &config.partitions).await?;

    let Some(query) = Query::parse(raw_query) else {
        println!("(empty query)");
        return Ok(());
    };

    let base = BaseLocation::detect(host.script_src.as_deref(), &host.page_url)
        .map_err(MountError::from)?;
    let routes = config.routing_table();
    match render_for_store(&store, &query, config.max_suggestions as usize) {
        SuggestionView::Items(items) => {
            for item in items {
                let destination = routes
                    .resolve(&item.record, &base)
                    .map(|url| url.to_string())
                    .unwrap_or_default();
                println!(
                    "{}. {} [{}] -> {}",
                    item.index + 1,
                    item.name.text(),
                    item.scientific_name,
                    destination
                );
            }
        }
        SuggestionView::Empty => println!("{}", crate::suggestions::NO_RESULTS_TEXT),
        SuggestionView::Loading => println!("{}", crate::suggestions::LOADING_TEXT),
    }
    Ok(())
}

async fn run_bridge(
    config: &Config,
    host: &WidgetHost,
    store: Arc<RecordStore>,
    source: Arc<dyn PartitionSource>,
) -> Result<(), RuntimeError> {
    let sink = JsonLineSink::new(std::io::stdout());
    let widget = SearchWidget::mount(host, config, Arc::clone(&store), sink.clone(), sink.clone())?;

    let (events_tx, events_rx) = mpsc::channel(64);
    let load = spawn_load(store, source, config.partitions.clone(), events_tx.clone());
    let widget_task = tokio::spawn(widget.run(events_rx));

    forward_lines(BufReader::new(tokio::io::stdin()), events_tx, sink).await?;

    if let Ok(Err(error)) = load.await {
        log::warn!("[plantfind] corpus load failed: {error}");
    }
    if widget_task.await.is_err() {
        log::error!("[plantfind] widget task ended abnormally");
    }
    Ok(())
}

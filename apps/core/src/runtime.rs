use std::sync::Arc;

use thiserror::Error;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use url::Url;

use crate::config::{self, Config, ConfigError};
use crate::controller::{ControllerContext, ControllerEvent, Effect, SuggestionController};
use crate::partition_source::PartitionSource;
use crate::record_store::{LoadReport, RecordStore, StoreError};
use crate::routing::{BaseLocation, RoutingError, RoutingTable};
use crate::suggestions::SuggestionView;

/// The display half of the host page.
pub trait SuggestionSurface: Send {
    fn show(&mut self, view: &SuggestionView);
    fn hide(&mut self);
    fn select(&mut self, index: usize);
    fn scroll_into_view(&mut self, index: usize);
}

pub trait Navigator: Send {
    fn navigate(&mut self, url: &Url);
}

/// What the widget learns about the page it is mounted in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WidgetHost {
    pub has_search_input: bool,
    pub script_src: Option<String>,
    pub page_url: String,
}

#[derive(Debug, Error)]
pub enum MountError {
    #[error("no search input found on the host page")]
    MissingInput,
    #[error("config error: {0}")]
    Config(#[from] ConfigError),
    #[error("routing error: {0}")]
    Routing(#[from] RoutingError),
}

pub struct SearchWidget<S, N> {
    controller: SuggestionController,
    store: Arc<RecordStore>,
    routes: RoutingTable,
    base: BaseLocation,
    max_suggestions: usize,
    surface: S,
    navigator: N,
    pending: Option<(u64, Instant)>,
}

impl<S: SuggestionSurface, N: Navigator> SearchWidget<S, N> {
    /// Declines to mount when the host has no search input.
    pub fn mount(
        host: &WidgetHost,
        config: &Config,
        store: Arc<RecordStore>,
        surface: S,
        navigator: N,
    ) -> Result<Self, MountError> {
        if !host.has_search_input {
            log::warn!("[plantfind] no search input found; widget not mounted");
            return Err(MountError::MissingInput);
        }

        config::validate(config)?;
        let base = BaseLocation::detect(host.script_src.as_deref(), &host.page_url)?;
        log::info!("[plantfind] widget mounted base={}", base.as_str());

        Ok(Self {
            controller: SuggestionController::new(config.debounce()),
            store,
            routes: config.routing_table(),
            base,
            max_suggestions: config.max_suggestions as usize,
            surface,
            navigator,
            pending: None,
        })
    }

    pub fn controller(&self) -> &SuggestionController {
        &self.controller
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn navigator(&self) -> &N {
        &self.navigator
    }

    pub fn base(&self) -> &BaseLocation {
        &self.base
    }

    /// When the scheduled search is due, if one is pending.
    pub fn pending_deadline(&self) -> Option<Instant> {
        self.pending.map(|(_, at)| at)
    }

    pub fn dispatch(&mut self, event: ControllerEvent) {
        let ctx = ControllerContext {
            store: self.store.as_ref(),
            routes: &self.routes,
            base: &self.base,
            max_suggestions: self.max_suggestions,
        };
        let effects = self.controller.handle(event, &ctx);
        for effect in effects {
            self.apply(effect);
        }
    }

    /// Fires the pending search if its deadline has passed.
    pub fn fire_due_search(&mut self, now: Instant) -> bool {
        match self.pending {
            Some((ticket, at)) if at <= now => {
                self.pending = None;
                self.dispatch(ControllerEvent::DebounceElapsed(ticket));
                true
            }
            _ => false,
        }
    }

    /// Processes events until the sender side closes.
    pub async fn run(mut self, mut events: mpsc::Receiver<ControllerEvent>) -> Self {
        loop {
            let deadline = self.pending_deadline();
            tokio::select! {
                event = events.recv() => match event {
                    Some(event) => self.dispatch(event),
                    None => break,
                },
                _ = wait_until(deadline) => {
                    self.fire_due_search(Instant::now());
                }
            }
        }
        self
    }

    fn apply(&mut self, effect: Effect) {
        match effect {
            Effect::ScheduleSearch { ticket, delay } => {
                self.pending = Some((ticket, Instant::now() + delay));
            }
            Effect::CancelSearch => self.pending = None,
            Effect::Show(view) => self.surface.show(&view),
            Effect::Hide => self.surface.hide(),
            Effect::Select(index) => self.surface.select(index),
            Effect::ScrollIntoView(index) => self.surface.scroll_into_view(index),
            Effect::Navigate(url) => {
                log::info!("[plantfind] navigating to {url}");
                self.navigator.navigate(&url);
            }
        }
    }
}

async fn wait_until(deadline: Option<Instant>) {
    match deadline {
        Some(at) => tokio::time::sleep_until(at).await,
        None => std::future::pending::<()>().await,
    }
}

/// Loads the corpus in the background and tells the widget when it is ready.
pub fn spawn_load(
    store: Arc<RecordStore>,
    source: Arc<dyn PartitionSource>,
    partitions: Vec<String>,
    events: mpsc::Sender<ControllerEvent>,
) -> JoinHandle<Result<LoadReport, StoreError>> {
    tokio::spawn(async move {
        let report = store.load_all(source.as_ref(), &partitions).await?;
        let _ = events.send(ControllerEvent::CorpusLoaded).await;
        Ok(report)
    })
}

use std::time::Duration;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::model::Query;
use crate::record_store::RecordStore;
use crate::routing::{BaseLocation, RoutingTable};
use crate::suggestions::{render_for_store, SuggestionItem, SuggestionView};

pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(120);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Key {
    ArrowDown,
    ArrowUp,
    Enter,
    Escape,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "payload", rename_all = "snake_case")]
pub enum ControllerEvent {
    InputChanged(String),
    DebounceElapsed(u64),
    Key(Key),
    ItemClicked(usize),
    OutsideClick,
    CorpusLoaded,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    ScheduleSearch { ticket: u64, delay: Duration },
    CancelSearch,
    Show(SuggestionView),
    Hide,
    Select(usize),
    ScrollIntoView(usize),
    Navigate(Url),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Closed,
    Loading,
    Results,
    Empty,
}

/// Everything the controller reads but never mutates.
pub struct ControllerContext<'a> {
    pub store: &'a RecordStore,
    pub routes: &'a RoutingTable,
    pub base: &'a BaseLocation,
    pub max_suggestions: usize,
}

/// Suggestion state machine. Timers and UI live with the caller; this type
/// only decides what should happen next.
#[derive(Debug, Clone)]
pub struct SuggestionController {
    phase: Phase,
    selected_index: Option<usize>,
    visible: Vec<SuggestionItem>,
    debounce: Duration,
    pending_query: Option<Query>,
    ticket: u64,
    loading_ticket: Option<u64>,
    searches_run: u64,
}

impl Default for SuggestionController {
    fn default() -> Self {
        Self::new(DEFAULT_DEBOUNCE)
    }
}

impl SuggestionController {
    pub fn new(debounce: Duration) -> Self {
        Self {
            phase: Phase::Closed,
            selected_index: None,
            visible: Vec::new(),
            debounce,
            pending_query: None,
            ticket: 0,
            loading_ticket: None,
            searches_run: 0,
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn is_open(&self) -> bool {
        self.phase != Phase::Closed
    }

    pub fn selected_index(&self) -> Option<usize> {
        self.selected_index
    }

    pub fn visible(&self) -> &[SuggestionItem] {
        &self.visible
    }

    /// How many times the matcher has been consulted.
    pub fn searches_run(&self) -> u64 {
        self.searches_run
    }

    pub fn handle(&mut self, event: ControllerEvent, ctx: &ControllerContext<'_>) -> Vec<Effect> {
        match event {
            ControllerEvent::InputChanged(text) => self.on_input(&text),
            ControllerEvent::DebounceElapsed(ticket) => {
                if ticket != self.ticket {
                    return Vec::new();
                }
                match self.pending_query.clone() {
                    Some(query) => self.run_search(&query, ctx),
                    None => Vec::new(),
                }
            }
            // A newer keystroke still waiting on its debounce runs on its own ticket.
            ControllerEvent::CorpusLoaded => match (self.phase, self.pending_query.clone()) {
                (Phase::Loading, Some(query)) if self.loading_ticket == Some(self.ticket) => {
                    self.run_search(&query, ctx)
                }
                _ => Vec::new(),
            },
            ControllerEvent::Key(key) => self.on_key(key, ctx),
            ControllerEvent::ItemClicked(index) => self.commit(index, ctx),
            ControllerEvent::OutsideClick => self.close(),
        }
    }

    fn on_input(&mut self, text: &str) -> Vec<Effect> {
        self.ticket += 1;
        match Query::parse(text) {
            Some(query) => {
                self.pending_query = Some(query);
                vec![Effect::ScheduleSearch {
                    ticket: self.ticket,
                    delay: self.debounce,
                }]
            }
            None => {
                self.pending_query = None;
                let mut effects = vec![Effect::CancelSearch];
                effects.extend(self.reset());
                effects
            }
        }
    }

    fn run_search(&mut self, query: &Query, ctx: &ControllerContext<'_>) -> Vec<Effect> {
        let view = render_for_store(ctx.store, query, ctx.max_suggestions);
        self.selected_index = None;
        self.phase = match &view {
            SuggestionView::Loading => Phase::Loading,
            SuggestionView::Empty => Phase::Empty,
            SuggestionView::Items(_) => Phase::Results,
        };
        if self.phase == Phase::Loading {
            self.loading_ticket = Some(self.ticket);
        } else {
            self.loading_ticket = None;
            self.searches_run += 1;
            self.pending_query = None;
        }
        self.visible = view.items().to_vec();
        vec![Effect::Show(view)]
    }

    fn on_key(&mut self, key: Key, ctx: &ControllerContext<'_>) -> Vec<Effect> {
        if !self.is_open() {
            return Vec::new();
        }

        match key {
            Key::ArrowDown | Key::ArrowUp => {
                let direction = if key == Key::ArrowDown { 1 } else { -1 };
                let Some(next) =
                    next_selection_index(self.selected_index, self.visible.len(), direction)
                else {
                    return Vec::new();
                };
                self.selected_index = Some(next);
                vec![Effect::Select(next), Effect::ScrollIntoView(next)]
            }
            Key::Enter => match self.selected_index {
                Some(index) => self.commit(index, ctx),
                None => self.close(),
            },
            Key::Escape => self.close(),
        }
    }

    fn commit(&mut self, index: usize, ctx: &ControllerContext<'_>) -> Vec<Effect> {
        let Some(item) = self.visible.get(index) else {
            return Vec::new();
        };

        let destination = ctx.routes.resolve(&item.record, ctx.base);
        let mut effects = self.close();
        match destination {
            Ok(url) => effects.push(Effect::Navigate(url)),
            Err(error) => log::warn!("[plantfind] cannot navigate to selection: {error}"),
        }
        effects
    }

    /// Dismisses the list and drops any search that has not fired yet.
    fn close(&mut self) -> Vec<Effect> {
        let had_pending = self.pending_query.take().is_some();
        self.ticket += 1;
        let mut effects = Vec::new();
        if had_pending {
            effects.push(Effect::CancelSearch);
        }
        effects.extend(self.reset());
        effects
    }

    fn reset(&mut self) -> Vec<Effect> {
        let was_open = self.is_open();
        self.phase = Phase::Closed;
        self.selected_index = None;
        self.loading_ticket = None;
        self.visible.clear();
        if was_open {
            vec![Effect::Hide]
        } else {
            Vec::new()
        }
    }
}

/// Moves the selection one step, clamped to `[0, len - 1]`.
/// Returns `None` when nothing can be selected.
pub fn next_selection_index(current: Option<usize>, len: usize, direction: i32) -> Option<usize> {
    if len == 0 {
        return None;
    }

    let max = len - 1;
    match current {
        None if direction > 0 => Some(0),
        None => None,
        Some(index) if direction < 0 => Some(index.saturating_sub(1)),
        Some(index) if direction > 0 => Some((index + 1).min(max)),
        Some(index) => Some(index.min(max)),
    }
}

use serde::{Deserialize, Serialize};

use crate::controller::{ControllerEvent, Key};
use crate::suggestions::SuggestionView;

/// Events a host page forwards to the widget.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "kind", content = "payload", rename_all = "snake_case")]
pub enum HostEvent {
    Input(String),
    Key(Key),
    Click(usize),
    OutsideClick,
}

/// Instructions the widget sends back to the host page.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "kind", content = "payload", rename_all = "snake_case")]
pub enum HostCommand {
    Show { html: String, item_count: usize },
    Hide,
    Select(usize),
    ScrollIntoView(usize),
    Navigate(String),
}

impl HostCommand {
    pub fn show(view: &SuggestionView) -> Self {
        Self::Show {
            html: view.to_html(None),
            item_count: view.items().len(),
        }
    }
}

impl From<HostEvent> for ControllerEvent {
    fn from(value: HostEvent) -> Self {
        match value {
            HostEvent::Input(text) => Self::InputChanged(text),
            HostEvent::Key(key) => Self::Key(key),
            HostEvent::Click(index) => Self::ItemClicked(index),
            HostEvent::OutsideClick => Self::OutsideClick,
        }
    }
}

use std::io::Write;
use std::sync::{Arc, Mutex};

use serde::{Deserialize, Serialize};
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tokio::sync::mpsc;
use url::Url;

use crate::contract::{HostCommand, HostEvent};
use crate::controller::ControllerEvent;
use crate::runtime::{Navigator, SuggestionSurface};
use crate::suggestions::SuggestionView;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    InvalidJson,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ErrorResponse {
    pub code: ErrorCode,
    pub message: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum TransportMessage {
    Ok { command: HostCommand },
    Err { error: ErrorResponse },
}

pub fn decode_event(line: &str) -> Result<HostEvent, ErrorResponse> {
    serde_json::from_str::<HostEvent>(line).map_err(|error| ErrorResponse {
        code: ErrorCode::InvalidJson,
        message: error.to_string(),
    })
}

pub fn encode(message: &TransportMessage) -> String {
    serde_json::to_string(message).expect("transport message should serialize")
}

/// Writes one JSON message per line. Clones share the same writer, so one
/// sink can serve as both the surface and the navigator.
pub struct JsonLineSink<W> {
    writer: Arc<Mutex<W>>,
}

impl<W> Clone for JsonLineSink<W> {
    fn clone(&self) -> Self {
        Self {
            writer: Arc::clone(&self.writer),
        }
    }
}

impl<W: Write> JsonLineSink<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer: Arc::new(Mutex::new(writer)),
        }
    }

    pub fn send(&self, message: &TransportMessage) {
        let Ok(mut writer) = self.writer.lock() else {
            return;
        };
        let line = encode(message);
        if let Err(error) = writeln!(writer, "{line}").and_then(|_| writer.flush()) {
            log::warn!("[plantfind] failed to write bridge message: {error}");
        }
    }

    pub fn command(&self, command: HostCommand) {
        self.send(&TransportMessage::Ok { command });
    }

    pub fn with_writer<T>(&self, read: impl FnOnce(&W) -> T) -> Option<T> {
        self.writer.lock().ok().map(|writer| read(&*writer))
    }
}

impl<W: Write + Send> SuggestionSurface for JsonLineSink<W> {
    fn show(&mut self, view: &SuggestionView) {
        self.command(HostCommand::show(view));
    }

    fn hide(&mut self) {
        self.command(HostCommand::Hide);
    }

    fn select(&mut self, index: usize) {
        self.command(HostCommand::Select(index));
    }

    fn scroll_into_view(&mut self, index: usize) {
        self.command(HostCommand::ScrollIntoView(index));
    }
}

impl<W: Write + Send> Navigator for JsonLineSink<W> {
    fn navigate(&mut self, url: &Url) {
        self.command(HostCommand::Navigate(url.to_string()));
    }
}

/// Forwards decoded host events until the reader ends. Lines that do not
/// decode are answered with an error message on `sink`.
pub async fn forward_lines<R, W>(
    reader: R,
    events: mpsc::Sender<ControllerEvent>,
    sink: JsonLineSink<W>,
) -> std::io::Result<()>
where
    R: AsyncBufRead + Unpin,
    W: Write,
{
    let mut lines = reader.lines();
    while let Some(line) = lines.next_line().await? {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        match decode_event(trimmed) {
            Ok(event) => {
                if events.send(event.into()).await.is_err() {
                    break;
                }
            }
            Err(error) => sink.send(&TransportMessage::Err { error }),
        }
    }
    Ok(())
}

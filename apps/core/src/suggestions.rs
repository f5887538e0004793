use std::fmt::Write as _;
use std::ops::Range;

use serde::Serialize;

use crate::model::{Query, Record};
use crate::record_store::RecordStore;

pub const DEFAULT_MAX_SUGGESTIONS: usize = 8;
pub const NO_RESULTS_TEXT: &str = "No results";
pub const LOADING_TEXT: &str = "Loading suggestions\u{2026}";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "payload", rename_all = "snake_case")]
pub enum DisplayName {
    Plain(String),
    Highlighted {
        before: String,
        matched: String,
        after: String,
    },
}

impl DisplayName {
    pub fn text(&self) -> String {
        match self {
            Self::Plain(text) => text.clone(),
            Self::Highlighted {
                before,
                matched,
                after,
            } => format!("{before}{matched}{after}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SuggestionItem {
    pub index: usize,
    pub name: DisplayName,
    pub scientific_name: String,
    pub image_url: String,
    pub record: Record,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "payload", rename_all = "snake_case")]
pub enum SuggestionView {
    Loading,
    Empty,
    Items(Vec<SuggestionItem>),
}

impl SuggestionView {
    pub fn items(&self) -> &[SuggestionItem] {
        match self {
            Self::Items(items) => items,
            Self::Loading | Self::Empty => &[],
        }
    }

    pub fn to_html(&self, selected: Option<usize>) -> String {
        match self {
            Self::Loading => placeholder_html(LOADING_TEXT),
            Self::Empty => placeholder_html(NO_RESULTS_TEXT),
            Self::Items(items) => {
                let mut html = String::new();
                for item in items {
                    write_item_html(&mut html, item, selected == Some(item.index));
                }
                html
            }
        }
    }
}

/// Renders the suggestion list for `query`, or the loading placeholder while
/// the corpus is still being fetched.
pub fn render_for_store(store: &RecordStore, query: &Query, limit: usize) -> SuggestionView {
    if !store.is_ready() {
        return SuggestionView::Loading;
    }
    let matches = crate::search::search(store.records(), query);
    render(&matches, query, limit)
}

pub fn render(matches: &[&Record], query: &Query, limit: usize) -> SuggestionView {
    if matches.is_empty() {
        return SuggestionView::Empty;
    }

    let items = matches
        .iter()
        .take(limit)
        .enumerate()
        .map(|(index, record)| SuggestionItem {
            index,
            name: highlight(&record.name, query),
            scientific_name: record.scientific_name.clone(),
            image_url: record.image_url.clone(),
            record: (*record).clone(),
        })
        .collect();
    SuggestionView::Items(items)
}

pub fn highlight(name: &str, query: &Query) -> DisplayName {
    match find_case_insensitive(name, query.as_str()) {
        Some(range) => DisplayName::Highlighted {
            before: name[..range.start].to_string(),
            matched: name[range.clone()].to_string(),
            after: name[range.end..].to_string(),
        },
        None => DisplayName::Plain(name.to_string()),
    }
}

/// Byte range in `haystack` of the first occurrence of the lower-cased
/// `needle`, comparing against the lower-cased haystack.
pub fn find_case_insensitive(haystack: &str, needle: &str) -> Option<Range<usize>> {
    if needle.is_empty() {
        return None;
    }

    // Lowered as a whole so a word-final sigma agrees with `Record`'s cached
    // form. origin[i] is the haystack offset of the char behind lowered byte i.
    let lowered = haystack.to_lowercase();
    let mut origin = Vec::with_capacity(lowered.len());
    for (offset, ch) in haystack.char_indices() {
        let width: usize = ch.to_lowercase().map(char::len_utf8).sum();
        origin.extend(std::iter::repeat(offset).take(width));
    }
    if origin.len() != lowered.len() {
        return None;
    }

    let start = lowered.find(needle)?;
    let lowered_end = start + needle.len();
    let end = if lowered_end >= lowered.len() {
        haystack.len()
    } else if origin[lowered_end] != origin[lowered_end - 1] {
        origin[lowered_end]
    } else {
        let split = origin[lowered_end];
        split + haystack[split..].chars().next().map_or(0, char::len_utf8)
    };

    Some(origin[start]..end)
}

pub fn escape_html(input: &str) -> String {
    let mut escaped = String::with_capacity(input.len());
    for ch in input.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            other => escaped.push(other),
        }
    }
    escaped
}

fn placeholder_html(text: &str) -> String {
    format!("<div class=\"no-results\">{}</div>", escape_html(text))
}

fn write_item_html(html: &mut String, item: &SuggestionItem, selected: bool) {
    let class = if selected {
        "suggestion-item selected"
    } else {
        "suggestion-item"
    };
    let _ = write!(html, "<div class=\"{class}\" data-idx=\"{}\">", item.index);

    if !item.image_url.is_empty() {
        let _ = write!(
            html,
            "<img class=\"sugg-img\" src=\"{}\" alt=\"{}\">",
            escape_html(&item.image_url),
            escape_html(&item.record.name)
        );
    }

    html.push_str("<div class=\"sugg-text\"><div>");
    match &item.name {
        DisplayName::Plain(text) => html.push_str(&escape_html(text)),
        DisplayName::Highlighted {
            before,
            matched,
            after,
        } => {
            let _ = write!(
                html,
                "{}<strong>{}</strong>{}",
                escape_html(before),
                escape_html(matched),
                escape_html(after)
            );
        }
    }
    html.push_str("</div>");

    if !item.scientific_name.is_empty() {
        let _ = write!(
            html,
            "<div class=\"sugg-sci\">{}</div>",
            escape_html(&item.scientific_name)
        );
    }
    html.push_str("</div></div>");
}

#[cfg(test)]
mod tests {
    use super::find_case_insensitive;

    #[test]
    fn match_range_uses_source_offsets() {
        assert_eq!(find_case_insensitive("Rose Apple", "app"), Some(5..8));
        assert_eq!(find_case_insensitive("ÉCHINACEA", "chin"), Some(2..6));
        assert_eq!(find_case_insensitive("Basil", "mint"), None);
    }
}

// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT
use indexmap::IndexMap;
use serde::Serialize;

/// Reserved parameter holding loose text found directly inside a buffered
/// tool element.
pub const CONTENT_KEY: &str = "content";

/// Parameter name → literal value, in the order the parameters closed.
pub type ParamMap = IndexMap<String, String>;

/// Events produced by the parser, in stream order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum ParseEvent {
    /// A slice of text inside a streaming element, forwarded as soon as it
    /// was known not to be part of the closing tag.
    Content {
        tag: String,
        text: String,
        /// Byte offset of `text` in the whole stream
        offset: usize,
    },
    /// A streaming element closed.  `forced` is set when the stream ended
    /// before its closing tag arrived.
    Finalized { tag: String, forced: bool },
    /// A tool element closed with its complete parameter map.
    ToolParsed { tag: String, params: ParamMap },
    /// The input ended cleanly.
    Completed,
}

/// Merge runs of adjacent `Content` events for the same tag.
///
/// How many `Content` events an element produces depends on where the
/// input happened to be split; the merged sequence does not.
pub fn coalesce_content(events: impl IntoIterator<Item = ParseEvent>) -> Vec<ParseEvent> {
    let mut out: Vec<ParseEvent> = Vec::new();
    for ev in events {
        if let ParseEvent::Content { tag, text, .. } = &ev {
            if let Some(ParseEvent::Content { tag: prev_tag, text: prev_text, .. }) = out.last_mut() {
                if prev_tag == tag {
                    prev_text.push_str(text);
                    continue;
                }
            }
        }
        out.push(ev);
    }
    out
}

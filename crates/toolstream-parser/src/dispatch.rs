// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT
//! Callback-style front end over [`StreamParser`].

use std::collections::HashMap;

use tracing::trace;

use crate::events::{ParamMap, ParseEvent};
use crate::parser::{ParserOptions, StreamParser};
use crate::ParseError;

/// Where a streamed slice came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StreamContext<'a> {
    pub tag: &'a str,
    /// Byte offset of the slice in the whole stream
    pub offset: usize,
}

/// Receiver for the live content of one streaming tag.
pub trait StreamHandler {
    /// Called with each newly recognised slice of element content.
    fn stream(&mut self, chunk: &str, context: Option<&StreamContext<'_>>);
    /// Called exactly once when the element closes, explicitly or because
    /// the stream ended.
    fn finalize(&mut self);
}

type ToolCallback<'a> = Box<dyn FnMut(&str, ParamMap) + 'a>;
type CompleteCallback<'a> = Box<dyn FnMut() + 'a>;

struct Sinks<'a> {
    handlers: HashMap<String, Box<dyn StreamHandler + 'a>>,
    on_tool_parsed: ToolCallback<'a>,
    on_complete: Option<CompleteCallback<'a>>,
}

impl Sinks<'_> {
    fn dispatch(&mut self, events: Vec<ParseEvent>) {
        for ev in events {
            match ev {
                ParseEvent::Content { tag, text, offset } => {
                    if let Some(h) = self.handlers.get_mut(&tag) {
                        h.stream(&text, Some(&StreamContext { tag: &tag, offset }));
                    }
                }
                ParseEvent::Finalized { tag, forced } => {
                    trace!(tag = %tag, forced, "finalizing handler");
                    if let Some(h) = self.handlers.get_mut(&tag) {
                        h.finalize();
                    }
                }
                ParseEvent::ToolParsed { tag, params } => (self.on_tool_parsed)(&tag, params),
                ParseEvent::Completed => {
                    if let Some(cb) = self.on_complete.as_mut() {
                        cb();
                    }
                }
            }
        }
    }
}

/// Drives a [`StreamParser`] and routes its events to handlers and
/// callbacks.
///
/// Streaming tags are exactly the tags that have a registered handler.
/// Register handlers and set options before the first
/// [`push`](Self::push); each builder call starts a fresh parser.
///
/// ```
/// use toolstream_parser::Dispatcher;
///
/// let mut calls = Vec::new();
/// let mut d = Dispatcher::new(|name, params| calls.push((name.to_string(), params)));
/// d.push("<read_file><path>src/lib.rs</pa").unwrap();
/// d.push("th></read_file>").unwrap();
/// d.end().unwrap();
/// assert_eq!(calls[0].0, "read_file");
/// assert_eq!(calls[0].1["path"], "src/lib.rs");
/// ```
pub struct Dispatcher<'a> {
    parser: StreamParser,
    options: ParserOptions,
    sinks: Sinks<'a>,
}

impl<'a> Dispatcher<'a> {
    pub fn new(on_tool_parsed: impl FnMut(&str, ParamMap) + 'a) -> Self {
        let options = ParserOptions::default();
        Self {
            parser: StreamParser::with_options(std::iter::empty::<String>(), options),
            options,
            sinks: Sinks {
                handlers: HashMap::new(),
                on_tool_parsed: Box::new(on_tool_parsed),
                on_complete: None,
            },
        }
    }

    /// Route the content of `<tag>` elements live to `handler`.
    pub fn with_handler(mut self, tag: impl Into<String>, handler: impl StreamHandler + 'a) -> Self {
        self.sinks.handlers.insert(tag.into(), Box::new(handler));
        self.rebuild_parser();
        self
    }

    pub fn with_options(mut self, options: ParserOptions) -> Self {
        self.options = options;
        self.rebuild_parser();
        self
    }

    /// Called once when the stream ends cleanly.
    pub fn on_complete(mut self, on_complete: impl FnMut() + 'a) -> Self {
        self.sinks.on_complete = Some(Box::new(on_complete));
        self
    }

    fn rebuild_parser(&mut self) {
        let tags: Vec<String> = self.sinks.handlers.keys().cloned().collect();
        self.parser = StreamParser::with_options(tags, self.options);
    }

    /// Feed the next fragment.  Callbacks for everything that completed
    /// before an error still run; nothing after it does.
    pub fn push(&mut self, chunk: &str) -> Result<(), ParseError> {
        let mut events = Vec::new();
        let result = self.parser.push_into(chunk, &mut events);
        self.sinks.dispatch(events);
        result
    }

    pub fn end(self) -> Result<(), ParseError> {
        let Dispatcher { parser, mut sinks, .. } = self;
        let mut events = Vec::new();
        let result = parser.end_into(&mut events);
        sinks.dispatch(events);
        result
    }
}

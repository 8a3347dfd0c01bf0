// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT
//! The tool-element state machine.
//!
//! Input is appended to a pending buffer and consumed as far as it can be
//! classified.  Whatever cannot be classified yet (a `<` that may still turn
//! into a tag, or the start of a parameter's closing sequence) stays pending
//! until the next [`StreamParser::push`].

use std::collections::HashSet;

use toolstream_config::{ContentPolicy, ForcedEndPolicy, ParserConfig};
use tracing::{debug, trace, warn};

use crate::events::{ParamMap, ParseEvent, CONTENT_KEY};
use crate::tag::{self, TagScan};
use crate::ParseError;

/// Behavioural switches for the less common stream shapes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ParserOptions {
    pub content_policy: ContentPolicy,
    pub forced_end_policy: ForcedEndPolicy,
}

impl From<&ParserConfig> for ParserOptions {
    fn from(cfg: &ParserConfig) -> Self {
        Self {
            content_policy: cfg.content_policy,
            forced_end_policy: cfg.forced_end_policy,
        }
    }
}

#[derive(Debug)]
enum State {
    Idle,
    Streaming { tag: String },
    Buffered(BufferedTool),
}

#[derive(Debug)]
struct BufferedTool {
    tag: String,
    params: ParamMap,
    content: String,
    param: Option<OpenParam>,
}

#[derive(Debug)]
struct OpenParam {
    name: String,
    /// `</name>`, searched for literally
    closing: String,
    value: String,
}

impl BufferedTool {
    fn new(tag: String) -> Self {
        Self { tag, params: ParamMap::new(), content: String::new(), param: None }
    }

    fn open_param(&mut self, name: String) {
        trace!(tag = %self.tag, param = %name, "parameter opened");
        let closing = format!("</{name}>");
        self.param = Some(OpenParam { name, closing, value: String::new() });
    }

    fn close_param(&mut self, param: OpenParam) {
        trace!(tag = %self.tag, param = %param.name, len = param.value.len(), "parameter closed");
        if self.params.insert(param.name.clone(), param.value).is_some() {
            debug!(tag = %self.tag, param = %param.name, "parameter repeated; keeping the last value");
        }
    }

    fn finish(self, policy: ContentPolicy) -> ParseEvent {
        let BufferedTool { tag, mut params, content, .. } = self;
        let blank = content.trim().is_empty();
        let keep = match policy {
            ContentPolicy::Fold => !content.is_empty(),
            ContentPolicy::FoldNonBlank => !blank,
            // Only whitespace can get this far.
            ContentPolicy::Reject => false,
        };
        if keep {
            if !params.contains_key(CONTENT_KEY) {
                params.insert(CONTENT_KEY.to_string(), content);
            } else if blank {
                trace!(tag = %tag, "explicit <content> parameter shadows whitespace");
            } else {
                warn!(tag = %tag, "explicit <content> parameter shadows loose element text");
            }
        }
        debug!(tag = %tag, params = params.len(), "tool element parsed");
        ParseEvent::ToolParsed { tag, params }
    }
}

enum Step {
    Continue,
    NeedMore,
}

/// Incremental parser for one model response.
///
/// Feed text with [`push`](Self::push) in fragments of any size and finish
/// with [`end`](Self::end).  After an error every further `push` returns the
/// same error; a new stream needs a new parser.
#[derive(Debug)]
pub struct StreamParser {
    streaming_tags: HashSet<String>,
    options: ParserOptions,
    state: State,
    pending: String,
    /// Bytes at the front of `pending` that are already classified.
    /// Compacted once per push.
    consumed: usize,
    /// Stream offset of the first unconsumed byte
    offset: usize,
    failed: Option<ParseError>,
}

impl StreamParser {
    /// Parser with default options.  Elements named in `streaming_tags` are
    /// forwarded live; every other element is buffered.
    pub fn new<I, S>(streaming_tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::with_options(streaming_tags, ParserOptions::default())
    }

    pub fn with_options<I, S>(streaming_tags: I, options: ParserOptions) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            streaming_tags: streaming_tags.into_iter().map(Into::into).collect(),
            options,
            state: State::Idle,
            pending: String::new(),
            consumed: 0,
            offset: 0,
            failed: None,
        }
    }

    pub fn from_config(cfg: &ParserConfig) -> Self {
        Self::with_options(cfg.streaming_tags.iter().cloned(), ParserOptions::from(cfg))
    }

    pub fn is_streaming_tag(&self, tag: &str) -> bool {
        self.streaming_tags.contains(tag)
    }

    /// Name of the tool element currently open, if any.
    pub fn open_element(&self) -> Option<&str> {
        match &self.state {
            State::Idle => None,
            State::Streaming { tag } => Some(tag.as_str()),
            State::Buffered(tool) => Some(tool.tag.as_str()),
        }
    }

    /// Total bytes pushed so far.
    pub fn bytes_seen(&self) -> usize {
        self.offset + self.rest().len()
    }

    /// Input not yet classified.
    fn rest(&self) -> &str {
        &self.pending[self.consumed..]
    }

    pub fn push(&mut self, chunk: &str) -> Result<Vec<ParseEvent>, ParseError> {
        let mut events = Vec::new();
        self.push_into(chunk, &mut events)?;
        Ok(events)
    }

    /// Like [`push`](Self::push), but appends to `events`.  Events that
    /// completed before an error are left in `events`.
    pub fn push_into(&mut self, chunk: &str, events: &mut Vec<ParseEvent>) -> Result<(), ParseError> {
        if let Some(err) = &self.failed {
            return Err(err.clone());
        }
        trace!(len = chunk.len(), offset = self.bytes_seen(), "push");
        self.pending.push_str(chunk);
        let result = self.drain(events);
        self.pending.replace_range(..self.consumed, "");
        self.consumed = 0;
        if let Err(e) = &result {
            debug!(error = %e, "parse failed");
            self.failed = Some(e.clone());
        }
        result
    }

    pub fn end(self) -> Result<Vec<ParseEvent>, ParseError> {
        let mut events = Vec::new();
        self.end_into(&mut events)?;
        Ok(events)
    }

    /// Like [`end`](Self::end), but appends to `events`.
    pub fn end_into(mut self, events: &mut Vec<ParseEvent>) -> Result<(), ParseError> {
        if let Some(err) = self.failed.take() {
            return Err(err);
        }
        match std::mem::replace(&mut self.state, State::Idle) {
            State::Idle => {
                // Anything left here is a `<…` that never became a tag.
                let pending = self.rest();
                let rest = pending.trim_start();
                if !rest.is_empty() {
                    return Err(ParseError::UnexpectedTextOutsideElement {
                        text: rest.to_string(),
                        offset: self.offset + (pending.len() - rest.len()),
                    });
                }
            }
            State::Streaming { tag } => {
                if !self.rest().is_empty() {
                    let offset = self.offset;
                    let text = self.rest().to_string();
                    events.push(ParseEvent::Content { tag: tag.clone(), text, offset });
                }
                debug!(tag = %tag, "stream ended inside streaming element");
                events.push(ParseEvent::Finalized { tag: tag.clone(), forced: true });
                if self.options.forced_end_policy == ForcedEndPolicy::FinalizeAndReport {
                    events.push(ParseEvent::ToolParsed { tag, params: ParamMap::new() });
                }
            }
            State::Buffered(tool) => {
                return Err(ParseError::StreamEndedInsideElement {
                    tag: tool.tag,
                    param: tool.param.map(|p| p.name),
                });
            }
        }
        events.push(ParseEvent::Completed);
        Ok(())
    }

    fn drain(&mut self, events: &mut Vec<ParseEvent>) -> Result<(), ParseError> {
        while !self.rest().is_empty() {
            let (next, step) = match std::mem::replace(&mut self.state, State::Idle) {
                State::Idle => self.step_idle()?,
                State::Streaming { tag } => self.step_streaming(tag, events)?,
                State::Buffered(tool) => self.step_buffered(tool, events)?,
            };
            self.state = next;
            if let Step::NeedMore = step {
                break;
            }
        }
        Ok(())
    }

    fn step_idle(&mut self) -> Result<(State, Step), ParseError> {
        let ws = self.rest().len() - self.rest().trim_start().len();
        if ws > 0 {
            self.skip(ws);
            return Ok((State::Idle, Step::Continue));
        }
        if !self.rest().starts_with('<') {
            return Err(self.unexpected_text(self.text_run_len(0)));
        }
        match tag::scan(self.rest()) {
            TagScan::Incomplete => Ok((State::Idle, Step::NeedMore)),
            TagScan::NotTag => Err(self.unexpected_text(self.text_run_len(1))),
            TagScan::Tag { name, closing: true, .. } => Err(ParseError::MismatchedClosingTag {
                found: name.to_string(),
                expected: None,
                offset: self.offset,
            }),
            TagScan::Tag { name, closing: false, len } => {
                let name = name.to_string();
                self.skip(len);
                Ok((self.enter_element(name), Step::Continue))
            }
        }
    }

    fn enter_element(&self, tag: String) -> State {
        if self.streaming_tags.contains(&tag) {
            debug!(tag = %tag, "streaming element opened");
            State::Streaming { tag }
        } else {
            debug!(tag = %tag, "buffered element opened");
            State::Buffered(BufferedTool::new(tag))
        }
    }

    fn step_streaming(
        &mut self,
        tag: String,
        events: &mut Vec<ParseEvent>,
    ) -> Result<(State, Step), ParseError> {
        let run = self.text_run_len(0);
        if run > 0 {
            self.emit_content(&tag, run, events);
            return Ok((State::Streaming { tag }, Step::Continue));
        }
        match tag::scan(self.rest()) {
            TagScan::Incomplete => Ok((State::Streaming { tag }, Step::NeedMore)),
            TagScan::NotTag => {
                let run = self.text_run_len(1);
                self.emit_content(&tag, run, events);
                Ok((State::Streaming { tag }, Step::Continue))
            }
            TagScan::Tag { name, closing: true, len } if name == tag => {
                self.skip(len);
                debug!(tag = %tag, "streaming element closed");
                events.push(ParseEvent::Finalized { tag: tag.clone(), forced: false });
                events.push(ParseEvent::ToolParsed { tag, params: ParamMap::new() });
                Ok((State::Idle, Step::Continue))
            }
            TagScan::Tag { name, closing: true, .. } => Err(ParseError::MismatchedClosingTag {
                found: name.to_string(),
                expected: Some(tag),
                offset: self.offset,
            }),
            TagScan::Tag { name, closing: false, .. } => Err(ParseError::UnexpectedOpeningTag {
                tag: name.to_string(),
                open: tag,
                offset: self.offset,
            }),
        }
    }

    fn step_buffered(
        &mut self,
        mut tool: BufferedTool,
        events: &mut Vec<ParseEvent>,
    ) -> Result<(State, Step), ParseError> {
        if let Some(mut param) = tool.param.take() {
            // Inside a parameter only its own closing sequence is markup.
            return match self.rest().find(&param.closing) {
                Some(pos) => {
                    param.value.push_str(&self.rest()[..pos]);
                    self.skip(pos + param.closing.len());
                    tool.close_param(param);
                    Ok((State::Buffered(tool), Step::Continue))
                }
                None => {
                    let keep = tag::partial_suffix_len(self.rest(), &param.closing);
                    let take = self.rest().len() - keep;
                    param.value.push_str(&self.rest()[..take]);
                    self.skip(take);
                    tool.param = Some(param);
                    Ok((State::Buffered(tool), Step::NeedMore))
                }
            };
        }

        let run = self.text_run_len(0);
        if run > 0 {
            self.fold_content(&mut tool, run)?;
            return Ok((State::Buffered(tool), Step::Continue));
        }
        match tag::scan(self.rest()) {
            TagScan::Incomplete => Ok((State::Buffered(tool), Step::NeedMore)),
            TagScan::NotTag => {
                let run = self.text_run_len(1);
                self.fold_content(&mut tool, run)?;
                Ok((State::Buffered(tool), Step::Continue))
            }
            TagScan::Tag { name, closing: true, len } if name == tool.tag => {
                self.skip(len);
                events.push(tool.finish(self.options.content_policy));
                Ok((State::Idle, Step::Continue))
            }
            TagScan::Tag { name, closing: true, .. } => Err(ParseError::MismatchedClosingTag {
                found: name.to_string(),
                expected: Some(tool.tag),
                offset: self.offset,
            }),
            TagScan::Tag { name, closing: false, len } => {
                let name = name.to_string();
                self.skip(len);
                tool.open_param(name);
                Ok((State::Buffered(tool), Step::Continue))
            }
        }
    }

    /// Length of the pending text before the next `<` at or after `from`.
    fn text_run_len(&self, from: usize) -> usize {
        let rest = self.rest();
        rest[from..].find('<').map_or(rest.len(), |i| from + i)
    }

    fn skip(&mut self, n: usize) {
        self.consumed += n;
        self.offset += n;
    }

    fn take(&mut self, n: usize) -> String {
        let text = self.rest()[..n].to_string();
        self.skip(n);
        text
    }

    fn emit_content(&mut self, tag: &str, n: usize, events: &mut Vec<ParseEvent>) {
        let offset = self.offset;
        let text = self.take(n);
        trace!(tag = %tag, len = text.len(), "content");
        events.push(ParseEvent::Content { tag: tag.to_string(), text, offset });
    }

    fn fold_content(&mut self, tool: &mut BufferedTool, n: usize) -> Result<(), ParseError> {
        let offset = self.offset;
        let text = self.take(n);
        if self.options.content_policy == ContentPolicy::Reject && !text.trim().is_empty() {
            return Err(ParseError::UnexpectedTextOutsideElement {
                text: text.trim().to_string(),
                offset,
            });
        }
        tool.content.push_str(&text);
        Ok(())
    }

    fn unexpected_text(&self, len: usize) -> ParseError {
        ParseError::UnexpectedTextOutsideElement {
            text: self.rest()[..len].trim_end().to_string(),
            offset: self.offset,
        }
    }
}

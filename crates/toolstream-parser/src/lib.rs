// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT
//! Incremental extraction of pseudo-XML tool elements from model output.
//!
//! [`StreamParser`] is the pure state machine: text goes in through
//! [`StreamParser::push`], ordered [`ParseEvent`]s come out.  [`Dispatcher`]
//! wraps it for callers that prefer per-tag handlers and callbacks, and
//! [`parse_chunks`] adapts it to an async stream of text fragments.
mod error;
mod events;
mod tag;
mod parser;
mod dispatch;
mod stream;

pub use error::ParseError;
pub use events::{coalesce_content, ParamMap, ParseEvent, CONTENT_KEY};
pub use parser::{ParserOptions, StreamParser};
pub use dispatch::{Dispatcher, StreamContext, StreamHandler};
pub use stream::parse_chunks;
pub use toolstream_config::{ContentPolicy, ForcedEndPolicy};

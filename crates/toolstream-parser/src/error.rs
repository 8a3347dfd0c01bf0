// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT
use thiserror::Error;

/// Fatal parse failures.  Offsets are byte positions in the whole stream,
/// counted from the first byte ever pushed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("unexpected text {text:?} outside of a tool element at byte {offset}")]
    UnexpectedTextOutsideElement { text: String, offset: usize },

    #[error("unexpected opening tag <{tag}> inside streaming element <{open}> at byte {offset}")]
    UnexpectedOpeningTag { tag: String, open: String, offset: usize },

    #[error("closing tag </{found}> does not match {} at byte {offset}", describe_open(.expected))]
    MismatchedClosingTag {
        found: String,
        expected: Option<String>,
        offset: usize,
    },

    #[error("stream ended inside <{tag}>{}", describe_param(.param))]
    StreamEndedInsideElement { tag: String, param: Option<String> },
}

fn describe_open(expected: &Option<String>) -> String {
    match expected {
        Some(tag) => format!("open element <{tag}>"),
        None => "any open element".to_string(),
    }
}

fn describe_param(param: &Option<String>) -> String {
    match param {
        Some(p) => format!(" while parameter <{p}> was still open"),
        None => String::new(),
    }
}

impl ParseError {
    /// Byte offset where the problem was detected, if it has one.
    pub fn offset(&self) -> Option<usize> {
        match self {
            ParseError::UnexpectedTextOutsideElement { offset, .. }
            | ParseError::UnexpectedOpeningTag { offset, .. }
            | ParseError::MismatchedClosingTag { offset, .. } => Some(*offset),
            ParseError::StreamEndedInsideElement { .. } => None,
        }
    }
}

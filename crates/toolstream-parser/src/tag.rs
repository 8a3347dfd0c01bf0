// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT
//! Recognition of `<name>` / `</name>` markup at the start of a buffer.
//!
//! Names start with an ASCII letter or `_` and continue with ASCII
//! alphanumerics, `_`, `-`, `.` or `:`.  There are no attributes, so the
//! name must be followed directly by `>`.

/// Outcome of looking at a buffer that starts with `<`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum TagScan<'a> {
    /// The buffer ends before the markup could be classified.
    Incomplete,
    /// The `<` does not start markup; it is plain text.
    NotTag,
    /// A complete tag spanning `len` bytes.
    Tag { name: &'a str, closing: bool, len: usize },
}

fn is_name_start(b: u8) -> bool {
    b.is_ascii_alphabetic() || b == b'_'
}

fn is_name_char(b: u8) -> bool {
    b.is_ascii_alphanumeric() || matches!(b, b'_' | b'-' | b'.' | b':')
}

/// Classify the markup at the start of `s`, which must begin with `<`.
pub(crate) fn scan(s: &str) -> TagScan<'_> {
    let bytes = s.as_bytes();
    debug_assert_eq!(bytes.first(), Some(&b'<'));

    let mut i = 1;
    let closing = match bytes.get(i) {
        None => return TagScan::Incomplete,
        Some(b'/') => {
            i += 1;
            true
        }
        Some(_) => false,
    };

    let name_start = i;
    match bytes.get(i) {
        None => return TagScan::Incomplete,
        Some(&b) if is_name_start(b) => i += 1,
        Some(_) => return TagScan::NotTag,
    }
    while let Some(&b) = bytes.get(i) {
        if !is_name_char(b) {
            break;
        }
        i += 1;
    }

    match bytes.get(i) {
        None => TagScan::Incomplete,
        Some(b'>') => TagScan::Tag {
            name: &s[name_start..i],
            closing,
            len: i + 1,
        },
        Some(_) => TagScan::NotTag,
    }
}

/// Length of the longest suffix of `s` that is a proper prefix of `needle`.
///
/// That suffix may still grow into `needle` once more input arrives, so it
/// must be held back.  `needle` is ASCII, so the split point is always a
/// char boundary.
pub(crate) fn partial_suffix_len(s: &str, needle: &str) -> usize {
    let max = needle.len().saturating_sub(1).min(s.len());
    (1..=max)
        .rev()
        .find(|&k| s.as_bytes().ends_with(&needle.as_bytes()[..k]))
        .unwrap_or(0)
}

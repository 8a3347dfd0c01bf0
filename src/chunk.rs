// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT

/// Split `input` into slices of at most `size` characters.
///
/// A `size` of 0 yields the whole input as one slice.  Splits always fall
/// on char boundaries.
pub fn split_chars(input: &str, size: usize) -> Vec<&str> {
    if size == 0 || input.is_empty() {
        return if input.is_empty() { Vec::new() } else { vec![input] };
    }
    let mut out = Vec::new();
    let mut start = 0;
    for (count, (idx, _)) in input.char_indices().enumerate() {
        if count > 0 && count % size == 0 {
            out.push(&input[start..idx]);
            start = idx;
        }
    }
    out.push(&input[start..]);
    out
}

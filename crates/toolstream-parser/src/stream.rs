// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT
use futures::stream::{self, Stream, StreamExt};

use crate::{ParseError, ParseEvent, StreamParser};

/// Run a stream of text fragments through `parser`.
///
/// Yields every event in order, calls [`StreamParser::end`] once the input
/// is exhausted, and stops after the first error (which is yielded as the
/// final item).  Events completed in the same fragment before the error are
/// yielded first.
pub fn parse_chunks<S, T>(
    chunks: S,
    parser: StreamParser,
) -> impl Stream<Item = Result<ParseEvent, ParseError>>
where
    S: Stream<Item = T> + Unpin,
    T: AsRef<str>,
{
    stream::unfold(Some((chunks, parser)), |state| async move {
        let Some((mut chunks, mut parser)) = state else {
            return None;
        };
        let mut events = Vec::new();
        let (result, next) = match chunks.next().await {
            Some(chunk) => {
                let result = parser.push_into(chunk.as_ref(), &mut events);
                let next = result.is_ok().then_some((chunks, parser));
                (result, next)
            }
            None => (parser.end_into(&mut events), None),
        };
        let mut batch: Vec<Result<ParseEvent, ParseError>> = events.into_iter().map(Ok).collect();
        if let Err(e) = result {
            batch.push(Err(e));
        }
        Some((batch, next))
    })
    .flat_map(stream::iter)
}

#[cfg(test)]
mod tests {
    use futures::StreamExt;

    use super::*;
    use crate::ParamMap;

    async fn collect(chunks: Vec<&'static str>, tags: &[&str]) -> Vec<Result<ParseEvent, ParseError>> {
        let parser = StreamParser::new(tags.iter().copied());
        parse_chunks(stream::iter(chunks), parser).collect().await
    }

    #[tokio::test]
    async fn yields_events_and_completion() {
        let out = collect(vec!["<t><a>1</a>", "</t>"], &[]).await;
        let mut params = ParamMap::new();
        params.insert("a".into(), "1".into());
        assert_eq!(
            out,
            vec![
                Ok(ParseEvent::ToolParsed { tag: "t".into(), params }),
                Ok(ParseEvent::Completed),
            ]
        );
    }

    #[tokio::test]
    async fn streams_content_per_fragment() {
        let out = collect(vec!["<say>", "Hi ", "there", "</say>"], &["say"]).await;
        let texts: Vec<&str> = out
            .iter()
            .filter_map(|r| match r {
                Ok(ParseEvent::Content { text, .. }) => Some(text.as_str()),
                _ => None,
            })
            .collect();
        assert_eq!(texts, vec!["Hi ", "there"]);
        assert_eq!(out.last(), Some(&Ok(ParseEvent::Completed)));
    }

    #[tokio::test]
    async fn stops_after_first_error() {
        let out = collect(vec!["<say>Hello", "</other>", "<more>"], &["say"]).await;
        assert_eq!(out.len(), 2);
        assert!(matches!(&out[0], Ok(ParseEvent::Content { text, .. }) if text == "Hello"));
        assert!(matches!(&out[1], Err(ParseError::MismatchedClosingTag { .. })));
    }

    #[tokio::test]
    async fn end_error_is_the_last_item() {
        let out = collect(vec!["<t><a>unterminated"], &[]).await;
        assert_eq!(
            out,
            vec![Err(ParseError::StreamEndedInsideElement { tag: "t".into(), param: Some("a".into()) })]
        );
    }

    #[tokio::test]
    async fn empty_input_only_completes() {
        let out = collect(vec![], &[]).await;
        assert_eq!(out, vec![Ok(ParseEvent::Completed)]);
    }
}

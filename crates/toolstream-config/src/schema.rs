// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub parser: ParserConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

fn default_streaming_tags() -> Vec<String> {
    vec!["thinking".into(), "final_answer".into()]
}

fn default_chunk_size() -> usize {
    64
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParserConfig {
    /// Tool tags whose content is forwarded live instead of being buffered
    /// into a parameter map.
    ///
    /// ```toml
    /// [parser]
    /// streaming_tags = ["thinking", "final_answer", "speak"]
    /// ```
    #[serde(default = "default_streaming_tags")]
    pub streaming_tags: Vec<String>,
    /// What to do with loose text inside a buffered tool element that is not
    /// wrapped in a parameter tag.
    #[serde(default)]
    pub content_policy: ContentPolicy,
    /// What to report when the stream ends while a streaming element is
    /// still open.
    #[serde(default)]
    pub forced_end_policy: ForcedEndPolicy,
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self {
            streaming_tags: default_streaming_tags(),
            content_policy: ContentPolicy::Fold,
            forced_end_policy: ForcedEndPolicy::FinalizeOnly,
        }
    }
}

/// Handling of text that sits directly inside a buffered tool element,
/// outside of any parameter tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContentPolicy {
    /// Collect it verbatim under the reserved `content` parameter.
    #[default]
    Fold,
    /// Like `Fold`, but leave `content` out when the collected text is
    /// only whitespace.
    FoldNonBlank,
    /// Treat any non-whitespace loose text as a fatal parse error.
    Reject,
}

impl std::fmt::Display for ContentPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ContentPolicy::Fold => write!(f, "fold"),
            ContentPolicy::FoldNonBlank => write!(f, "fold_non_blank"),
            ContentPolicy::Reject => write!(f, "reject"),
        }
    }
}

/// Events produced when `end()` closes a streaming element that never saw
/// its closing tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ForcedEndPolicy {
    /// Only finalize the handler.
    #[default]
    FinalizeOnly,
    /// Finalize the handler and also report the element as a parsed tool
    /// with an empty parameter map.
    FinalizeAndReport,
}

impl std::fmt::Display for ForcedEndPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ForcedEndPolicy::FinalizeOnly => write!(f, "finalize_only"),
            ForcedEndPolicy::FinalizeAndReport => write!(f, "finalize_and_report"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Event rendering used by the CLI
    #[serde(default)]
    pub format: OutputFormat,
    /// Size, in characters, of the slices the CLI feeds to the parser.
    /// 0 pushes the whole transcript in a single call.
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            format: OutputFormat::Text,
            chunk_size: default_chunk_size(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Human-readable transcript of parse events
    #[default]
    Text,
    /// One JSON object per event, newline-delimited
    Json,
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputFormat::Text => write!(f, "text"),
            OutputFormat::Json => write!(f, "json"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // ── Defaults ─────────────────────────────────────────────────────────────

    #[test]
    fn default_streaming_tags_cover_thinking_and_final_answer() {
        let c = Config::default();
        assert_eq!(c.parser.streaming_tags, vec!["thinking", "final_answer"]);
    }

    #[test]
    fn default_policies_are_permissive() {
        let c = Config::default();
        assert_eq!(c.parser.content_policy, ContentPolicy::Fold);
        assert_eq!(c.parser.forced_end_policy, ForcedEndPolicy::FinalizeOnly);
    }

    #[test]
    fn default_output_is_text_in_small_chunks() {
        let c = Config::default();
        assert_eq!(c.output.format, OutputFormat::Text);
        assert_eq!(c.output.chunk_size, 64);
    }

    // ── Deserialization ──────────────────────────────────────────────────────

    #[test]
    fn empty_document_yields_defaults() {
        let c: Config = toml::from_str("").unwrap();
        assert_eq!(c, Config::default());
    }

    #[test]
    fn partial_parser_section_keeps_other_defaults() {
        let c: Config = toml::from_str(r#"[parser]
content_policy = "reject""#).unwrap();
        assert_eq!(c.parser.content_policy, ContentPolicy::Reject);
        assert_eq!(c.parser.streaming_tags, default_streaming_tags());
        assert_eq!(c.parser.forced_end_policy, ForcedEndPolicy::FinalizeOnly);
    }

    #[test]
    fn forced_end_policy_uses_snake_case() {
        let c: Config = toml::from_str(r#"[parser]
forced_end_policy = "finalize_and_report""#).unwrap();
        assert_eq!(c.parser.forced_end_policy, ForcedEndPolicy::FinalizeAndReport);
    }

    #[test]
    fn output_format_is_lowercase() {
        let c: Config = toml::from_str(r#"[output]
format = "json"
chunk_size = 0"#).unwrap();
        assert_eq!(c.output.format, OutputFormat::Json);
        assert_eq!(c.output.chunk_size, 0);
    }

    #[test]
    fn content_policy_uses_snake_case() {
        let c: Config = toml::from_str(r#"[parser]
content_policy = "fold_non_blank""#).unwrap();
        assert_eq!(c.parser.content_policy, ContentPolicy::FoldNonBlank);
        assert_eq!(ContentPolicy::FoldNonBlank.to_string(), "fold_non_blank");
    }

    #[test]
    fn unknown_policy_is_rejected() {
        let r: Result<Config, _> = toml::from_str(r#"[parser]
content_policy = "ignore""#);
        assert!(r.is_err());
    }

    #[test]
    fn display_matches_serialized_names() {
        assert_eq!(ContentPolicy::Reject.to_string(), "reject");
        assert_eq!(ForcedEndPolicy::FinalizeAndReport.to_string(), "finalize_and_report");
        assert_eq!(OutputFormat::Json.to_string(), "json");
    }

    #[test]
    fn config_round_trips_through_toml() {
        let mut c = Config::default();
        c.parser.streaming_tags = vec!["speak".into()];
        c.output.format = OutputFormat::Json;
        let text = toml::to_string(&c).unwrap();
        let back: Config = toml::from_str(&text).unwrap();
        assert_eq!(back, c);
    }
}

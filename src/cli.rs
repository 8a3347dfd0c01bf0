// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT
use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::{generate, Shell};
use std::path::PathBuf;
use toolstream_config::{Config, ContentPolicy, ForcedEndPolicy, OutputFormat};

#[derive(Parser, Debug)]
#[command(
    name = "toolstream",
    about = "Extract tool calls from streamed LLM output",
    version,
    long_about = None,
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Model transcript to parse; stdin is read when omitted
    #[arg(value_name = "FILE")]
    pub file: Option<PathBuf>,

    /// Forward the content of this tag live instead of buffering it.
    /// May be repeated; adds to the tags from the config file.
    #[arg(long = "stream-tag", short = 's', value_name = "TAG")]
    pub stream_tags: Vec<String>,

    /// Ignore configured streaming tags and use only --stream-tag values
    #[arg(long)]
    pub no_default_tags: bool,

    /// Event rendering (text | json)
    #[arg(long, value_enum)]
    pub output_format: Option<OutputFormat>,

    /// Feed the transcript to the parser in slices of this many characters
    /// (0 = all at once).  Useful for replaying how a model streamed it.
    #[arg(long, value_name = "CHARS", env = "TOOLSTREAM_CHUNK_SIZE")]
    pub chunk_size: Option<usize>,

    /// Fail on loose text inside a buffered tool instead of collecting it
    /// under `content`
    #[arg(long)]
    pub strict_content: bool,

    /// Leave out `content` when the loose text inside a buffered tool is
    /// only whitespace
    #[arg(long, conflicts_with = "strict_content")]
    pub skip_blank_content: bool,

    /// Also report a streaming element as a parsed tool when the stream
    /// ends before its closing tag
    #[arg(long)]
    pub report_forced_end: bool,

    /// Path to config file (merged on top of auto-discovered files)
    #[arg(long, short = 'c')]
    pub config: Option<PathBuf>,

    /// Increase verbosity (-v = debug, -vv = trace)
    #[arg(long, short = 'v', action = clap::ArgAction::Count)]
    pub verbose: u8,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Generate shell completion script
    Completions {
        #[arg(value_enum)]
        shell: Shell,
    },
    /// Print the effective configuration and exit
    ShowConfig,
}

impl Cli {
    /// Fold command-line overrides into the loaded configuration.
    pub fn apply_overrides(&self, config: &mut Config) {
        if self.no_default_tags {
            config.parser.streaming_tags.clear();
        }
        for tag in &self.stream_tags {
            if !config.parser.streaming_tags.contains(tag) {
                config.parser.streaming_tags.push(tag.clone());
            }
        }
        if self.strict_content {
            config.parser.content_policy = ContentPolicy::Reject;
        }
        if self.skip_blank_content {
            config.parser.content_policy = ContentPolicy::FoldNonBlank;
        }
        if self.report_forced_end {
            config.parser.forced_end_policy = ForcedEndPolicy::FinalizeAndReport;
        }
        if let Some(format) = self.output_format {
            config.output.format = format;
        }
        if let Some(size) = self.chunk_size {
            config.output.chunk_size = size;
        }
    }
}

pub fn print_completions(shell: Shell) {
    let mut cmd = Cli::command();
    generate(shell, &mut cmd, "toolstream", &mut std::io::stdout());
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("toolstream").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn no_flags_leave_config_untouched() {
        let mut cfg = Config::default();
        parse(&[]).apply_overrides(&mut cfg);
        assert_eq!(cfg, Config::default());
    }

    #[test]
    fn stream_tags_are_added_once() {
        let mut cfg = Config::default();
        parse(&["-s", "speak", "--stream-tag", "thinking"]).apply_overrides(&mut cfg);
        assert_eq!(cfg.parser.streaming_tags, vec!["thinking", "final_answer", "speak"]);
    }

    #[test]
    fn no_default_tags_keeps_only_cli_tags() {
        let mut cfg = Config::default();
        parse(&["--no-default-tags", "-s", "speak"]).apply_overrides(&mut cfg);
        assert_eq!(cfg.parser.streaming_tags, vec!["speak"]);
    }

    #[test]
    fn policy_and_output_flags_override_config() {
        let mut cfg = Config::default();
        parse(&[
            "--strict-content",
            "--report-forced-end",
            "--output-format",
            "json",
            "--chunk-size",
            "0",
            "transcript.txt",
        ])
        .apply_overrides(&mut cfg);
        assert_eq!(cfg.parser.content_policy, ContentPolicy::Reject);
        assert_eq!(cfg.parser.forced_end_policy, ForcedEndPolicy::FinalizeAndReport);
        assert_eq!(cfg.output.format, OutputFormat::Json);
        assert_eq!(cfg.output.chunk_size, 0);
    }

    #[test]
    fn skip_blank_content_selects_fold_non_blank() {
        let mut cfg = Config::default();
        parse(&["--skip-blank-content"]).apply_overrides(&mut cfg);
        assert_eq!(cfg.parser.content_policy, ContentPolicy::FoldNonBlank);
    }

    #[test]
    fn content_flags_conflict() {
        let r = Cli::try_parse_from(["toolstream", "--strict-content", "--skip-blank-content"]);
        assert!(r.is_err());
    }

    #[test]
    fn file_is_positional() {
        let cli = parse(&["out.txt"]);
        assert_eq!(cli.file, Some(PathBuf::from("out.txt")));
        assert!(cli.command.is_none());
    }
}

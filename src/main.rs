// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT
mod chunk;
mod cli;
mod output;

use std::io::{self, Read};
use std::path::Path;

use anyhow::Context;
use clap::Parser;
use futures::StreamExt;
use tracing::debug;
use tracing_subscriber::{filter::EnvFilter, fmt, prelude::*};

use cli::{Cli, Commands};
use output::Renderer;
use toolstream_parser::{parse_chunks, StreamParser};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbose);

    if let Some(Commands::Completions { shell }) = &cli.command {
        cli::print_completions(*shell);
        return Ok(());
    }

    let mut config = toolstream_config::load(cli.config.as_deref())?;
    cli.apply_overrides(&mut config);

    if let Some(Commands::ShowConfig) = &cli.command {
        print!(
            "{}",
            toml::to_string_pretty(&config).context("serializing configuration")?
        );
        return Ok(());
    }

    let input = read_input(cli.file.as_deref())?;
    let chunks = chunk::split_chars(&input, config.output.chunk_size);
    debug!(
        bytes = input.len(),
        chunks = chunks.len(),
        streaming_tags = ?config.parser.streaming_tags,
        "parsing transcript"
    );

    let parser = StreamParser::from_config(&config.parser);
    let mut events = Box::pin(parse_chunks(futures::stream::iter(chunks), parser));
    let mut renderer = Renderer::new(io::stdout().lock(), config.output.format);

    while let Some(item) = events.next().await {
        match item {
            Ok(event) => renderer.render(&event).context("writing output")?,
            Err(e) => {
                let source = cli
                    .file
                    .as_deref()
                    .map(|p| p.display().to_string())
                    .unwrap_or_else(|| "<stdin>".to_string());
                return Err(e).with_context(|| format!("parsing {source}"));
            }
        }
    }
    Ok(())
}

/// Read the whole transcript from `file`, or from stdin when none is given.
fn read_input(file: Option<&Path>) -> anyhow::Result<String> {
    if let Some(path) = file {
        return std::fs::read_to_string(path)
            .with_context(|| format!("reading transcript {}", path.display()));
    }
    if is_stdin_tty() {
        anyhow::bail!("no input: pass a transcript file or pipe one on stdin");
    }
    let mut buf = String::new();
    io::stdin()
        .read_to_string(&mut buf)
        .context("reading transcript from stdin")?;
    Ok(buf)
}

fn init_logging(verbosity: u8) {
    let level = match verbosity {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
        .with(filter)
        .init();
}

fn is_stdin_tty() -> bool {
    #[cfg(unix)]
    {
        use std::os::unix::io::AsRawFd;
        unsafe { libc::isatty(io::stdin().as_raw_fd()) != 0 }
    }
    #[cfg(not(unix))]
    {
        false
    }
}

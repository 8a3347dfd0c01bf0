// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT
//! Rendering of parser events for the terminal or for other programs.

use std::io::{self, Write};

use toolstream_config::OutputFormat;
use toolstream_parser::ParseEvent;

pub struct Renderer<W: Write> {
    out: W,
    format: OutputFormat,
    /// Streaming tag whose header has been written and whose content is
    /// still being printed
    live: Option<String>,
}

impl<W: Write> Renderer<W> {
    pub fn new(out: W, format: OutputFormat) -> Self {
        Self { out, format, live: None }
    }

    pub fn render(&mut self, event: &ParseEvent) -> io::Result<()> {
        match self.format {
            OutputFormat::Json => {
                serde_json::to_writer(&mut self.out, event)?;
                writeln!(self.out)?;
            }
            OutputFormat::Text => self.render_text(event)?,
        }
        self.out.flush()
    }

    fn render_text(&mut self, event: &ParseEvent) -> io::Result<()> {
        match event {
            ParseEvent::Content { tag, text, .. } => {
                if self.live.as_deref() != Some(tag.as_str()) {
                    writeln!(self.out, "[{tag}]")?;
                    self.live = Some(tag.clone());
                }
                write!(self.out, "{text}")?;
            }
            ParseEvent::Finalized { tag, forced } => {
                // Content does not necessarily end in a newline.
                if self.live.take().is_some() {
                    writeln!(self.out)?;
                }
                if *forced {
                    writeln!(self.out, "[/{tag}] (stream ended before closing tag)")?;
                } else {
                    writeln!(self.out, "[/{tag}]")?;
                }
            }
            ParseEvent::ToolParsed { tag, params } => {
                writeln!(self.out, "tool: {tag}")?;
                for (key, value) in params {
                    let mut lines = value.lines();
                    writeln!(self.out, "  {key} = {}", lines.next().unwrap_or(""))?;
                    for line in lines {
                        writeln!(self.out, "  {:width$}   {line}", "", width = key.len())?;
                    }
                }
            }
            ParseEvent::Completed => writeln!(self.out, "done")?,
        }
        Ok(())
    }

    #[cfg(test)]
    fn into_inner(self) -> W {
        self.out
    }
}

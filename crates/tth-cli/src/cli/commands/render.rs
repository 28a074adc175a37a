//! Render command handler.

use std::io::{self, Read};
use std::path::Path;

use anyhow::{Context, Result};
use tth_core::config::RenderConfig;
use tth_core::core::turn::{MarkupSink, WriterSink};
use tth_core::markup::{SyntectHighlighter, Transcoder, Transcript, parse_records};

use super::{begin_output, end_output};

pub struct RenderOptions<'a> {
    pub file: Option<&'a Path>,
    pub chunk_size: Option<usize>,
    pub transcript: bool,
    pub page: bool,
    pub render: &'a RenderConfig,
}

pub fn run(options: &RenderOptions<'_>) -> Result<()> {
    let input = read_input(options.file)?;
    let mut sink = WriterSink::new(io::stdout().lock());

    begin_output(&mut sink, options.page)?;
    if options.transcript {
        render_transcript(&input, options.render, &mut sink)?;
    } else {
        render_text(&input, options.chunk_size, options.render, &mut sink)?;
    }
    end_output(&mut sink, options.page)
}

pub fn list_themes() {
    for name in SyntectHighlighter::available_themes() {
        println!("{name}");
    }
}

fn read_input(file: Option<&Path>) -> Result<String> {
    match file {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display())),
        None => {
            let mut input = String::new();
            io::stdin()
                .read_to_string(&mut input)
                .context("Failed to read stdin")?;
            Ok(input)
        }
    }
}

fn render_text(
    input: &str,
    chunk_size: Option<usize>,
    render: &RenderConfig,
    sink: &mut dyn MarkupSink,
) -> Result<()> {
    let mut transcoder = Transcoder::new(render.highlighter());
    match chunk_size {
        Some(size) => {
            for fragment in split_chars(input, size) {
                sink.append(&transcoder.push(fragment))?;
            }
        }
        None => sink.append(&transcoder.push(input))?,
    }
    sink.append(&transcoder.finish())
}

fn render_transcript(input: &str, render: &RenderConfig, sink: &mut dyn MarkupSink) -> Result<()> {
    let records = parse_records(input)?;
    tracing::debug!(records = records.len(), "replaying transcript");

    let mut transcript = Transcript::new(render.highlighter());
    for record in &records {
        sink.append(&transcript.append_record(record))?;
    }
    sink.append(&transcript.finish_turn())
}

/// Splits `input` into pieces of at most `size` characters.
fn split_chars(input: &str, size: usize) -> impl Iterator<Item = &str> {
    let mut rest = input;
    std::iter::from_fn(move || {
        if rest.is_empty() {
            return None;
        }
        let end = rest
            .char_indices()
            .nth(size)
            .map_or(rest.len(), |(idx, _)| idx);
        let (head, tail) = rest.split_at(end);
        rest = tail;
        Some(head)
    })
}

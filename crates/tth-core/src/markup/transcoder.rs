//! Incremental transcoder: raw fragments in, final HTML out.
//!
//! Each call to [`Transcoder::push`] segments the fragment, re-runs the
//! matcher over everything still pending, and feeds the resolved segments
//! through the section state machine. Output returned from a call is never
//! revised by a later call. [`Transcoder::finish`] resolves whatever is
//! still pending as plain text and closes an open code block.

use std::sync::Arc;

use super::highlight::{Highlighter, highlight_code};
use super::matcher::{Label, LabeledSegment, MarkerAction, Matcher, Resolve};
use super::render::{CODE_BLOCK_CLOSE, CODE_BLOCK_OPEN, LINE_BREAK, render_plain};
use super::segment::segment;

/// Rendering mode of the current section.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SectionMode {
    /// Text is escaped and emitted as it resolves.
    #[default]
    Plain,
    /// Text is collected and highlighted one line at a time.
    Code { language: &'static str },
}

/// Per-turn transcoder state.
///
/// One instance serves one assistant turn. Calls take `&mut self`, so
/// fragments are processed strictly in order.
pub struct Transcoder {
    matcher: Matcher,
    highlighter: Arc<dyn Highlighter>,
    /// Identifier run cut off by the end of the last fragment.
    tail: String,
    /// Units not yet resolved into segments.
    queue: Vec<String>,
    mode: SectionMode,
    /// Code text of the current, incomplete line.
    code: String,
    /// Set right after a fence marker; the line break ending the fence line
    /// belongs to the container tag.
    after_fence: bool,
}

impl Transcoder {
    pub fn new(highlighter: Arc<dyn Highlighter>) -> Self {
        Self::with_matcher(Matcher::default(), highlighter)
    }

    pub fn with_matcher(matcher: Matcher, highlighter: Arc<dyn Highlighter>) -> Self {
        Self {
            matcher,
            highlighter,
            tail: String::new(),
            queue: Vec::new(),
            mode: SectionMode::Plain,
            code: String::new(),
            after_fence: false,
        }
    }

    /// Converts a complete text in one go.
    pub fn render_document(highlighter: Arc<dyn Highlighter>, text: &str) -> String {
        let mut transcoder = Self::new(highlighter);
        let mut out = transcoder.push(text);
        out.push_str(&transcoder.finish());
        out
    }

    pub fn mode(&self) -> SectionMode {
        self.mode
    }

    /// Code collected for the current line (empty outside code blocks).
    pub fn code_buffer(&self) -> &str {
        &self.code
    }

    /// Raw text received but not yet resolved into output.
    pub fn pending_text(&self) -> String {
        let mut text = self.queue.concat();
        text.push_str(&self.tail);
        text
    }

    /// Processes one fragment and returns the markup that became final.
    pub fn push(&mut self, fragment: &str) -> String {
        let mut raw = std::mem::take(&mut self.tail);
        raw.push_str(fragment);

        let segmented = segment(&raw);
        self.tail = segmented.tail;
        self.queue.extend(segmented.units);

        self.drain(Resolve::Hold)
    }

    /// Ends the stream: pending text is emitted as plain text (or code),
    /// an open code block is flushed and closed, and the state is reset.
    pub fn finish(&mut self) -> String {
        let tail = std::mem::take(&mut self.tail);
        if !tail.is_empty() {
            self.queue.push(tail);
        }

        let mut out = self.drain(Resolve::Flush);
        if let SectionMode::Code { language } = self.mode {
            self.flush_code(language, &mut out);
            out.push_str(CODE_BLOCK_CLOSE);
            tracing::debug!("stream ended inside a {language} code block");
        }
        self.mode = SectionMode::Plain;
        self.after_fence = false;
        out
    }

    fn drain(&mut self, mode: Resolve) -> String {
        let resolution = self.matcher.resolve(&self.queue, mode);
        self.queue = resolution.remaining;

        let mut out = String::new();
        for segment in resolution.segments {
            self.apply(segment, &mut out);
        }
        out
    }

    fn apply(&mut self, segment: LabeledSegment, out: &mut String) {
        let action = match segment.label {
            Label::Plain => None,
            Label::Marker(index) => self.matcher.pattern(index).map(|pattern| pattern.action),
        };
        let after_fence = std::mem::take(&mut self.after_fence);

        match (self.mode, action) {
            (_, Some(MarkerAction::LineBreak)) if after_fence => {}
            (SectionMode::Plain, Some(MarkerAction::OpenCode { language })) => {
                out.push_str(CODE_BLOCK_OPEN);
                self.mode = SectionMode::Code { language };
                self.after_fence = true;
                tracing::trace!("entering {language} code block");
            }
            (SectionMode::Plain, Some(MarkerAction::LineBreak)) => out.push_str(LINE_BREAK),
            (
                SectionMode::Plain,
                None
                | Some(
                    MarkerAction::OpenSection | MarkerAction::CloseSection | MarkerAction::CloseCode,
                ),
            ) => out.push_str(&render_plain(&segment.text)),
            (SectionMode::Code { language }, Some(MarkerAction::CloseCode)) => {
                self.flush_code(language, out);
                out.push_str(CODE_BLOCK_CLOSE);
                self.mode = SectionMode::Plain;
                self.after_fence = true;
                tracing::trace!("leaving {language} code block");
            }
            (SectionMode::Code { language }, Some(MarkerAction::LineBreak)) => {
                self.code.push('\n');
                self.flush_code(language, out);
            }
            (
                SectionMode::Code { .. },
                None
                | Some(
                    MarkerAction::OpenSection
                    | MarkerAction::CloseSection
                    | MarkerAction::OpenCode { .. },
                ),
            ) => self.code.push_str(&segment.text),
        }
    }

    fn flush_code(&mut self, language: &str, out: &mut String) {
        if self.code.is_empty() {
            return;
        }
        let code = std::mem::take(&mut self.code);
        out.push_str(&highlight_code(self.highlighter.as_ref(), &code, language));
    }
}

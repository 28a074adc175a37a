//! Drives one streamed assistant turn from provider events into a sink.

use std::future::Future;
use std::io::Write;

use anyhow::{Context, Result};
use futures_util::StreamExt;

use crate::core::interrupt;
use crate::markup::{MessageKind, Transcript};
use crate::providers::{ProviderError, ProviderStream, StreamEvent};

/// Append-only display surface for markup.
pub trait MarkupSink {
    /// Appends markup after everything appended before.
    ///
    /// # Errors
    /// Returns an error if the underlying surface cannot be written.
    fn append(&mut self, markup: &str) -> Result<()>;
}

impl MarkupSink for String {
    fn append(&mut self, markup: &str) -> Result<()> {
        self.push_str(markup);
        Ok(())
    }
}

/// Sink over any writer; flushes after every append so partial output is
/// visible while the turn streams.
pub struct WriterSink<W: Write> {
    writer: W,
}

impl<W: Write> WriterSink<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> MarkupSink for WriterSink<W> {
    fn append(&mut self, markup: &str) -> Result<()> {
        if markup.is_empty() {
            return Ok(());
        }
        self.writer
            .write_all(markup.as_bytes())
            .context("Failed to write markup")?;
        self.writer.flush().context("Failed to flush markup")
    }
}

/// How a turn ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TurnOutcome {
    Completed { done_reason: Option<String> },
    /// Ctrl+C stopped the turn; pending text was dropped.
    Interrupted,
}

/// Streams one assistant turn into `sink`, stopping on Ctrl+C.
///
/// The transcript must already have the assistant role label appended.
///
/// # Errors
/// Returns the provider error (after flushing what was received) or a sink
/// write error.
pub async fn run_turn<S>(
    stream: ProviderStream,
    transcript: &mut Transcript,
    sink: &mut S,
) -> Result<TurnOutcome>
where
    S: MarkupSink + ?Sized,
{
    run_turn_until(stream, transcript, sink, interrupt::wait_for_interrupt()).await
}

/// Like [`run_turn`], with an explicit cancellation future.
///
/// # Errors
/// See [`run_turn`].
pub async fn run_turn_until<S, F>(
    mut stream: ProviderStream,
    transcript: &mut Transcript,
    sink: &mut S,
    cancel: F,
) -> Result<TurnOutcome>
where
    S: MarkupSink + ?Sized,
    F: Future<Output = ()>,
{
    tokio::pin!(cancel);

    loop {
        let next = tokio::select! {
            biased;
            () = &mut cancel => {
                transcript.abandon_turn();
                tracing::info!("turn interrupted");
                return Ok(TurnOutcome::Interrupted);
            }
            next = stream.next() => next,
        };

        match next {
            Some(Ok(StreamEvent::TextDelta { text })) => {
                sink.append(&transcript.append(MessageKind::AiText, &text))?;
            }
            Some(Ok(StreamEvent::Completed { done_reason })) => {
                sink.append(&transcript.finish_turn())?;
                tracing::debug!(?done_reason, "turn completed");
                return Ok(TurnOutcome::Completed { done_reason });
            }
            Some(Ok(StreamEvent::Error { message })) => {
                sink.append(&transcript.finish_turn())?;
                return Err(ProviderError::api_error(message).into());
            }
            Some(Err(err)) => {
                sink.append(&transcript.finish_turn())?;
                return Err(err.into());
            }
            None => {
                sink.append(&transcript.finish_turn())?;
                return Ok(TurnOutcome::Completed { done_reason: None });
            }
        }
    }
}

//! Ollama `/api/generate` client.
//!
//! Streaming responses are newline-delimited JSON: one object per line
//! carrying a `response` text piece, and a final object with
//! `"done": true`.

use std::collections::VecDeque;
use std::pin::Pin;

use anyhow::Result;
use futures_util::Stream;
use reqwest::header::{HeaderMap, HeaderValue};
use serde::{Deserialize, Serialize};

use crate::providers::shared::USER_AGENT;
use crate::providers::{
    ProviderError, ProviderErrorKind, ProviderResult, ProviderStream, StreamEvent,
    resolve_base_url,
};

pub const DEFAULT_BASE_URL: &str = "http://localhost:11434";
pub const BASE_URL_ENV: &str = "OLLAMA_BASE_URL";
pub const DEFAULT_TEMPERATURE: f64 = 0.7;
pub const DEFAULT_MAX_TOKENS: u32 = 500;

const GENERATE_PATH: &str = "/api/generate";

/// Ollama client configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct OllamaConfig {
    pub base_url: String,
    pub model: String,
    pub temperature: f64,
    pub max_tokens: u32,
}

impl OllamaConfig {
    /// Builds a config, resolving the base URL as env > config > default.
    ///
    /// # Errors
    /// Returns an error if the resolved base URL is invalid.
    pub fn resolve(
        model: impl Into<String>,
        config_base_url: Option<&str>,
        temperature: f64,
        max_tokens: u32,
    ) -> Result<Self> {
        let base_url = resolve_base_url(config_base_url, BASE_URL_ENV, DEFAULT_BASE_URL, "Ollama")?;
        Ok(Self {
            base_url,
            model: model.into(),
            temperature,
            max_tokens,
        })
    }

    fn generate_url(&self) -> String {
        format!("{}{}", self.base_url.trim_end_matches('/'), GENERATE_PATH)
    }
}

pub struct OllamaClient {
    config: OllamaConfig,
    http: reqwest::Client,
}

impl OllamaClient {
    pub fn new(config: OllamaConfig) -> Self {
        Self {
            config,
            http: reqwest::Client::new(),
        }
    }

    pub fn config(&self) -> &OllamaConfig {
        &self.config
    }

    /// Generates a complete response in one request.
    ///
    /// # Errors
    /// Returns a [`ProviderError`] on transport, HTTP, or decoding failure.
    pub async fn generate(&self, prompt: &str) -> Result<String> {
        let response = self.post(prompt, false).await?;
        let body = response
            .text()
            .await
            .map_err(|e| ProviderError::parse(format!("Failed to read response body: {e}")))?;
        let chunk: GenerateChunk = serde_json::from_str(&body)
            .map_err(|e| ProviderError::parse(format!("Failed to parse response JSON: {e}")))?;
        if let Some(message) = chunk.error {
            return Err(ProviderError::api_error(message).into());
        }
        Ok(chunk.response)
    }

    /// Starts a streaming generation and returns its events.
    ///
    /// # Errors
    /// Returns a [`ProviderError`] if the request fails or the server
    /// answers with a non-success status.
    pub async fn generate_stream(&self, prompt: &str) -> Result<ProviderStream> {
        let response = self.post(prompt, true).await?;
        tracing::debug!(model = %self.config.model, "streaming generation started");
        Ok(Box::pin(NdjsonParser::new(response.bytes_stream())))
    }

    async fn post(&self, prompt: &str, stream: bool) -> Result<reqwest::Response> {
        let request = GenerateRequest {
            model: &self.config.model,
            prompt,
            stream,
            options: GenerateOptions {
                temperature: self.config.temperature,
                num_predict: self.config.max_tokens,
            },
        };

        let response = self
            .http
            .post(self.config.generate_url())
            .headers(build_headers())
            .json(&request)
            .send()
            .await
            .map_err(classify_reqwest_error)?;

        let status = response.status();
        if !status.is_success() {
            let error_body = response.text().await.unwrap_or_default();
            return Err(ProviderError::http_status(status.as_u16(), &error_body).into());
        }
        Ok(response)
    }
}

fn build_headers() -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert("content-type", HeaderValue::from_static("application/json"));
    headers.insert("user-agent", HeaderValue::from_static(USER_AGENT));
    headers
}

fn classify_reqwest_error(e: reqwest::Error) -> ProviderError {
    if e.is_timeout() {
        ProviderError::timeout(format!("Request timed out: {e}"))
    } else if e.is_connect() {
        ProviderError::timeout(format!("Connection failed: {e}"))
    } else if e.is_request() {
        ProviderError::new(ProviderErrorKind::HttpStatus, format!("Request error: {e}"))
    } else {
        ProviderError::new(ProviderErrorKind::HttpStatus, format!("Network error: {e}"))
    }
}

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
    options: GenerateOptions,
}

#[derive(Debug, Serialize)]
struct GenerateOptions {
    temperature: f64,
    num_predict: u32,
}

#[derive(Debug, Deserialize)]
struct GenerateChunk {
    #[serde(default)]
    response: String,
    #[serde(default)]
    done: bool,
    #[serde(default)]
    done_reason: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

/// Turns a byte stream of NDJSON records into [`StreamEvent`]s.
///
/// Bytes are buffered until a full line is available, so records and
/// multi-byte characters split across network chunks decode correctly.
struct NdjsonParser<S> {
    inner: S,
    buffer: Vec<u8>,
    pending: VecDeque<StreamEvent>,
    inner_done: bool,
    emitted_done: bool,
}

impl<S> NdjsonParser<S> {
    fn new(inner: S) -> Self {
        Self {
            inner,
            buffer: Vec::new(),
            pending: VecDeque::new(),
            inner_done: false,
            emitted_done: false,
        }
    }

    fn drain_lines(&mut self) -> ProviderResult<()> {
        while let Some(pos) = self.buffer.iter().position(|b| *b == b'\n') {
            let line: Vec<u8> = self.buffer.drain(..=pos).collect();
            self.handle_line(&line[..pos])?;
        }
        Ok(())
    }

    fn handle_line(&mut self, line: &[u8]) -> ProviderResult<()> {
        let text = std::str::from_utf8(line)
            .map_err(|e| ProviderError::parse(format!("Invalid UTF-8 in stream: {e}")))?;
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return Ok(());
        }

        let chunk: GenerateChunk = serde_json::from_str(trimmed)
            .map_err(|e| ProviderError::parse(format!("Failed to parse NDJSON line: {e}")))?;

        if let Some(message) = chunk.error {
            self.pending.push_back(StreamEvent::Error { message });
            self.emitted_done = true;
            return Ok(());
        }
        if !chunk.response.is_empty() {
            self.pending.push_back(StreamEvent::TextDelta {
                text: chunk.response,
            });
        }
        if chunk.done && !self.emitted_done {
            self.emitted_done = true;
            self.pending.push_back(StreamEvent::Completed {
                done_reason: chunk.done_reason,
            });
        }
        Ok(())
    }

    fn finish(&mut self) -> ProviderResult<()> {
        let rest = std::mem::take(&mut self.buffer);
        self.handle_line(&rest)?;
        if !self.emitted_done {
            tracing::debug!("stream ended without a done record");
            self.emitted_done = true;
            self.pending
                .push_back(StreamEvent::Completed { done_reason: None });
        }
        Ok(())
    }
}

impl<S, E> Stream for NdjsonParser<S>
where
    S: Stream<Item = std::result::Result<bytes::Bytes, E>> + Unpin,
    E: std::error::Error + Send + Sync + 'static,
{
    type Item = ProviderResult<StreamEvent>;

    fn poll_next(
        mut self: Pin<&mut Self>,
        cx: &mut std::task::Context<'_>,
    ) -> std::task::Poll<Option<Self::Item>> {
        use std::task::Poll;

        loop {
            if let Some(event) = self.pending.pop_front() {
                return Poll::Ready(Some(Ok(event)));
            }
            if self.inner_done {
                return Poll::Ready(None);
            }

            let inner = Pin::new(&mut self.inner);
            match inner.poll_next(cx) {
                Poll::Ready(Some(Ok(bytes))) => {
                    self.buffer.extend_from_slice(&bytes);
                    if let Err(err) = self.drain_lines() {
                        return Poll::Ready(Some(Err(err)));
                    }
                }
                Poll::Ready(Some(Err(e))) => {
                    return Poll::Ready(Some(Err(ProviderError::parse(format!(
                        "NDJSON stream error: {e}"
                    )))));
                }
                Poll::Ready(None) => {
                    self.inner_done = true;
                    if let Err(err) = self.finish() {
                        return Poll::Ready(Some(Err(err)));
                    }
                }
                Poll::Pending => return Poll::Pending,
            }
        }
    }
}

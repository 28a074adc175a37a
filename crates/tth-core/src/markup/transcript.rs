//! Conversation transcript: role labels, user text, and streamed assistant
//! turns rendered into one append-only markup document.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};

use super::highlight::Highlighter;
use super::render::{LINE_BREAK, render_text};
use super::transcoder::Transcoder;

/// Kind of a transcript entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageKind {
    /// Label shown before a user message.
    UserRole,
    /// Complete user message text.
    #[serde(alias = "user_words")]
    UserText,
    /// Label shown before an assistant turn; starts the turn.
    AiRole,
    /// One streamed fragment of the assistant turn.
    #[serde(alias = "ai_words")]
    AiText,
}

impl MessageKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::UserRole => "user_role",
            Self::UserText => "user_text",
            Self::AiRole => "ai_role",
            Self::AiText => "ai_text",
        }
    }
}

impl fmt::Display for MessageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MessageKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim() {
            "user_role" => Ok(Self::UserRole),
            "user_text" | "user_words" => Ok(Self::UserText),
            "ai_role" => Ok(Self::AiRole),
            "ai_text" | "ai_words" => Ok(Self::AiText),
            other => bail!(
                "unknown message kind '{other}' (expected user_role, user_text, ai_role or ai_text)"
            ),
        }
    }
}

/// One serialized transcript entry (a JSON Lines record).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranscriptRecord {
    pub kind: MessageKind,
    pub content: String,
}

/// Parses JSON Lines transcript records, skipping blank lines.
pub fn parse_records(input: &str) -> Result<Vec<TranscriptRecord>> {
    input
        .lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(idx, line)| {
            serde_json::from_str(line)
                .with_context(|| format!("Invalid transcript record on line {}", idx + 1))
        })
        .collect()
}

pub struct Transcript {
    highlighter: Arc<dyn Highlighter>,
    turn: Option<Transcoder>,
}

impl Transcript {
    pub fn new(highlighter: Arc<dyn Highlighter>) -> Self {
        Self {
            highlighter,
            turn: None,
        }
    }

    /// Whether an assistant turn is in progress.
    pub fn in_turn(&self) -> bool {
        self.turn.is_some()
    }

    /// Renders one entry and returns the markup to append.
    pub fn append(&mut self, kind: MessageKind, content: &str) -> String {
        match kind {
            MessageKind::UserRole => role_label(content),
            MessageKind::UserText => render_text(content),
            MessageKind::AiRole => {
                if self.turn.is_some() {
                    tracing::debug!("new assistant turn abandons the unfinished one");
                }
                self.turn = Some(Transcoder::new(Arc::clone(&self.highlighter)));
                role_label(content)
            }
            MessageKind::AiText => {
                let highlighter = &self.highlighter;
                self.turn
                    .get_or_insert_with(|| Transcoder::new(Arc::clone(highlighter)))
                    .push(content)
            }
        }
    }

    pub fn append_record(&mut self, record: &TranscriptRecord) -> String {
        self.append(record.kind, &record.content)
    }

    /// Ends the current assistant turn and returns its remaining markup.
    pub fn finish_turn(&mut self) -> String {
        self.turn
            .take()
            .map(|mut transcoder| transcoder.finish())
            .unwrap_or_default()
    }

    /// Drops the current turn without flushing anything it still holds.
    pub fn abandon_turn(&mut self) {
        if let Some(transcoder) = self.turn.take() {
            let pending = transcoder.pending_text();
            if !pending.is_empty() {
                tracing::debug!(pending_len = pending.len(), "abandoned turn with pending text");
            }
        }
    }
}

fn role_label(label: &str) -> String {
    format!("{LINE_BREAK}{}:", render_text(label))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::markup::highlight::PlainHighlighter;

    fn transcript() -> Transcript {
        Transcript::new(Arc::new(PlainHighlighter))
    }

    #[test]
    fn test_message_kind_from_str() {
        assert_eq!("ai_text".parse::<MessageKind>().unwrap(), MessageKind::AiText);
        assert_eq!("user_words".parse::<MessageKind>().unwrap(), MessageKind::UserText);
        let err = "system".parse::<MessageKind>().unwrap_err();
        assert!(err.to_string().contains("unknown message kind 'system'"));
    }

    #[test]
    fn test_message_kind_display_roundtrips() {
        for kind in [
            MessageKind::UserRole,
            MessageKind::UserText,
            MessageKind::AiRole,
            MessageKind::AiText,
        ] {
            assert_eq!(kind.to_string().parse::<MessageKind>().unwrap(), kind);
        }
    }

    #[test]
    fn test_unknown_kind_fails_deserialization() {
        let err = parse_records("{\"kind\":\"ai_text\",\"content\":\"a\"}\n{\"kind\":\"bogus\",\"content\":\"b\"}")
            .unwrap_err();
        assert!(format!("{err:#}").contains("line 2"));
    }

    #[test]
    fn test_role_labels() {
        let mut t = transcript();
        assert_eq!(t.append(MessageKind::UserRole, "You"), "<br>You:");
        assert_eq!(t.append(MessageKind::UserText, "a < b\nc"), "a&nbsp;&lt;&nbsp;b<br>c");
        assert_eq!(t.append(MessageKind::AiRole, "AI"), "<br>AI:");
        assert!(t.in_turn());
    }

    #[test]
    fn test_assistant_turn_streams_and_finishes() {
        let mut t = transcript();
        t.append(MessageKind::AiRole, "AI");
        let mut out = t.append(MessageKind::AiText, "Hello ");
        out.push_str(&t.append(MessageKind::AiText, "wor"));
        assert_eq!(out, "Hello&nbsp;");
        out.push_str(&t.finish_turn());
        assert_eq!(out, "Hello&nbsp;wor");
        assert!(!t.in_turn());
        assert_eq!(t.finish_turn(), "");
    }

    #[test]
    fn test_ai_text_without_role_starts_turn() {
        let mut t = transcript();
        assert_eq!(t.append(MessageKind::AiText, "ok\n"), "ok<br>");
        assert!(t.in_turn());
    }

    #[test]
    fn test_new_role_abandons_previous_turn() {
        let mut t = transcript();
        t.append(MessageKind::AiRole, "AI");
        t.append(MessageKind::AiText, "```python\nx = ");
        t.append(MessageKind::AiRole, "AI");
        assert_eq!(t.append(MessageKind::AiText, "plain\n"), "plain<br>");
    }

    #[test]
    fn test_abandon_turn_drops_pending_text() {
        let mut t = transcript();
        t.append(MessageKind::AiRole, "AI");
        t.append(MessageKind::AiText, "pending");
        t.abandon_turn();
        assert_eq!(t.finish_turn(), "");
    }

    #[test]
    fn test_replay_records() {
        let records = parse_records(concat!(
            "{\"kind\":\"user_role\",\"content\":\"You\"}\n",
            "\n",
            "{\"kind\":\"user_text\",\"content\":\"hi\"}\n",
            "{\"kind\":\"ai_role\",\"content\":\"AI\"}\n",
            "{\"kind\":\"ai_words\",\"content\":\"yo\"}\n",
        ))
        .unwrap();
        assert_eq!(records.len(), 4);

        let mut t = transcript();
        let mut out: String = records.iter().map(|r| t.append_record(r)).collect();
        out.push_str(&t.finish_turn());
        assert_eq!(out, "<br>You:hi<br>AI:yo");
    }
}

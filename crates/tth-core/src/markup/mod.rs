//! Streaming text-to-HTML conversion.
//!
//! Fragments flow through [`segment`] (atomic units), [`matcher`] (marker
//! recognition with hold-back of ambiguous suffixes), and the section state
//! machine in [`transcoder`], which renders plain text directly and code
//! lines through a [`Highlighter`].

pub mod highlight;
pub mod matcher;
pub mod render;
pub mod segment;
pub mod transcoder;
pub mod transcript;

pub use highlight::{DEFAULT_THEME, Highlighter, PlainHighlighter, SyntectHighlighter};
pub use matcher::{VOCABULARY, VOCABULARY_VERSION};
pub use transcoder::{SectionMode, Transcoder};
pub use transcript::{MessageKind, Transcript, TranscriptRecord, parse_records};

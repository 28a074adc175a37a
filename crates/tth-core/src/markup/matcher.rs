//! Marker vocabulary and the matcher that partitions a unit queue into
//! labeled segments.
//!
//! The vocabulary is an ordered table. At each queue position the patterns
//! are probed in table order and the first one that matches wins. A pattern
//! that is still a live prefix when the queue runs out makes the position
//! undecided: the rest of the queue is handed back to the caller so it can
//! be re-evaluated once more units arrive.

/// Version of [`VOCABULARY`]. Bump when the table changes, since matching
/// priority and hold-back behavior depend on the exact pattern contents.
pub const VOCABULARY_VERSION: u32 = 1;

/// Language tagged by the open-code marker.
pub const CODE_LANGUAGE: &str = "python";

/// What a matched marker means to the section state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarkerAction {
    /// `<think>`: start of a reasoning aside.
    OpenSection,
    /// `</think>`: end of a reasoning aside.
    CloseSection,
    /// Language-tagged code fence opening.
    OpenCode { language: &'static str },
    /// Bare code fence (closes a code block).
    CloseCode,
    /// Literal newline.
    LineBreak,
}

/// A marker: a fixed sequence of atomic units and its action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MarkerPattern {
    pub units: &'static [&'static str],
    pub action: MarkerAction,
}

impl MarkerPattern {
    /// Source text of the marker.
    pub fn text(&self) -> String {
        self.units.concat()
    }
}

/// The marker table, in priority order.
pub static VOCABULARY: [MarkerPattern; 5] = [
    MarkerPattern {
        units: &["<", "think", ">"],
        action: MarkerAction::OpenSection,
    },
    MarkerPattern {
        units: &["<", "/", "think", ">"],
        action: MarkerAction::CloseSection,
    },
    MarkerPattern {
        units: &["`", "`", "`", CODE_LANGUAGE],
        action: MarkerAction::OpenCode {
            language: CODE_LANGUAGE,
        },
    },
    MarkerPattern {
        units: &["`", "`", "`"],
        action: MarkerAction::CloseCode,
    },
    MarkerPattern {
        units: &["\n"],
        action: MarkerAction::LineBreak,
    },
];

/// Segment label: plain text or the index of a matched pattern.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Label {
    Plain,
    Marker(usize),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabeledSegment {
    pub text: String,
    pub label: Label,
}

impl LabeledSegment {
    fn plain(text: String) -> Self {
        Self {
            text,
            label: Label::Plain,
        }
    }
}

/// How to treat a queue suffix that could still grow into a marker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolve {
    /// More input may follow: hold undecided suffixes back.
    Hold,
    /// End of stream: everything left is resolved, undecided suffixes as
    /// plain text.
    Flush,
}

/// Output of [`Matcher::resolve`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Resolution {
    pub segments: Vec<LabeledSegment>,
    /// Units that must be carried into the next call.
    pub remaining: Vec<String>,
}

enum Probe {
    Full,
    Partial,
    Mismatch,
}

fn probe(pattern: &[&str], window: &[String]) -> Probe {
    for (offset, expected) in pattern.iter().enumerate() {
        match window.get(offset) {
            Some(unit) if unit == expected => {}
            Some(_) => return Probe::Mismatch,
            None => return Probe::Partial,
        }
    }
    Probe::Full
}

fn flush_plain(segments: &mut Vec<LabeledSegment>, plain: &mut String) {
    if !plain.is_empty() {
        segments.push(LabeledSegment::plain(std::mem::take(plain)));
    }
}

/// Matches unit queues against a marker table.
#[derive(Debug, Clone, Copy)]
pub struct Matcher {
    patterns: &'static [MarkerPattern],
}

impl Default for Matcher {
    fn default() -> Self {
        Self {
            patterns: &VOCABULARY,
        }
    }
}

impl Matcher {
    pub fn new(patterns: &'static [MarkerPattern]) -> Self {
        Self { patterns }
    }

    /// Returns the pattern for a [`Label::Marker`] index.
    pub fn pattern(&self, index: usize) -> Option<&'static MarkerPattern> {
        self.patterns.get(index)
    }

    /// Partitions `queue` into labeled segments.
    ///
    /// With [`Resolve::Hold`], scanning stops at the first position where a
    /// pattern is still a live prefix of the queue end; that position and
    /// everything after it is returned in `remaining`. A live prefix of an
    /// earlier pattern blocks a complete match of a later one, so a bare
    /// fence is not closed while it could still become a tagged open fence.
    pub fn resolve(&self, queue: &[String], mode: Resolve) -> Resolution {
        let mut segments = Vec::new();
        let mut plain = String::new();
        let mut pos = 0;

        'scan: while pos < queue.len() {
            let window = &queue[pos..];
            for (index, pattern) in self.patterns.iter().enumerate() {
                match probe(pattern.units, window) {
                    Probe::Full => {
                        flush_plain(&mut segments, &mut plain);
                        segments.push(LabeledSegment {
                            text: pattern.text(),
                            label: Label::Marker(index),
                        });
                        pos += pattern.units.len();
                        continue 'scan;
                    }
                    Probe::Partial if mode == Resolve::Hold => {
                        flush_plain(&mut segments, &mut plain);
                        return Resolution {
                            segments,
                            remaining: window.to_vec(),
                        };
                    }
                    Probe::Partial | Probe::Mismatch => {}
                }
            }
            plain.push_str(&queue[pos]);
            pos += 1;
        }

        flush_plain(&mut segments, &mut plain);
        Resolution {
            segments,
            remaining: Vec::new(),
        }
    }
}

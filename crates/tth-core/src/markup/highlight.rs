//! Syntax highlighting capability for completed code lines.
//!
//! [`Highlighter`] is the seam: the transcoder only needs "render this code
//! text as HTML for a named language", and must never fail. The default
//! implementation wraps [syntect] with its bundled grammars and themes and
//! emits inline-styled spans, so the markup needs no stylesheet.
//!
//! The grammar and theme databases are process-global singletons loaded on
//! first use.

use std::sync::OnceLock;

use syntect::easy::HighlightLines;
use syntect::highlighting::{Theme, ThemeSet};
use syntect::html::{IncludeBackground, styled_line_to_highlighted_html};
use syntect::parsing::{SyntaxReference, SyntaxSet};

use super::render::{LINE_BREAK, escape_html};

/// Theme used when none is configured or the configured one is unknown.
pub const DEFAULT_THEME: &str = "InspiredGitHub";

/// Stands in for `\n` while code is inside the highlighter. Grammars treat
/// it as an ordinary character, so no newline handling of their own can
/// split or duplicate line breaks.
const LINE_BREAK_PLACEHOLDER: char = '\u{E000}';

const CODE_LINE_OPEN: &str = r#"<span style="white-space:pre;">"#;
const CODE_LINE_CLOSE: &str = "</span>";

static SYNTAX_SET: OnceLock<SyntaxSet> = OnceLock::new();
static THEME_SET: OnceLock<ThemeSet> = OnceLock::new();

fn syntax_set() -> &'static SyntaxSet {
    SYNTAX_SET.get_or_init(SyntaxSet::load_defaults_nonewlines)
}

fn theme_set() -> &'static ThemeSet {
    THEME_SET.get_or_init(ThemeSet::load_defaults)
}

/// Renders code text as HTML for a named language.
///
/// Implementations must not fail or panic for any input: unknown languages
/// fall back to a default style and internal errors fall back to escaped
/// plain text.
pub trait Highlighter: Send + Sync {
    fn highlight(&self, code: &str, language: &str) -> String;
}

/// Escape-only highlighter.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlainHighlighter;

impl Highlighter for PlainHighlighter {
    fn highlight(&self, code: &str, _language: &str) -> String {
        format!("{CODE_LINE_OPEN}{}{CODE_LINE_CLOSE}", escape_html(code))
    }
}

/// syntect-backed highlighter with inline styles.
#[derive(Debug, Clone)]
pub struct SyntectHighlighter {
    theme: Theme,
}

impl Default for SyntectHighlighter {
    fn default() -> Self {
        Self::new(None)
    }
}

impl SyntectHighlighter {
    /// Creates a highlighter for a bundled theme name, falling back to
    /// [`DEFAULT_THEME`] when the name is unknown.
    pub fn new(theme_name: Option<&str>) -> Self {
        let themes = &theme_set().themes;
        let requested = theme_name.map(str::trim).filter(|name| !name.is_empty());
        let theme = match requested {
            Some(name) => themes.get(name).cloned().or_else(|| {
                tracing::warn!("unknown syntax theme \"{name}\", falling back to {DEFAULT_THEME}");
                None
            }),
            None => None,
        };
        let theme = theme
            .or_else(|| themes.get(DEFAULT_THEME).cloned())
            .unwrap_or_default();
        Self { theme }
    }

    /// Names of the bundled themes, sorted.
    pub fn available_themes() -> Vec<&'static str> {
        let mut names: Vec<&'static str> =
            theme_set().themes.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    fn try_highlight(&self, code: &str, language: &str) -> Result<String, syntect::Error> {
        let ss = syntax_set();
        let syntax = find_syntax(language).unwrap_or_else(|| ss.find_syntax_plain_text());
        let mut lines = HighlightLines::new(syntax, &self.theme);
        let regions = lines.highlight_line(code, ss)?;
        let body = styled_line_to_highlighted_html(&regions, IncludeBackground::No)?;
        Ok(format!("{CODE_LINE_OPEN}{body}{CODE_LINE_CLOSE}"))
    }
}

impl Highlighter for SyntectHighlighter {
    fn highlight(&self, code: &str, language: &str) -> String {
        match self.try_highlight(code, language) {
            Ok(html) => html,
            Err(err) => {
                tracing::warn!("highlighting failed for language \"{language}\": {err}");
                PlainHighlighter.highlight(code, language)
            }
        }
    }
}

/// Looks up a grammar by token (extension-like name) or display name.
fn find_syntax(language: &str) -> Option<&'static SyntaxReference> {
    let ss = syntax_set();
    let lang = language.trim().to_ascii_lowercase();
    let patched = match lang.as_str() {
        "python3" | "py3" => "python",
        "shell" | "sh" | "zsh" => "bash",
        "golang" => "go",
        other => other,
    };
    ss.find_syntax_by_token(patched)
        .or_else(|| ss.find_syntax_by_name(language.trim()))
}

/// Highlights one completed code chunk and turns its newlines into
/// `<br>` tags.
///
/// Tabs are expanded to four spaces. Newlines are swapped for a placeholder
/// before the highlighter runs and the placeholder is swapped for
/// [`LINE_BREAK`] afterwards, so each source newline yields exactly one
/// line break.
pub fn highlight_code(highlighter: &dyn Highlighter, code: &str, language: &str) -> String {
    let mut prepared = String::with_capacity(code.len());
    for c in code.chars() {
        match c {
            '\n' => prepared.push(LINE_BREAK_PLACEHOLDER),
            '\t' => prepared.push_str("    "),
            LINE_BREAK_PLACEHOLDER => prepared.push(char::REPLACEMENT_CHARACTER),
            _ => prepared.push(c),
        }
    }
    let html = highlighter.highlight(&prepared, language);
    html.replace(LINE_BREAK_PLACEHOLDER, LINE_BREAK)
}

//! Stateless HTML formatting helpers.

pub const LINE_BREAK: &str = "<br>";
pub const CODE_BLOCK_OPEN: &str = r#"<div class="code-block">"#;
pub const CODE_BLOCK_CLOSE: &str = "</div>";

const NBSP: &str = "&nbsp;";
const TAB_NBSP: &str = "&nbsp;&nbsp;&nbsp;&nbsp;";

fn push_escaped_char(out: &mut String, c: char) {
    match c {
        '&' => out.push_str("&amp;"),
        '<' => out.push_str("&lt;"),
        '>' => out.push_str("&gt;"),
        '"' => out.push_str("&quot;"),
        '\'' => out.push_str("&#x27;"),
        _ => out.push(c),
    }
}

/// Escapes `&`, `<`, `>`, and both quote characters.
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        push_escaped_char(&mut out, c);
    }
    out
}

/// Renders plain-mode text: escaped, with spaces and tabs made
/// non-breaking so whitespace survives HTML layout.
pub fn render_plain(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            ' ' => out.push_str(NBSP),
            '\t' => out.push_str(TAB_NBSP),
            _ => push_escaped_char(&mut out, c),
        }
    }
    out
}

/// Renders free text that never goes through the marker matcher (user
/// input, labels): like [`render_plain`] with newlines as line breaks.
pub fn render_text(text: &str) -> String {
    text.split('\n')
        .map(render_plain)
        .collect::<Vec<_>>()
        .join(LINE_BREAK)
}

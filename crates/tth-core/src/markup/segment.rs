//! Lexical segmentation of raw fragments into atomic units.
//!
//! A unit is either a maximal run of identifier characters (`[A-Za-z0-9_]`)
//! or a single other character. A run that touches the end of the fragment
//! may still continue in the next fragment, so it is returned as the tail
//! instead of a unit.

/// Output of [`segment`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Segmented {
    /// Units that are complete and can be matched against markers.
    pub units: Vec<String>,
    /// Identifier run that reached the end of the fragment (may be empty).
    pub tail: String,
}

fn is_ident_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

/// Splits `fragment` into atomic units plus an unresolved identifier tail.
///
/// Callers carrying a tail from a previous call prepend it to the next
/// fragment as raw text, so a run can span any number of fragments.
pub fn segment(fragment: &str) -> Segmented {
    let mut units = Vec::new();
    let mut tail = String::new();
    let mut chars = fragment.char_indices().peekable();

    while let Some((start, c)) = chars.next() {
        let mut end = start + c.len_utf8();
        if !is_ident_char(c) {
            units.push(fragment[start..end].to_string());
            continue;
        }

        while let Some(&(idx, next)) = chars.peek() {
            if !is_ident_char(next) {
                break;
            }
            end = idx + next.len_utf8();
            chars.next();
        }

        if end == fragment.len() {
            tail = fragment[start..end].to_string();
        } else {
            units.push(fragment[start..end].to_string());
        }
    }

    Segmented { units, tail }
}

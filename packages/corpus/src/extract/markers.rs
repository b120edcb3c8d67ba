//! Lexer for parenthesised paragraph markers.
//!
//! Finds `(12)`, `(a)`, `(iv)` style markers in an article body. Only
//! positions are decided here; whether `(i)` is a letter or a roman item is
//! up to the paragraph parser, which knows the current letter.

/// Longest marker content considered, e.g. `viii` or `999`.
const MAX_MARKER_LEN: usize = 4;

/// Lowercase roman sub-item markers, `(i)` through `(x)`.
pub const ROMAN_MARKERS: [&str; 10] = ["i", "ii", "iii", "iv", "v", "vi", "vii", "viii", "ix", "x"];

/// Raw marker content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RawMarker {
    /// `(digits)`.
    Number(u32),
    /// `(letters)`, lowercase ASCII.
    Alpha(String),
}

/// A marker and its byte span in the body, parentheses included.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MarkerToken {
    pub marker: RawMarker,
    pub start: usize,
    pub end: usize,
}

pub fn is_roman_marker(content: &str) -> bool {
    ROMAN_MARKERS.contains(&content)
}

/// A marker may open the body or follow whitespace or list punctuation.
/// Anything else (`5(1)`, `word(a)`) is a citation inside running text.
fn opens_segment(previous: Option<char>) -> bool {
    match previous {
        None => true,
        Some(c) => c.is_whitespace() || matches!(c, '(' | '[' | ':' | ';' | '—' | '–'),
    }
}

fn classify(content: &str) -> Option<RawMarker> {
    if content.is_empty() || content.len() > MAX_MARKER_LEN {
        return None;
    }
    if content.bytes().all(|b| b.is_ascii_digit()) {
        return content.parse().ok().map(RawMarker::Number);
    }
    if content.bytes().all(|b| b.is_ascii_lowercase()) {
        return Some(RawMarker::Alpha(content.to_string()));
    }
    None
}

/// Markers found in a body.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MarkerScan {
    /// Markers in running text, in body order.
    pub tokens: Vec<MarkerToken>,
    /// Markers inside a quotation. They stay text.
    pub quoted: Vec<MarkerToken>,
    /// Offset of the opening quote of a quotation still open at the end.
    pub unclosed_quote: Option<usize>,
}

fn marker_at(body: &str, start: usize) -> Option<MarkerToken> {
    let rest = &body[start + 1..];
    let close = rest.find(')')?;
    classify(&rest[..close]).map(|marker| MarkerToken {
        marker,
        start,
        end: start + 1 + close + 1,
    })
}

/// Scan `body` for paragraph markers.
///
/// Markers inside curly double quotes (`“…”`) are quoted text, typically an
/// amendment being cited, and are returned separately. A quotation ends at
/// `”` or at a line break; a second `“` does not nest.
pub fn tokenize(body: &str) -> MarkerScan {
    let mut scan = MarkerScan::default();
    let mut open_quote: Option<usize> = None;
    let mut previous: Option<char> = None;

    for (start, c) in body.char_indices() {
        match c {
            '“' => {
                open_quote.get_or_insert(start);
            }
            '”' | '\n' => open_quote = None,
            '(' if opens_segment(previous) => {
                if let Some(token) = marker_at(body, start) {
                    if open_quote.is_some() {
                        scan.quoted.push(token);
                    } else {
                        scan.tokens.push(token);
                    }
                }
            }
            _ => {}
        }
        previous = Some(c);
    }

    scan.unclosed_quote = open_quote;
    scan
}

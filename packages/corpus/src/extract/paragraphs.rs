//! Paragraph parser: turns marker tokens into flattened content entries.
//!
//! ```text
//! body
//! ├── (1) numbered paragraph
//! │   ├── (a) lettered sub-paragraph
//! │   │   ├── (i) roman sub-item
//! │   │   └── (ii) roman sub-item
//! │   └── (b) lettered sub-paragraph
//! └── (2) numbered paragraph
//! ```
//!
//! Every node becomes one [`ContentParagraph`] carrying the number of its
//! numbered ancestor. A container's text runs to the next marker of the same
//! level, so it includes the text of its children.

use super::markers::{is_roman_marker, tokenize, MarkerToken, RawMarker};
use crate::types::ContentParagraph;

/// Parsed article body.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ParsedBody {
    pub paragraphs: Vec<ContentParagraph>,
    /// Text before the first numbered marker, if any.
    pub lead_in: Option<String>,
    /// Markers kept as text, in body order.
    pub skipped: Vec<SkippedMarker>,
    /// Offset of a quotation left open at the end of the body.
    pub unclosed_quote: Option<usize>,
}

/// A marker that did not open a paragraph.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedMarker {
    /// Byte offset in the body.
    pub offset: usize,
    /// The marker as written, e.g. `(3)`.
    pub marker: String,
    /// Inside a quotation, as opposed to a citation in running text.
    pub quoted: bool,
}

impl SkippedMarker {
    fn new(body: &str, token: &MarkerToken, quoted: bool) -> Self {
        Self {
            offset: token.start,
            marker: body[token.start..token.end].to_string(),
            quoted,
        }
    }
}

/// Quoted markers worth reporting: numbers, single letters and roman items.
fn looks_structural(marker: &RawMarker) -> bool {
    match marker {
        RawMarker::Number(_) => true,
        RawMarker::Alpha(content) => content.len() == 1 || is_roman_marker(content),
    }
}

/// Sub-paragraph marker inside a numbered paragraph.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SubMarker<'a> {
    Lettered(char),
    Roman(&'a str),
}

#[derive(Debug, Clone, Copy)]
struct Located<T> {
    item: T,
    start: usize,
    end: usize,
}

fn render(prefix: &str, text: &str) -> String {
    if text.is_empty() {
        prefix.to_string()
    } else {
        format!("{prefix} {text}")
    }
}

fn next_letter(letter: char) -> Option<char> {
    char::from_u32(letter as u32 + 1).filter(char::is_ascii_lowercase)
}

/// Parse an article body into flattened paragraphs.
///
/// A body without numbered markers becomes one paragraph numbered 1.
///
/// # Examples
/// ```
/// use constitution_corpus::extract::parse_paragraphs;
///
/// let parsed = parse_paragraphs("(1) First. (2) Second.");
/// let numbers: Vec<u32> = parsed.paragraphs.iter().map(|p| p.paragraph).collect();
/// assert_eq!(numbers, vec![1, 2]);
/// assert_eq!(parsed.paragraphs[1].text, "(2) Second.");
/// ```
pub fn parse_paragraphs(body: &str) -> ParsedBody {
    let scan = tokenize(body);
    let tokens = &scan.tokens;
    let (numbered, mut skipped) = accepted_numbered(body, tokens);

    skipped.extend(
        scan.quoted
            .iter()
            .filter(|token| looks_structural(&token.marker))
            .map(|token| SkippedMarker::new(body, token, true)),
    );
    skipped.sort_by_key(|marker| marker.offset);

    let Some(first) = numbered.first() else {
        return ParsedBody {
            paragraphs: vec![ContentParagraph::new(1, body.trim())],
            lead_in: None,
            skipped,
            unclosed_quote: scan.unclosed_quote,
        };
    };

    let lead_in = Some(body[..first.start].trim())
        .filter(|text| !text.is_empty())
        .map(String::from);

    let mut paragraphs = Vec::new();
    for (index, paragraph) in numbered.iter().enumerate() {
        let segment_end = numbered.get(index + 1).map_or(body.len(), |next| next.start);
        let number = paragraph.item;

        let text = body[paragraph.end..segment_end].trim();
        paragraphs.push(ContentParagraph::new(number, render(&format!("({number})"), text)));

        let subs = classify_sub_markers(tokens, paragraph.end, segment_end);
        emit_sub_paragraphs(body, number, &subs, segment_end, &mut paragraphs);
    }

    ParsedBody {
        paragraphs,
        lead_in,
        skipped,
        unclosed_quote: scan.unclosed_quote,
    }
}

/// Numbered markers that open a paragraph, and those kept as citations.
///
/// The next expected number (current + 1) always opens a paragraph. A lower
/// or equal number is a citation ("subarticle (2) of this article"). A
/// higher one is a citation when the expected number still follows later
/// ("subject to subarticle (3)" inside paragraph 1); otherwise it is a gap
/// in the numbering and opens a paragraph.
fn accepted_numbered(
    body: &str,
    tokens: &[MarkerToken],
) -> (Vec<Located<u32>>, Vec<SkippedMarker>) {
    let numbered: Vec<(u32, &MarkerToken)> = tokens
        .iter()
        .filter_map(|token| match token.marker {
            RawMarker::Number(number) => Some((number, token)),
            RawMarker::Alpha(_) => None,
        })
        .collect();

    let mut accepted = Vec::new();
    let mut skipped = Vec::new();
    let mut current = 0u32;

    for (index, &(number, token)) in numbered.iter().enumerate() {
        let expected = current.saturating_add(1);
        let opens = number == expected
            || (number > expected
                && !numbered[index + 1..].iter().any(|&(later, _)| later == expected));

        if opens {
            current = number;
            accepted.push(Located {
                item: number,
                start: token.start,
                end: token.end,
            });
        } else {
            skipped.push(SkippedMarker::new(body, token, false));
        }
    }

    (accepted, skipped)
}

/// Classify the alphabetic markers in `start..end`.
///
/// `(i)`, `(v)` and `(x)` are letters only when they follow the letter
/// before them alphabetically, e.g. `(h)` then `(i)`.
fn classify_sub_markers(
    tokens: &[MarkerToken],
    start: usize,
    end: usize,
) -> Vec<Located<SubMarker<'_>>> {
    let mut current_letter: Option<char> = None;
    let mut subs = Vec::new();

    for token in tokens.iter().filter(|t| t.start >= start && t.start < end) {
        let RawMarker::Alpha(content) = &token.marker else {
            continue;
        };

        let single = {
            let mut chars = content.chars();
            match (chars.next(), chars.next()) {
                (Some(c), None) => Some(c),
                _ => None,
            }
        };

        let sub = match single {
            Some(letter)
                if !is_roman_marker(content)
                    || current_letter.and_then(next_letter) == Some(letter) =>
            {
                current_letter = Some(letter);
                SubMarker::Lettered(letter)
            }
            _ if is_roman_marker(content) => SubMarker::Roman(content.as_str()),
            _ => continue,
        };

        subs.push(Located {
            item: sub,
            start: token.start,
            end: token.end,
        });
    }

    subs
}

fn emit_sub_paragraphs(
    body: &str,
    number: u32,
    subs: &[Located<SubMarker<'_>>],
    segment_end: usize,
    out: &mut Vec<ContentParagraph>,
) {
    let next_start = |index: usize| subs.get(index + 1).map_or(segment_end, |s| s.start);

    let mut index = 0;
    while index < subs.len() {
        let sub = subs[index];
        match sub.item {
            // Roman item with no lettered parent.
            SubMarker::Roman(roman) => {
                let text = body[sub.end..next_start(index)].trim();
                out.push(ContentParagraph::new(number, render(&format!("({roman})"), text)));
                index += 1;
            }
            SubMarker::Lettered(letter) => {
                let children_end = subs[index + 1..]
                    .iter()
                    .position(|s| matches!(s.item, SubMarker::Lettered(_)))
                    .map_or(subs.len(), |offset| index + 1 + offset);
                let letter_end = subs.get(children_end).map_or(segment_end, |s| s.start);
                let prefix = format!("({letter})");

                let own_text = body[sub.end..next_start(index)].trim();
                let has_children = children_end > index + 1;
                if !has_children || !own_text.is_empty() {
                    let text = body[sub.end..letter_end].trim();
                    out.push(ContentParagraph::new(number, render(&prefix, text)));
                }

                for child_index in index + 1..children_end {
                    let child = subs[child_index];
                    if let SubMarker::Roman(roman) = child.item {
                        let text = body[child.end..next_start(child_index)].trim();
                        out.push(ContentParagraph::new(
                            number,
                            render(&format!("{prefix} ({roman})"), text),
                        ));
                    }
                }

                index = children_end;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn numbers(parsed: &ParsedBody) -> Vec<u32> {
        parsed.paragraphs.iter().map(|p| p.paragraph).collect()
    }

    fn texts(parsed: &ParsedBody) -> Vec<&str> {
        parsed.paragraphs.iter().map(|p| p.text.as_str()).collect()
    }

    #[test]
    fn test_flattening_shares_parent_numbers() {
        let parsed = parse_paragraphs("(1) Intro (a) first (i) sub-i (ii) sub-ii (2) Second.");

        assert_eq!(numbers(&parsed), vec![1, 1, 1, 1, 2]);
        assert_eq!(
            texts(&parsed),
            vec![
                "(1) Intro (a) first (i) sub-i (ii) sub-ii",
                "(a) first (i) sub-i (ii) sub-ii",
                "(a) (i) sub-i",
                "(a) (ii) sub-ii",
                "(2) Second.",
            ]
        );
        assert!(parsed.lead_in.is_none());
    }

    #[test]
    fn test_no_numbered_markers_yields_single_paragraph() {
        let parsed = parse_paragraphs("  Malta is a democratic republic.\n");
        assert_eq!(
            parsed.paragraphs,
            vec![ContentParagraph::new(1, "Malta is a democratic republic.")]
        );
    }

    #[test]
    fn test_lettered_without_numbered_stays_in_single_paragraph() {
        let parsed = parse_paragraphs("The State shall (a) promote; (b) protect.");
        assert_eq!(parsed.paragraphs.len(), 1);
        assert_eq!(parsed.paragraphs[0].text, "The State shall (a) promote; (b) protect.");
    }

    #[test]
    fn test_lettered_with_only_roman_items_is_replaced() {
        let parsed = parse_paragraphs("(1) Where - (a) (i) one; (ii) two; (b) three.");
        assert_eq!(
            texts(&parsed),
            vec![
                "(1) Where - (a) (i) one; (ii) two; (b) three.",
                "(a) (i) one;",
                "(a) (ii) two;",
                "(b) three.",
            ]
        );
        assert_eq!(numbers(&parsed), vec![1, 1, 1, 1]);
    }

    #[test]
    fn test_letter_i_after_h_is_lettered() {
        let parsed = parse_paragraphs("(1) List (h) eighth; (i) ninth; (j) tenth.");
        assert_eq!(
            texts(&parsed)[1..].to_vec(),
            vec!["(h) eighth;", "(i) ninth;", "(j) tenth."]
        );
    }

    #[test]
    fn test_roman_without_letter_parent() {
        let parsed = parse_paragraphs("(3) Either (i) this; or (ii) that.");
        assert_eq!(
            texts(&parsed),
            vec!["(3) Either (i) this; or (ii) that.", "(i) this; or", "(ii) that."]
        );
        assert_eq!(numbers(&parsed), vec![3, 3, 3]);
    }

    #[test]
    fn test_backwards_number_is_citation() {
        let parsed = parse_paragraphs("(1) First. (2) As in subarticle (1) above. (3) Third.");
        assert_eq!(numbers(&parsed), vec![1, 2, 3]);
        assert_eq!(parsed.paragraphs[1].text, "(2) As in subarticle (1) above.");
    }

    #[test]
    fn test_forward_citation_does_not_swallow_paragraphs() {
        let body = "(1) Subject to subarticle (3), a person may vote. (2) Second. (3) Third.";
        let parsed = parse_paragraphs(body);

        assert_eq!(numbers(&parsed), vec![1, 2, 3]);
        assert_eq!(
            texts(&parsed),
            vec![
                "(1) Subject to subarticle (3), a person may vote.",
                "(2) Second.",
                "(3) Third.",
            ]
        );
        assert_eq!(
            parsed.skipped,
            vec![SkippedMarker {
                offset: body.find("(3)").unwrap(),
                marker: "(3)".to_string(),
                quoted: false,
            }]
        );
    }

    #[test]
    fn test_gap_in_numbering_still_opens_paragraph() {
        let parsed = parse_paragraphs("(1) First. (3) Third, the second was repealed.");
        assert_eq!(numbers(&parsed), vec![1, 3]);
        assert!(parsed.skipped.is_empty());
    }

    #[test]
    fn test_backwards_citation_is_reported() {
        let parsed = parse_paragraphs("(1) First. (2) As in subarticle (1) above.");
        assert_eq!(parsed.skipped.len(), 1);
        assert_eq!(parsed.skipped[0].marker, "(1)");
        assert!(!parsed.skipped[0].quoted);
    }

    #[test]
    fn test_unclosed_quotes_do_not_hide_later_paragraphs() {
        let body = "(1) Insert - “(a) first; “(b) second.” (2) Next paragraph. (3) Third.";
        let parsed = parse_paragraphs(body);

        assert_eq!(numbers(&parsed), vec![1, 2, 3]);
        assert_eq!(parsed.paragraphs[0].text, "(1) Insert - “(a) first; “(b) second.”");
        let quoted: Vec<&str> = parsed.skipped.iter().map(|m| m.marker.as_str()).collect();
        assert_eq!(quoted, vec!["(a)", "(b)"]);
        assert!(parsed.skipped.iter().all(|m| m.quoted));
        assert!(parsed.unclosed_quote.is_none());
    }

    #[test]
    fn test_quote_open_at_end_is_reported() {
        let body = "(1) For the words “(a) shall";
        let parsed = parse_paragraphs(body);
        assert_eq!(parsed.unclosed_quote, body.find('“'));
    }

    #[test]
    fn test_lead_in_is_reported() {
        let parsed = parse_paragraphs("Preamble words. (1) First.");
        assert_eq!(parsed.lead_in.as_deref(), Some("Preamble words."));
        assert_eq!(texts(&parsed), vec!["(1) First."]);
    }

    #[test]
    fn test_numbers_are_non_decreasing() {
        let parsed = parse_paragraphs("(1) a (a) x (b) y (2) b (a) z (i) q (3) c");
        let numbers = numbers(&parsed);
        assert!(numbers.windows(2).all(|w| w[0] <= w[1]));
        assert_eq!(numbers, vec![1, 1, 1, 2, 2, 2, 3]);
    }

    #[test]
    fn test_empty_numbered_paragraph_renders_marker_only() {
        let parsed = parse_paragraphs("(1) (a) only letters");
        assert_eq!(texts(&parsed), vec!["(1) (a) only letters", "(a) only letters"]);
    }
}

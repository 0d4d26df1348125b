//! Structural parsing of assistant message content.
//!
//! Raw assistant text is transformed into an ordered sequence of typed
//! segments: formatted text, or fenced code blocks. The parser is a single
//! left-to-right cursor scan; it recognizes exactly two inline constructs in
//! text (line breaks and `**strong**` emphasis) and emits structured spans
//! rather than passing any markup through.

use crate::observability;

/// Marker delimiting a fenced code block.
const FENCE: &str = "```";

/// Language tag used when a fence opener carries none.
const DEFAULT_LANGUAGE: &str = "text";

/// Code blocks longer than this many lines start collapsed.
pub const COLLAPSE_THRESHOLD: usize = 10;

/// One inline unit of formatted text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InlineSpan {
    /// Literal text with no formatting.
    Plain(String),

    /// Strong-emphasis text (`**...**` in the source).
    Strong(String),

    /// A line break.
    LineBreak,
}

/// A run of formatted text between (or outside) code blocks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextSegment {
    /// The source text before inline substitution, fences excluded.
    pub raw: String,

    /// The text resolved into structured inline spans.
    pub spans: Vec<InlineSpan>,
}

/// A fenced code block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodeBlock {
    /// Language tag from the fence opener, or `"text"`.
    pub language: String,

    /// The block's lines, verbatim.
    pub lines: Vec<String>,

    /// Identity for expand/collapse state. Derived from the message index
    /// and the block's occurrence index within the message, so it is stable
    /// across re-renders of the same message.
    pub block_id: String,

    /// True for blocks long enough to start collapsed.
    pub collapsed_by_default: bool,
}

/// One unit of parsed message content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContentSegment {
    /// Formatted text.
    Text(TextSegment),

    /// A fenced code block.
    Code(CodeBlock),
}

/// Parses one message's raw text into an ordered segment sequence.
///
/// Fenced regions become [`CodeBlock`]s in source order; the gaps between
/// them become [`TextSegment`]s with the two inline substitutions applied.
/// An unterminated fence is not an error: the opening marker and everything
/// after it are emitted as plain text.
pub fn parse_message(content: &str, message_index: usize) -> Vec<ContentSegment> {
    let mut segments = Vec::new();
    let mut cursor = 0usize;
    let mut occurrence = 0usize;

    while let Some(rel_open) = content[cursor..].find(FENCE) {
        let open = cursor + rel_open;
        let after_marker = open + FENCE.len();

        // The opener's language tag runs to the end of its line. A fence
        // with no newline after the opener cannot hold a body; fall back to
        // plain text for the remainder.
        let Some(rel_newline) = content[after_marker..].find('\n') else {
            break;
        };
        let body_start = after_marker + rel_newline + 1;
        let Some(rel_close) = content[body_start..].find(FENCE) else {
            break;
        };
        let close = body_start + rel_close;

        push_text(&mut segments, &content[cursor..open]);

        let tag = content[after_marker..after_marker + rel_newline].trim();
        let language = if tag.is_empty() { DEFAULT_LANGUAGE } else { tag };
        let body = &content[body_start..close];
        let body = body.strip_suffix('\n').unwrap_or(body);
        let lines: Vec<String> = if body.is_empty() {
            Vec::new()
        } else {
            body.split('\n').map(String::from).collect()
        };

        observability::PARSE_CODE_BLOCKS.click();
        segments.push(ContentSegment::Code(CodeBlock {
            language: language.to_string(),
            collapsed_by_default: lines.len() > COLLAPSE_THRESHOLD,
            lines,
            block_id: format!("{message_index}-{occurrence}"),
        }));

        occurrence += 1;
        cursor = close + FENCE.len();
    }

    push_text(&mut segments, &content[cursor..]);
    segments
}

fn push_text(segments: &mut Vec<ContentSegment>, text: &str) {
    if text.is_empty() {
        return;
    }
    segments.push(ContentSegment::Text(TextSegment {
        raw: text.to_string(),
        spans: parse_inline(text),
    }));
}

/// Resolves the two inline constructs, in order: line breaks, then
/// strong emphasis. An unmatched `**` stays literal.
fn parse_inline(raw: &str) -> Vec<InlineSpan> {
    let mut spans = Vec::new();
    let mut rest = raw;

    while let Some(open) = rest.find("**") {
        let after = &rest[open + 2..];
        let Some(close) = after.find("**") else {
            break;
        };
        push_plain(&mut spans, &rest[..open]);
        push_strong(&mut spans, &after[..close]);
        rest = &after[close + 2..];
    }

    push_plain(&mut spans, rest);
    spans
}

fn push_plain(spans: &mut Vec<InlineSpan>, text: &str) {
    for (i, part) in text.split('\n').enumerate() {
        if i > 0 {
            spans.push(InlineSpan::LineBreak);
        }
        if !part.is_empty() {
            spans.push(InlineSpan::Plain(part.to_string()));
        }
    }
}

// Strong emphasis can span what was a line break in the source; the break
// wins and the emphasis resumes on the next line.
fn push_strong(spans: &mut Vec<InlineSpan>, text: &str) {
    for (i, part) in text.split('\n').enumerate() {
        if i > 0 {
            spans.push(InlineSpan::LineBreak);
        }
        if !part.is_empty() {
            spans.push(InlineSpan::Strong(part.to_string()));
        }
    }
}

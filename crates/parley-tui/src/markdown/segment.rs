//! Splits a message into prose and fenced code segments.
//!
//! The scan is linear: find the next fence, find its partner, emit the prose
//! before it and the code between them, repeat. An opening fence without a
//! partner does not start a block; everything from the cursor on stays prose
//! until a later pass sees the closing fence.
//!
//! Every segment records the byte range it covers. Ranges tile the input in
//! order: prose lines own their `\n`, and a code block owns the `\n` right
//! after its closing fence.

use std::ops::Range;

use super::format::{FormattedLine, InlineSpan, ProseKind, format_line, strip_terminator};

/// Code fence delimiter.
pub const FENCE: &str = "```";

/// Language used when a block has no usable tag.
pub const DEFAULT_LANGUAGE: &str = "javascript";

/// One formatted prose line and the source range it came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProseNode {
    pub kind: ProseKind,
    pub spans: Vec<InlineSpan>,
    pub span: Range<usize>,
}

impl ProseNode {
    /// Concatenated text of the inline spans.
    pub fn text(&self) -> String {
        self.spans.iter().map(|s| s.text.as_str()).collect()
    }
}

/// A closed fenced code block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodeBlock {
    pub language: String,
    pub code: String,
    /// Zero-based position among the code blocks of the message.
    pub block_index: usize,
    pub span: Range<usize>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    Prose(ProseNode),
    Code(CodeBlock),
}

impl Segment {
    /// Source byte range covered by this segment.
    pub fn span(&self) -> Range<usize> {
        match self {
            Segment::Prose(node) => node.span.clone(),
            Segment::Code(block) => block.span.clone(),
        }
    }
}

/// Returns true if the text contains a fence delimiter.
pub fn has_fence(text: &str) -> bool {
    text.contains(FENCE)
}

/// Segments a full message.
pub fn segment(text: &str) -> Vec<Segment> {
    let mut out = Vec::new();
    segment_from(text, 0, 0, &mut out);
    out
}

/// Segments `text[cursor..]`, numbering blocks from `next_index`.
fn segment_from(text: &str, mut cursor: usize, mut next_index: usize, out: &mut Vec<Segment>) {
    loop {
        let Some(open) = text[cursor..].find(FENCE).map(|i| cursor + i) else {
            push_prose(text, cursor..text.len(), out);
            return;
        };
        let body_start = open + FENCE.len();
        let Some(close) = text[body_start..].find(FENCE).map(|i| body_start + i) else {
            push_prose(text, cursor..text.len(), out);
            return;
        };

        push_prose(text, cursor..open, out);

        let mut end = close + FENCE.len();
        if text[end..].starts_with('\n') {
            end += 1;
        }
        out.push(Segment::Code(code_block(
            &text[body_start..close],
            next_index,
            open..end,
        )));
        next_index += 1;
        cursor = end;
    }
}

/// Emits one prose node per line of `text[range]`.
fn push_prose(text: &str, range: Range<usize>, out: &mut Vec<Segment>) {
    let mut start = range.start;
    for line in text[range].split_inclusive('\n') {
        let end = start + line.len();
        let FormattedLine { kind, spans } = format_line(strip_terminator(line));
        out.push(Segment::Prose(ProseNode {
            kind,
            spans,
            span: start..end,
        }));
        start = end;
    }
}

fn code_block(content: &str, block_index: usize, span: Range<usize>) -> CodeBlock {
    let (language, code) = match content.find('\n') {
        Some(nl) if nl > 0 && is_language_tag(content[..nl].trim()) => {
            (content[..nl].trim().to_string(), &content[nl + 1..])
        }
        _ => (DEFAULT_LANGUAGE.to_string(), content),
    };
    CodeBlock {
        language,
        code: code.trim().to_string(),
        block_index,
        span,
    }
}

fn is_language_tag(tag: &str) -> bool {
    !tag.is_empty() && !tag.chars().any(char::is_whitespace)
}

/// Memoizing segmenter for a text that grows by appending.
///
/// Segments up to the end of the last code block whose extent can no longer
/// change are kept, and only the remainder is rescanned. The result always
/// equals [`segment`] on the same text.
#[derive(Debug, Default)]
pub struct IncrementalSegmenter {
    /// Text covered by `finalized`.
    source: String,
    finalized: Vec<Segment>,
    blocks: usize,
}

impl IncrementalSegmenter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Segments `text`, reusing finalized work when `text` extends the
    /// previously seen text.
    pub fn update(&mut self, text: &str) -> Vec<Segment> {
        if !text.starts_with(self.source.as_str()) {
            self.reset();
        }

        let mut tail = Vec::new();
        segment_from(text, self.source.len(), self.blocks, &mut tail);

        let settled = tail
            .iter()
            .rposition(|seg| match seg {
                Segment::Code(block) => {
                    block.span.end < text.len() || text[..block.span.end].ends_with('\n')
                }
                Segment::Prose(_) => false,
            })
            .map_or(0, |i| i + 1);

        let mut out = Vec::with_capacity(self.finalized.len() + tail.len());
        out.extend(self.finalized.iter().cloned());
        out.extend(tail.iter().cloned());

        if settled > 0 {
            let checkpoint = tail[settled - 1].span().end;
            self.blocks += tail[..settled]
                .iter()
                .filter(|seg| matches!(seg, Segment::Code(_)))
                .count();
            self.finalized.extend(tail.drain(..settled));
            self.source.push_str(&text[self.source.len()..checkpoint]);
        }

        out
    }

    /// Forgets all cached work.
    pub fn reset(&mut self) {
        self.source.clear();
        self.finalized.clear();
        self.blocks = 0;
    }
}

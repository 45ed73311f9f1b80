//! Message rendering.
//!
//! A message is turned into a render tree (`RenderNode`s) and the tree into
//! width-wrapped `StyledLine`s. Text only ever becomes span content, never
//! markup, so reply text cannot inject structure or terminal escapes.

use parley_core::message::Message;

use super::style::{Style, StyledLine, StyledSpan};
use super::wrap::{prefix_lines, prefix_width, wrap_chars, wrap_spans};
use crate::common::sanitize_for_display;
use crate::markdown::format::format_prose;
use crate::markdown::{
    Block, CodeBlock, IncrementalSegmenter, InlineSpan, ProseKind, Segment, group_lists, has_fence,
    segment,
};

const USER_PREFIX: &str = "│ ";
const LIST_BULLET: &str = "• ";
const LIST_INDENT: &str = "  ";
const CODE_INDENT: &str = "  ";
const CODE_RULE: &str = "───";
const COPIED_LABEL: &str = "Copied!";
const TYPING_CURSOR: &str = "▌";
const MIN_CONTENT_WIDTH: usize = 10;

/// Structured rendering of a message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RenderNode {
    Heading { level: u8, spans: Vec<InlineSpan> },
    Paragraph(Vec<InlineSpan>),
    /// Contiguous list items.
    List(Vec<Vec<InlineSpan>>),
    LineBreak,
    Code {
        language: String,
        code: String,
        block_index: usize,
        /// Header shows "Copied!".
        copied: bool,
    },
}

/// Copy-control state for one message's code headers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct CopyView {
    /// Block whose header shows "Copied!".
    pub copied: Option<usize>,
    /// Headers show the `/copy n` hint.
    pub hint: bool,
}

/// Builds the render tree for `text`. `copied` marks the block whose
/// header shows the copy confirmation.
pub fn render_message(text: &str, copied: Option<usize>) -> Vec<RenderNode> {
    if !has_fence(text) {
        return group_lists(format_prose(text), |line| line.kind == ProseKind::ListItem)
            .into_iter()
            .map(|block| match block {
                Block::Line(line) => line_node(line.kind, line.spans),
                Block::List(items) => {
                    RenderNode::List(items.into_iter().map(|line| line.spans).collect())
                }
            })
            .collect();
    }
    render_segments(&segment(text), copied)
}

/// Builds the render tree from already segmented text.
pub fn render_segments(segments: &[Segment], copied: Option<usize>) -> Vec<RenderNode> {
    group_lists(segments, |seg| {
        matches!(seg, Segment::Prose(node) if node.kind == ProseKind::ListItem)
    })
    .into_iter()
    .map(|block| match block {
        Block::List(items) => RenderNode::List(
            items
                .into_iter()
                .filter_map(|seg| match seg {
                    Segment::Prose(node) => Some(node.spans.clone()),
                    Segment::Code(_) => None,
                })
                .collect(),
        ),
        Block::Line(Segment::Prose(node)) => line_node(node.kind, node.spans.clone()),
        Block::Line(Segment::Code(block)) => RenderNode::Code {
            language: block.language.clone(),
            code: block.code.clone(),
            block_index: block.block_index,
            copied: copied == Some(block.block_index),
        },
    })
    .collect()
}

fn line_node(kind: ProseKind, spans: Vec<InlineSpan>) -> RenderNode {
    match kind {
        ProseKind::Heading(level) => RenderNode::Heading { level, spans },
        ProseKind::Paragraph => RenderNode::Paragraph(spans),
        ProseKind::ListItem => RenderNode::List(vec![spans]),
        ProseKind::LineBreak => RenderNode::LineBreak,
    }
}

/// Closed code blocks of a message, in order.
pub fn code_blocks(text: &str) -> Vec<CodeBlock> {
    segment(text)
        .into_iter()
        .filter_map(|seg| match seg {
            Segment::Code(block) => Some(block),
            Segment::Prose(_) => None,
        })
        .collect()
}

/// Wrapped display lines for a message.
pub fn display_lines(message: &Message, width: usize, copy: CopyView) -> Vec<StyledLine> {
    let text = sanitize_for_display(&message.text);
    let nodes = render_message(&text, copy.copied);
    message_lines(message, &nodes, width, copy.hint)
}

/// Display lines for the message being revealed, rescanning only the part
/// of the text after its last settled code block.
pub fn typing_display_lines(
    message: &Message,
    width: usize,
    segmenter: &mut IncrementalSegmenter,
) -> Vec<StyledLine> {
    let text = sanitize_for_display(&message.text);
    let nodes = if has_fence(&text) {
        render_segments(&segmenter.update(&text), None)
    } else {
        render_message(&text, None)
    };
    message_lines(message, &nodes, width, false)
}

fn message_lines(
    message: &Message,
    nodes: &[RenderNode],
    width: usize,
    hint: bool,
) -> Vec<StyledLine> {
    let (prefix, base) = if message.is_user {
        (USER_PREFIX, Style::User)
    } else {
        ("", Style::Assistant)
    };
    let content_width = width
        .saturating_sub(prefix_width(prefix))
        .max(MIN_CONTENT_WIDTH);

    let mut lines: Vec<StyledLine> = nodes
        .iter()
        .flat_map(|node| node_lines(node, content_width, base, hint))
        .collect();
    if lines.is_empty() {
        lines.push(StyledLine::empty());
    }

    if message.is_typing
        && let Some(last) = lines.last_mut()
    {
        last.spans
            .push(StyledSpan::new(TYPING_CURSOR, Style::StreamingCursor));
    }

    if prefix.is_empty() {
        return lines;
    }
    let prefix = StyledSpan::new(prefix, Style::UserPrefix);
    prefix_lines(lines, &prefix, &prefix)
}

fn node_lines(node: &RenderNode, width: usize, base: Style, hint: bool) -> Vec<StyledLine> {
    match node {
        RenderNode::Paragraph(spans) => wrap_spans(&styled(spans, base), width),
        RenderNode::Heading { level, spans } => {
            let style = match level {
                1 => Style::H1,
                2 => Style::H2,
                _ => Style::H3,
            };
            let spans: Vec<_> = spans
                .iter()
                .map(|s| StyledSpan::new(s.text.as_str(), style))
                .collect();
            wrap_spans(&spans, width)
        }
        RenderNode::List(items) => {
            let bullet = StyledSpan::new(LIST_BULLET, Style::ListBullet);
            let indent = StyledSpan::new(LIST_INDENT, Style::Plain);
            let item_width = width.saturating_sub(prefix_width(LIST_BULLET)).max(1);
            items
                .iter()
                .flat_map(|item| {
                    prefix_lines(wrap_spans(&styled(item, base), item_width), &bullet, &indent)
                })
                .collect()
        }
        RenderNode::LineBreak => vec![StyledLine::empty()],
        RenderNode::Code {
            language,
            code,
            block_index,
            copied,
        } => code_lines(language, code, *block_index, *copied, hint, width),
    }
}

fn styled(spans: &[InlineSpan], base: Style) -> Vec<StyledSpan> {
    spans
        .iter()
        .map(|span| {
            let style = match (span.strong, span.emphasis) {
                (true, true) => Style::StrongEmphasis,
                (true, false) => Style::Strong,
                (false, true) => Style::Emphasis,
                (false, false) => base,
            };
            StyledSpan::new(span.text.as_str(), style)
        })
        .collect()
}

fn code_lines(
    language: &str,
    code: &str,
    block_index: usize,
    copied: bool,
    hint: bool,
    width: usize,
) -> Vec<StyledLine> {
    let mut header = vec![StyledSpan::new(
        format!("{CODE_RULE} {language} "),
        Style::CodeHeader,
    )];
    if copied {
        header.push(StyledSpan::new(COPIED_LABEL, Style::Copied));
    } else if hint {
        header.push(StyledSpan::new(
            format!("/copy {}", block_index + 1),
            Style::CopyHint,
        ));
    }

    let mut lines = vec![StyledLine { spans: header }];
    let code_width = width.saturating_sub(prefix_width(CODE_INDENT)).max(1);
    for line in code.split('\n') {
        for part in wrap_chars(line, code_width) {
            lines.push(StyledLine {
                spans: vec![
                    StyledSpan::new(CODE_INDENT, Style::Plain),
                    StyledSpan::new(part, Style::CodeBlock),
                ],
            });
        }
    }
    lines.push(StyledLine {
        spans: vec![StyledSpan::new(CODE_RULE, Style::CodeFence)],
    });
    lines
}

/// Plain-text rendering for non-interactive output: markup removed, code
/// blocks kept fenced.
pub fn render_plain(text: &str) -> String {
    fn plain(spans: &[InlineSpan]) -> String {
        spans.iter().map(|s| s.text.as_str()).collect()
    }

    let text = sanitize_for_display(text);
    let mut lines = Vec::new();
    for node in render_message(&text, None) {
        match node {
            RenderNode::Heading { spans, .. } | RenderNode::Paragraph(spans) => {
                lines.push(plain(&spans));
            }
            RenderNode::List(items) => {
                lines.extend(items.iter().map(|item| format!("{LIST_BULLET}{}", plain(item))));
            }
            RenderNode::LineBreak => lines.push(String::new()),
            RenderNode::Code { language, code, .. } => {
                lines.push(format!("```{language}"));
                lines.push(code);
                lines.push("```".to_string());
            }
        }
    }
    lines.join("\n")
}

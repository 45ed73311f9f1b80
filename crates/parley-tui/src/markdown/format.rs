//! Line-oriented formatting for prose.
//!
//! Recognizes a small markdown subset per line: `**bold**` / `__bold__`,
//! `*italic*` / `_italic_`, `#`..`###` headings, `•` / `-` bullets and
//! `1.` numbered items. Output is structured spans, never markup strings.
//!
//! Inline rules are applied as left-to-right scans without backtracking:
//! bold first, then italic over the bold output, so emphasis can wrap strong
//! text. A delimiter with no partner on the same line is kept as literal text.

/// A run of text with uniform inline styling.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InlineSpan {
    pub text: String,
    pub strong: bool,
    pub emphasis: bool,
}

impl InlineSpan {
    pub fn plain(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            strong: false,
            emphasis: false,
        }
    }
}

/// Block-level classification of one prose line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProseKind {
    /// Heading level 1..=3.
    Heading(u8),
    Paragraph,
    /// Bullet or numbered item; numbering is not kept.
    ListItem,
    /// Blank line.
    LineBreak,
}

/// One formatted prose line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormattedLine {
    pub kind: ProseKind,
    pub spans: Vec<InlineSpan>,
}

/// Formats a single line (without its terminator).
pub fn format_line(line: &str) -> FormattedLine {
    if line.trim().is_empty() {
        return FormattedLine {
            kind: ProseKind::LineBreak,
            spans: Vec::new(),
        };
    }

    let (kind, body) = classify(line);
    FormattedLine {
        kind,
        spans: format_inline(body),
    }
}

/// Formats every line of a prose block.
pub fn format_prose(text: &str) -> Vec<FormattedLine> {
    text.split_inclusive('\n')
        .map(|line| format_line(strip_terminator(line)))
        .collect()
}

pub(crate) fn strip_terminator(line: &str) -> &str {
    let line = line.strip_suffix('\n').unwrap_or(line);
    line.strip_suffix('\r').unwrap_or(line)
}

/// Splits off a heading or list prefix. The prefix must be followed by
/// whitespace, which is consumed with it.
fn classify(line: &str) -> (ProseKind, &str) {
    for (marker, level) in [("###", 3), ("##", 2), ("#", 1)] {
        if let Some(body) = after_marker(line, marker) {
            return (ProseKind::Heading(level), body);
        }
    }

    for bullet in ["•", "-"] {
        if let Some(body) = after_marker(line, bullet) {
            return (ProseKind::ListItem, body);
        }
    }

    let digits = line.bytes().take_while(u8::is_ascii_digit).count();
    if digits > 0
        && let Some(body) = after_marker(&line[digits..], ".")
    {
        return (ProseKind::ListItem, body);
    }

    (ProseKind::Paragraph, line)
}

fn after_marker<'a>(line: &'a str, marker: &str) -> Option<&'a str> {
    let rest = line.strip_prefix(marker)?;
    let body = rest.trim_start();
    (body.len() < rest.len()).then_some(body)
}

/// Applies the bold and italic passes and merges the result into spans.
pub fn format_inline(text: &str) -> Vec<InlineSpan> {
    let strong = bold_pass(text);
    let styled = italic_pass(&strong);
    merge_spans(&styled)
}

#[derive(Clone, Copy)]
struct StyledChar {
    ch: char,
    strong: bool,
    emphasis: bool,
}

/// `(**|__)(.*?)\1` as a single forward scan.
fn bold_pass(text: &str) -> Vec<(char, bool)> {
    let mut out = Vec::with_capacity(text.len());
    let mut i = 0;
    while i < text.len() {
        let rest = &text[i..];
        let delimiter = ["**", "__"].into_iter().find(|d| rest.starts_with(d));
        if let Some(d) = delimiter
            && let Some(close) = rest[d.len()..].find(d)
        {
            let inner = &rest[d.len()..d.len() + close];
            out.extend(inner.chars().map(|ch| (ch, true)));
            i += d.len() * 2 + close;
            continue;
        }
        let Some(ch) = rest.chars().next() else {
            break;
        };
        out.push((ch, false));
        i += ch.len_utf8();
    }
    out
}

/// `(\*|_)(.*?)\1` over the output of [`bold_pass`].
fn italic_pass(chars: &[(char, bool)]) -> Vec<StyledChar> {
    let mut out = Vec::with_capacity(chars.len());
    let mut i = 0;
    while i < chars.len() {
        let (ch, strong) = chars[i];
        if matches!(ch, '*' | '_')
            && let Some(offset) = chars[i + 1..].iter().position(|(c, _)| *c == ch)
        {
            let close = i + 1 + offset;
            out.extend(chars[i + 1..close].iter().map(|&(ch, strong)| StyledChar {
                ch,
                strong,
                emphasis: true,
            }));
            i = close + 1;
            continue;
        }
        out.push(StyledChar {
            ch,
            strong,
            emphasis: false,
        });
        i += 1;
    }
    out
}

fn merge_spans(chars: &[StyledChar]) -> Vec<InlineSpan> {
    let mut spans: Vec<InlineSpan> = Vec::new();
    for c in chars {
        match spans.last_mut() {
            Some(last) if last.strong == c.strong && last.emphasis == c.emphasis => {
                last.text.push(c.ch);
            }
            _ => spans.push(InlineSpan {
                text: c.ch.to_string(),
                strong: c.strong,
                emphasis: c.emphasis,
            }),
        }
    }
    spans
}

/// A formatted line or a run of list items.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Block<T> {
    Line(T),
    List(Vec<T>),
}

/// Wraps contiguous list items into list blocks. A list closes at the
/// first line of any other kind.
pub fn group_lists<T>(items: impl IntoIterator<Item = T>, is_item: impl Fn(&T) -> bool) -> Vec<Block<T>> {
    let mut blocks = Vec::new();
    for item in items {
        if is_item(&item) {
            if let Some(Block::List(list)) = blocks.last_mut() {
                list.push(item);
            } else {
                blocks.push(Block::List(vec![item]));
            }
        } else {
            blocks.push(Block::Line(item));
        }
    }
    blocks
}

#[cfg(test)]
mod tests {
    use super::*;

    fn span(text: &str, strong: bool, emphasis: bool) -> InlineSpan {
        InlineSpan {
            text: text.to_string(),
            strong,
            emphasis,
        }
    }

    #[test]
    fn test_bold_inside_paragraph() {
        let line = format_line("hello **world**");
        assert_eq!(line.kind, ProseKind::Paragraph);
        assert_eq!(
            line.spans,
            vec![span("hello ", false, false), span("world", true, false)]
        );
    }

    #[test]
    fn test_underscore_bold_and_italic() {
        assert_eq!(
            format_inline("__a__ and _b_"),
            vec![
                span("a", true, false),
                span(" and ", false, false),
                span("b", false, true)
            ]
        );
    }

    #[test]
    fn test_emphasis_wraps_strong() {
        assert_eq!(
            format_inline("*x **y** z*"),
            vec![
                span("x ", false, true),
                span("y", true, true),
                span(" z", false, true)
            ]
        );
    }

    #[test]
    fn test_unmatched_delimiters_are_literal() {
        assert_eq!(format_inline("2 * 3 = 6"), vec![span("2 * 3 = 6", false, false)]);
        // No bold partner, so the italic pass pairs the two stars around an
        // empty run.
        assert_eq!(format_inline("**open"), vec![span("open", false, false)]);
        assert_eq!(format_inline("a_b"), vec![span("a_b", false, false)]);
    }

    #[test]
    fn test_snake_case_becomes_italic() {
        assert_eq!(
            format_inline("my_var_name"),
            vec![
                span("my", false, false),
                span("var", false, true),
                span("name", false, false)
            ]
        );
    }

    #[test]
    fn test_headings_longest_prefix_first() {
        assert_eq!(format_line("### Three").kind, ProseKind::Heading(3));
        assert_eq!(format_line("## Two").kind, ProseKind::Heading(2));
        let one = format_line("#   One **bold**");
        assert_eq!(one.kind, ProseKind::Heading(1));
        assert_eq!(one.spans, vec![span("One ", false, false), span("bold", true, false)]);
        assert_eq!(format_line("#NoSpace").kind, ProseKind::Paragraph);
        assert_eq!(format_line("#### Four").kind, ProseKind::Paragraph);
    }

    #[test]
    fn test_list_items() {
        let bullet = format_line("• first");
        assert_eq!(bullet.kind, ProseKind::ListItem);
        assert_eq!(bullet.spans, vec![span("first", false, false)]);
        assert_eq!(format_line("- second").kind, ProseKind::ListItem);
        let numbered = format_line("12. twelfth");
        assert_eq!(numbered.kind, ProseKind::ListItem);
        assert_eq!(numbered.spans, vec![span("twelfth", false, false)]);
        assert_eq!(format_line("3.no space").kind, ProseKind::Paragraph);
        assert_eq!(format_line("  - indented").kind, ProseKind::Paragraph);
    }

    #[test]
    fn test_blank_line_is_break() {
        let line = format_line("   \t");
        assert_eq!(line.kind, ProseKind::LineBreak);
        assert!(line.spans.is_empty());
    }

    #[test]
    fn test_group_lists() {
        let lines = format_prose("intro\n- a\n1. b\n\n- c\nend");
        let blocks = group_lists(lines, |l| l.kind == ProseKind::ListItem);
        let shape: Vec<_> = blocks
            .iter()
            .map(|b| match b {
                Block::Line(l) => format!("{:?}", l.kind),
                Block::List(items) => format!("List({})", items.len()),
            })
            .collect();
        assert_eq!(
            shape,
            vec!["Paragraph", "List(2)", "LineBreak", "List(1)", "Paragraph"]
        );
    }
}

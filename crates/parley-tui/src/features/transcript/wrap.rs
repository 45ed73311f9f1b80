use std::cell::RefCell;
use std::collections::HashMap;

use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

use super::renderer::CopyView;
use super::style::{Style, StyledLine, StyledSpan};

/// Cache key: message index, width, text length and copy-control state.
type CacheKey = (usize, usize, usize, CopyView);

/// Cache for wrapped message lines so unchanged messages are not rebuilt
/// every frame.
///
/// Uses interior mutability so lookups can happen during immutable render
/// passes.
#[derive(Debug, Default)]
pub struct WrapCache {
    cache: RefCell<HashMap<CacheKey, Vec<StyledLine>>>,
}

impl WrapCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Clears all entries. Call on resize or when the message list is
    /// replaced.
    pub fn clear(&self) {
        self.cache.borrow_mut().clear();
    }

    pub(crate) fn get(&self, key: CacheKey) -> Option<Vec<StyledLine>> {
        self.cache.borrow().get(&key).cloned()
    }

    pub(crate) fn insert(&self, key: CacheKey, lines: Vec<StyledLine>) {
        self.cache.borrow_mut().insert(key, lines);
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.cache.borrow().len()
    }
}

/// Wraps text on whitespace to the given display width.
///
/// Words wider than `width` are broken by character.
pub(crate) fn wrap_text(text: &str, width: usize) -> Vec<String> {
    let spans = [StyledSpan::new(text, Style::Plain)];
    wrap_spans(&spans, width)
        .into_iter()
        .map(|line| line.text())
        .collect()
}

/// Breaks a string into parts that fit within the given display width,
/// ignoring word boundaries. Expand tabs before calling.
pub(crate) fn wrap_chars(text: &str, width: usize) -> Vec<String> {
    let mut parts = Vec::new();
    let mut current = String::new();
    let mut current_width = 0;

    for ch in text.chars() {
        let ch_width = ch.width().unwrap_or(0);
        if ch_width > 0 && current_width + ch_width > width && !current.is_empty() {
            parts.push(std::mem::take(&mut current));
            current_width = 0;
        }
        current.push(ch);
        current_width += ch_width;
    }

    if !current.is_empty() || parts.is_empty() {
        parts.push(current);
    }
    parts
}

#[derive(Debug, Default)]
struct Word {
    pieces: Vec<StyledSpan>,
    width: usize,
}

impl Word {
    fn push(&mut self, ch: char, style: Style) {
        self.width += ch.width().unwrap_or(0);
        push_char(&mut self.pieces, ch, style);
    }
}

fn push_char(spans: &mut Vec<StyledSpan>, ch: char, style: Style) {
    match spans.last_mut() {
        Some(last) if last.style == style => last.text.push(ch),
        _ => spans.push(StyledSpan::new(ch.to_string(), style)),
    }
}

fn push_str(spans: &mut Vec<StyledSpan>, text: &str, style: Style) {
    match spans.last_mut() {
        Some(last) if last.style == style => last.text.push_str(text),
        _ => spans.push(StyledSpan::new(text, style)),
    }
}

fn split_words(spans: &[StyledSpan]) -> Vec<Word> {
    let mut words = Vec::new();
    let mut current = Word::default();
    for span in spans {
        for ch in span.text.chars() {
            if ch.is_whitespace() {
                if !current.pieces.is_empty() {
                    words.push(std::mem::take(&mut current));
                }
                continue;
            }
            current.push(ch, span.style);
        }
    }
    if !current.pieces.is_empty() {
        words.push(current);
    }
    words
}

/// Word-wraps styled spans to `width` columns.
///
/// Runs of whitespace collapse to one space, which takes the style of the
/// text before it. Always returns at least one (possibly empty) line.
pub(crate) fn wrap_spans(spans: &[StyledSpan], width: usize) -> Vec<StyledLine> {
    let width = width.max(1);
    let mut lines = Vec::new();
    let mut line: Vec<StyledSpan> = Vec::new();
    let mut line_width = 0;

    for word in split_words(spans) {
        if line_width > 0 && line_width + 1 + word.width <= width {
            let space_style = line.last().map_or(Style::Plain, |s| s.style);
            push_str(&mut line, " ", space_style);
            line_width += 1;
        } else if line_width > 0 {
            lines.push(StyledLine {
                spans: std::mem::take(&mut line),
            });
            line_width = 0;
        }

        if word.width <= width {
            for piece in &word.pieces {
                push_str(&mut line, &piece.text, piece.style);
            }
            line_width += word.width;
            continue;
        }

        // Too wide for any line: hard break by character.
        for piece in &word.pieces {
            for ch in piece.text.chars() {
                let ch_width = ch.width().unwrap_or(0);
                if ch_width > 0 && line_width + ch_width > width && line_width > 0 {
                    lines.push(StyledLine {
                        spans: std::mem::take(&mut line),
                    });
                    line_width = 0;
                }
                push_char(&mut line, ch, piece.style);
                line_width += ch_width;
            }
        }
    }

    if !line.is_empty() || lines.is_empty() {
        lines.push(StyledLine { spans: line });
    }
    lines
}

/// Prepends `first` to the first line and `rest` to the others.
pub(crate) fn prefix_lines(
    lines: Vec<StyledLine>,
    first: &StyledSpan,
    rest: &StyledSpan,
) -> Vec<StyledLine> {
    lines
        .into_iter()
        .enumerate()
        .map(|(i, mut line)| {
            let prefix = if i == 0 { first } else { rest };
            if !prefix.text.is_empty() {
                line.spans.insert(0, prefix.clone());
            }
            line
        })
        .collect()
}

/// Display width of a prefix string.
pub(crate) fn prefix_width(prefix: &str) -> usize {
    prefix.width()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wrap_text_basic() {
        assert_eq!(wrap_text("hello world", 20), vec!["hello world"]);
        assert_eq!(wrap_text("hello world", 8), vec!["hello", "world"]);
        assert_eq!(wrap_text("", 8), vec![""]);
    }

    #[test]
    fn test_wrap_text_long_word() {
        assert_eq!(
            wrap_text("supercalifragilistic", 10),
            vec!["supercalif", "ragilistic"]
        );
    }

    #[test]
    fn test_wrap_text_cjk_double_width() {
        assert_eq!(wrap_text("你好世界", 6), vec!["你好世", "界"]);
        assert_eq!(wrap_text("Hello 你好 World", 10), vec!["Hello 你好", "World"]);
    }

    #[test]
    fn test_wrap_chars_keeps_spaces() {
        assert_eq!(wrap_chars("    let x = 1;", 8), vec!["    let ", "x = 1;"]);
        assert_eq!(wrap_chars("", 8), vec![""]);
    }

    #[test]
    fn test_wrap_spans_keeps_styles() {
        let spans = vec![
            StyledSpan::new("plain ", Style::Assistant),
            StyledSpan::new("bold words", Style::Strong),
            StyledSpan::new("ly done", Style::Assistant),
        ];
        let lines = wrap_spans(&spans, 12);
        let texts: Vec<_> = lines.iter().map(StyledLine::text).collect();
        assert_eq!(texts, vec!["plain bold", "wordsly done"]);
        assert_eq!(
            lines[1].spans,
            vec![
                StyledSpan::new("words", Style::Strong),
                StyledSpan::new("ly done", Style::Assistant),
            ]
        );
    }

    #[test]
    fn test_cache_round_trip() {
        let cache = WrapCache::new();
        let key = (3, 80, 12, CopyView::default());
        assert!(cache.get(key).is_none());
        cache.insert(key, vec![StyledLine::empty()]);
        assert_eq!(cache.get(key), Some(vec![StyledLine::empty()]));
        assert!(cache.get((3, 81, 12, CopyView::default())).is_none());
        cache.clear();
        assert_eq!(cache.len(), 0);
    }
}

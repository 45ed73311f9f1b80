/// A styled span of text (UI-agnostic).
///
/// Converted to ratatui spans at render time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StyledSpan {
    pub text: String,
    pub style: Style,
}

impl StyledSpan {
    pub fn new(text: impl Into<String>, style: Style) -> Self {
        Self {
            text: text.into(),
            style,
        }
    }
}

/// A line of styled spans.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct StyledLine {
    pub spans: Vec<StyledSpan>,
}

impl StyledLine {
    pub fn empty() -> Self {
        StyledLine { spans: vec![] }
    }

    /// Plain text of the line.
    pub fn text(&self) -> String {
        self.spans.iter().map(|s| s.text.as_str()).collect()
    }
}

/// Semantic style identifiers (UI-agnostic).
///
/// Translated to terminal styles by the renderer so the transcript module
/// stays free of terminal dependencies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Style {
    Plain,
    /// User message prefix ("│ ").
    UserPrefix,
    /// User message content.
    User,
    /// Assistant prose.
    Assistant,
    /// Cursor shown at the end of a message being revealed.
    StreamingCursor,
    /// Status text below the transcript ("Thinking…", errors).
    Notice,

    /// Code block header rule and language.
    CodeHeader,
    /// Copy hint in a code block header.
    CopyHint,
    /// "Copied!" confirmation in a code block header.
    Copied,
    /// Code block content.
    CodeBlock,
    /// Code block closing rule.
    CodeFence,

    /// *italic*
    Emphasis,
    /// **bold**
    Strong,
    /// Bold text inside italic text.
    StrongEmphasis,
    H1,
    H2,
    H3,
    ListBullet,
}

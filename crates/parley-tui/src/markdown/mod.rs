//! Message parsing: fenced code segmentation and the prose markdown subset.

pub mod format;
pub mod segment;

pub use format::{Block, FormattedLine, InlineSpan, ProseKind, format_inline, format_line, group_lists};
pub use segment::{
    CodeBlock, DEFAULT_LANGUAGE, FENCE, IncrementalSegmenter, ProseNode, Segment, has_fence, segment,
};

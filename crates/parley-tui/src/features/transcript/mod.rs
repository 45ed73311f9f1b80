//! Transcript feature: message rendering, wrapping, scroll and copy feedback.

pub mod copy;
mod render;
pub mod renderer;
mod state;
pub mod style;
mod update;
pub mod wrap;

pub use copy::{COPY_FEEDBACK, CopyState, CopyTarget};
pub use render::{convert_styled_line, render_transcript, visible_lines};
pub use renderer::{
    CopyView, RenderNode, code_blocks, display_lines, render_message, render_plain,
    render_segments, typing_display_lines,
};
pub use state::{ScrollAccumulator, ScrollMode, ScrollState, TranscriptState};
pub use style::{Style, StyledLine, StyledSpan};
pub use update::{apply_scroll_delta, handle_mouse, handle_scroll_key};
pub use wrap::WrapCache;

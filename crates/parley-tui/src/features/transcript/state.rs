//! Transcript display state.
//!
//! Owns the conversation being shown plus everything needed to display it:
//! scroll position, viewport size, wrap cache and copy feedback.

use std::cell::{Cell, RefCell};
use std::time::Instant;

use parley_core::message::Message;
use parley_core::transcript::ConversationTranscript;

use super::copy::{CopyState, CopyTarget};
use super::renderer::{CopyView, code_blocks, display_lines, typing_display_lines};
use super::style::StyledLine;
use super::wrap::WrapCache;
use crate::markdown::IncrementalSegmenter;

/// Scroll mode for the transcript.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScrollMode {
    /// Keep the newest line visible.
    FollowLatest,
    /// User scrolled; offset is the first visible line.
    Anchored { offset: usize },
}

/// Scroll mode plus the line count from the last layout.
#[derive(Debug, Clone)]
pub struct ScrollState {
    pub mode: ScrollMode,
    pub cached_line_count: usize,
}

impl Default for ScrollState {
    fn default() -> Self {
        Self {
            mode: ScrollMode::FollowLatest,
            cached_line_count: 0,
        }
    }
}

impl ScrollState {
    pub fn is_following(&self) -> bool {
        matches!(self.mode, ScrollMode::FollowLatest)
    }

    /// First visible line, clamped to the content.
    pub fn get_offset(&self, viewport_height: usize) -> usize {
        let max_offset = self.cached_line_count.saturating_sub(viewport_height);
        match self.mode {
            ScrollMode::FollowLatest => max_offset,
            ScrollMode::Anchored { offset } => offset.min(max_offset),
        }
    }

    pub fn scroll_up(&mut self, lines: usize, viewport_height: usize) {
        let offset = self.get_offset(viewport_height).saturating_sub(lines);
        self.mode = ScrollMode::Anchored { offset };
    }

    /// Scrolls down, switching back to follow mode at the bottom.
    pub fn scroll_down(&mut self, lines: usize, viewport_height: usize) {
        if self.is_following() {
            return;
        }
        let max_offset = self.cached_line_count.saturating_sub(viewport_height);
        let offset = (self.get_offset(viewport_height) + lines).min(max_offset);
        self.mode = if offset >= max_offset {
            ScrollMode::FollowLatest
        } else {
            ScrollMode::Anchored { offset }
        };
    }

    pub fn scroll_to_top(&mut self) {
        self.mode = ScrollMode::Anchored { offset: 0 };
    }

    pub fn scroll_to_bottom(&mut self) {
        self.mode = ScrollMode::FollowLatest;
    }

    pub fn page_up(&mut self, viewport_height: usize) {
        self.scroll_up(viewport_height.max(1), viewport_height);
    }

    pub fn page_down(&mut self, viewport_height: usize) {
        self.scroll_down(viewport_height.max(1), viewport_height);
    }

    pub fn update_line_count(&mut self, line_count: usize) {
        self.cached_line_count = line_count;
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

/// Coalesces mouse wheel deltas within a frame.
///
/// Positive is down, negative is up.
#[derive(Debug, Clone, Default)]
pub struct ScrollAccumulator {
    pending_delta: i32,
}

impl ScrollAccumulator {
    pub fn accumulate(&mut self, delta: i32) {
        self.pending_delta += delta;
    }

    pub fn take_delta(&mut self) -> i32 {
        std::mem::take(&mut self.pending_delta)
    }
}

/// Shape of the transcript the cached `/copy` target was computed for.
/// Only the trailing message ever changes in place.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct CodeTargetKey {
    messages: usize,
    trailing_len: usize,
    trailing_typing: bool,
}

#[derive(Debug)]
pub struct TranscriptState {
    conversation: ConversationTranscript,
    pub scroll: ScrollState,
    pub scroll_accumulator: ScrollAccumulator,
    pub wrap_cache: WrapCache,
    /// Segmenter for the message being revealed.
    live_segmenter: RefCell<IncrementalSegmenter>,
    latest_code: Cell<Option<(CodeTargetKey, Option<usize>)>>,
    pub copy: CopyState,
    /// Height of the transcript area, set each frame.
    pub viewport_height: usize,
    /// Terminal size from the last frame.
    pub terminal_size: (u16, u16),
}

impl Default for TranscriptState {
    fn default() -> Self {
        Self::new(ConversationTranscript::new())
    }
}

impl TranscriptState {
    pub fn new(conversation: ConversationTranscript) -> Self {
        Self {
            conversation,
            scroll: ScrollState::default(),
            scroll_accumulator: ScrollAccumulator::default(),
            wrap_cache: WrapCache::new(),
            live_segmenter: RefCell::new(IncrementalSegmenter::new()),
            latest_code: Cell::new(None),
            copy: CopyState::default(),
            viewport_height: 0,
            terminal_size: (0, 0),
        }
    }

    pub fn conversation(&self) -> &ConversationTranscript {
        &self.conversation
    }

    pub fn conversation_mut(&mut self) -> &mut ConversationTranscript {
        &mut self.conversation
    }

    /// Swaps in another conversation and resets all display state.
    pub fn replace_conversation(&mut self, conversation: ConversationTranscript) {
        self.conversation = conversation;
        self.wrap_cache.clear();
        self.live_segmenter.borrow_mut().reset();
        self.latest_code.set(None);
        self.copy.clear();
        self.scroll.reset();
    }

    /// Appends a message. A new typing message starts with a fresh
    /// segmenter.
    pub fn push(&mut self, message: Message) {
        if message.is_typing {
            self.live_segmenter.borrow_mut().reset();
        }
        self.conversation.push(message);
    }

    /// Index of the newest finished assistant message with a closed code
    /// block: the target of `/copy`.
    ///
    /// Cached until a message is pushed or the trailing one changes.
    pub fn latest_code_message(&self) -> Option<usize> {
        let messages = self.conversation.messages();
        let key = CodeTargetKey {
            messages: messages.len(),
            trailing_len: messages.last().map_or(0, |m| m.text.len()),
            trailing_typing: messages.last().is_some_and(|m| m.is_typing),
        };
        if let Some((_, target)) = self.latest_code.get().filter(|(cached, _)| *cached == key) {
            return target;
        }

        let target = messages
            .iter()
            .rposition(|m| !m.is_user && !m.is_typing && !code_blocks(&m.text).is_empty());
        self.latest_code.set(Some((key, target)));
        target
    }

    /// Marks a block as copied.
    pub fn mark_copied(&mut self, target: CopyTarget, now: Instant) {
        self.copy.mark_copied(target, now);
    }

    /// Clears expired copy feedback. Called on every tick.
    pub fn check_copy_timeout(&mut self, now: Instant) {
        self.copy.check_expired(now);
    }

    pub fn on_resize(&mut self, width: u16, height: u16) {
        if self.terminal_size.0 != width {
            self.wrap_cache.clear();
        }
        self.terminal_size = (width, height);
    }

    fn copy_view(&self, index: usize, latest_code: Option<usize>) -> CopyView {
        CopyView {
            copied: self.copy.copied_block_for(index),
            hint: latest_code == Some(index),
        }
    }

    /// Lays out every message at `width`, with a blank line after each.
    pub fn build_lines(&self, width: usize) -> Vec<StyledLine> {
        let latest_code = self.latest_code_message();
        let mut lines = Vec::new();
        for (index, message) in self.conversation.messages().iter().enumerate() {
            if message.is_typing {
                let mut segmenter = self.live_segmenter.borrow_mut();
                lines.extend(typing_display_lines(message, width, &mut segmenter));
            } else {
                let view = self.copy_view(index, latest_code);
                let key = (index, width, message.text.len(), view);
                let message_lines = if let Some(cached) = self.wrap_cache.get(key) {
                    cached
                } else {
                    let built = display_lines(message, width, view);
                    self.wrap_cache.insert(key, built.clone());
                    built
                };
                lines.extend(message_lines);
            }
            lines.push(StyledLine::empty());
        }
        lines
    }

    pub fn scroll_up(&mut self, lines: usize) {
        self.scroll.scroll_up(lines, self.viewport_height);
    }

    pub fn scroll_down(&mut self, lines: usize) {
        self.scroll.scroll_down(lines, self.viewport_height);
    }

    pub fn page_up(&mut self) {
        self.scroll.page_up(self.viewport_height);
    }

    pub fn page_down(&mut self) {
        self.scroll.page_down(self.viewport_height);
    }
}

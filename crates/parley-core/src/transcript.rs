//! Ordered message list for one conversation.
//!
//! Messages are immutable once appended. The single exception is the trailing
//! message while it is typing: reveal ticks swap it for a new value carrying
//! the longer prefix, and the final tick swaps in the exact full text.

use crate::message::{ContextMessage, Message};

/// Assistant text shown when every reply provider failed.
pub const FALLBACK_REPLY: &str =
    "Sorry, I encountered an error with all available services. Please try again later.";

const WELCOME_GREETING: &str = "👋 Welcome to Parley! I'm here to help with your programming and development questions.";

const WELCOME_INTRO: &str = "I can assist with coding challenges, explain concepts, and provide examples across various languages and frameworks. For instance, here's a small Rust function:\n\n```rust\nfn greet(name: &str) -> String {\n    format!(\"Hello, {name}!\")\n}\n```\n\nFeel free to ask about:\n• Rust, Go, Python, TypeScript\n• Web frameworks and tooling\n• Algorithms and data structures\n• Best practices and code optimization\n• Debugging and troubleshooting\n\nWhat coding question can I help you with today?";

/// Messages shown at the top of every conversation. Never persisted.
pub fn welcome_messages() -> Vec<Message> {
    vec![
        Message::assistant(WELCOME_GREETING),
        Message::assistant(WELCOME_INTRO),
    ]
}

#[derive(Debug, Clone)]
pub struct ConversationTranscript {
    id: String,
    messages: Vec<Message>,
    /// Number of leading welcome messages.
    welcome_len: usize,
}

impl Default for ConversationTranscript {
    fn default() -> Self {
        Self::new()
    }
}

impl ConversationTranscript {
    /// Starts a fresh conversation with a generated id and the welcome messages.
    pub fn new() -> Self {
        Self::with_messages(uuid::Uuid::new_v4().to_string(), Vec::new())
    }

    /// Restores a saved conversation behind the welcome messages.
    pub fn with_messages(id: impl Into<String>, messages: Vec<Message>) -> Self {
        let mut all = welcome_messages();
        let welcome_len = all.len();
        all.extend(messages.into_iter().map(|mut m| {
            // A reveal never survives a reload.
            m.is_typing = false;
            m
        }));
        Self {
            id: id.into(),
            messages: all,
            welcome_len,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// All messages including the welcome prefix.
    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    /// Messages that belong to the conversation proper.
    pub fn conversation_messages(&self) -> &[Message] {
        &self.messages[self.welcome_len..]
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn last(&self) -> Option<&Message> {
        self.messages.last()
    }

    pub fn has_user_messages(&self) -> bool {
        self.conversation_messages().iter().any(|m| m.is_user)
    }

    /// True while the trailing message is still being revealed.
    pub fn is_typing(&self) -> bool {
        self.last().is_some_and(|m| m.is_typing)
    }

    pub fn push(&mut self, message: Message) {
        self.messages.push(message);
    }

    /// Replaces the trailing typing message with one carrying `text`.
    ///
    /// Returns `false` (and changes nothing) when the trailing message is
    /// not typing.
    pub fn replace_trailing_text(&mut self, text: impl Into<String>) -> bool {
        match self.messages.last_mut() {
            Some(last) if last.is_typing => {
                *last = Message::typing(text);
                true
            }
            _ => false,
        }
    }

    /// Ends the reveal: the trailing message becomes `full_text`, not typing.
    pub fn finish_trailing(&mut self, full_text: impl Into<String>) -> bool {
        match self.messages.last_mut() {
            Some(last) if last.is_typing => {
                *last = Message::assistant(full_text);
                true
            }
            _ => false,
        }
    }

    /// Provider context: conversation messages that are fully revealed.
    pub fn context(&self) -> Vec<ContextMessage> {
        self.conversation_messages()
            .iter()
            .filter(|m| !m.is_typing)
            .map(ContextMessage::from)
            .collect()
    }

    /// Title derived from the first user message.
    pub fn title(&self) -> String {
        crate::conversation::title_for(self.conversation_messages())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::Role;

    #[test]
    fn test_new_transcript_has_only_welcome() {
        let transcript = ConversationTranscript::new();
        assert_eq!(transcript.len(), 2);
        assert!(transcript.conversation_messages().is_empty());
        assert!(!transcript.has_user_messages());
        assert!(transcript.context().is_empty());
    }

    #[test]
    fn test_replace_trailing_only_when_typing() {
        let mut transcript = ConversationTranscript::new();
        transcript.push(Message::user("question"));
        assert!(!transcript.replace_trailing_text("nope"));
        assert_eq!(transcript.last().unwrap().text, "question");

        transcript.push(Message::typing(""));
        assert!(transcript.replace_trailing_text("ans"));
        assert!(transcript.replace_trailing_text("answer"));
        let len_before = transcript.len();
        assert!(transcript.finish_trailing("answer!"));
        assert_eq!(transcript.len(), len_before);
        assert_eq!(transcript.last(), Some(&Message::assistant("answer!")));
        assert!(!transcript.finish_trailing("again"));
    }

    #[test]
    fn test_earlier_messages_untouched_by_reveal() {
        let mut transcript = ConversationTranscript::new();
        transcript.push(Message::user("one"));
        transcript.push(Message::typing(""));
        let before: Vec<Message> = transcript.messages()[..transcript.len() - 1].to_vec();
        transcript.replace_trailing_text("partial");
        assert_eq!(&transcript.messages()[..transcript.len() - 1], before.as_slice());
    }

    #[test]
    fn test_context_skips_typing_and_welcome() {
        let mut transcript = ConversationTranscript::new();
        transcript.push(Message::user("q1"));
        transcript.push(Message::assistant("a1"));
        transcript.push(Message::user("q2"));
        transcript.push(Message::typing("a"));

        let context = transcript.context();
        assert_eq!(context.len(), 3);
        assert_eq!(context[0].role, Role::User);
        assert_eq!(context[2].content, "q2");
    }

    #[test]
    fn test_restored_messages_are_not_typing() {
        let transcript = ConversationTranscript::with_messages(
            "abc",
            vec![Message::user("q"), Message::typing("half")],
        );
        assert_eq!(transcript.id(), "abc");
        assert!(!transcript.is_typing());
        assert_eq!(transcript.conversation_messages().len(), 2);
    }
}

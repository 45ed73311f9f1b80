//! Feature slices of the chat UI.

pub mod input;
pub mod transcript;

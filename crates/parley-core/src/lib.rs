//! Core Parley library (config, conversations, reply providers).

pub mod config;
pub mod conversation;
pub mod logging;
pub mod message;
pub mod providers;
pub mod transcript;

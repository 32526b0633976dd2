//! Optimus: a voice assistant that turns spoken commands into actions.
//!
//! Utterances come from a host over stdin or from the microphone, are
//! classified into an intent, and run through a handler that may ask
//! follow-up questions before calling one feature service. Replies are
//! spoken through a single speech queue.

pub mod assistant;
pub mod audio;
pub mod classifier;
pub mod config;
pub mod dialogue;
pub mod handlers;
pub mod input;
pub mod ipc;
pub mod logger;
pub mod reminders;
pub mod services;
pub mod speech;
pub mod stt;
pub mod tts;

#[cfg(test)]
pub(crate) mod testing;

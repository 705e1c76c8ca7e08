//! Platform abstraction layer
//!
//! Everything the game receives from the host platform arrives as a
//! `PlatformEvent`, queued and drained once per frame:
//! - Pointer and controller input
//! - Visibility (suspend/resume) and exit requests
//! - Responses to the name prompt
//!
//! Session completions travel separately, through the session bridge.

pub mod time;

pub use time::{Clock, ManualClock, SystemClock};

use crate::input::InputEvent;

/// An event delivered by the host platform
#[derive(Debug, Clone, PartialEq)]
pub enum PlatformEvent {
    Input(InputEvent),
    /// App lost focus or was minimized
    Suspend,
    /// App is visible again
    Resume,
    /// Host asked the game to quit
    Exit,
    /// The player confirmed the name prompt
    PromptSubmitted(String),
}

impl From<InputEvent> for PlatformEvent {
    fn from(event: InputEvent) -> Self {
        PlatformEvent::Input(event)
    }
}

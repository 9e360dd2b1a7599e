//! Interview session management
//!
//! This module provides the `InterviewSession` controller that manages:
//! - The interview phase state machine (device check through summary)
//! - Per-question countdown timing and the preparation countdown
//! - Exclusive ownership of the camera/microphone capture stream
//! - Answer recording collection and evaluation hand-off
//! - Session snapshots and events for the presentation layer

mod config;
mod controller;
mod error;
mod question;
mod reminder;
mod state;

pub use config::{Difficulty, QuestionCategory, SessionConfig};
pub use controller::{InterviewSession, SessionEvent};
pub use error::SessionError;
pub use question::Question;
pub use reminder::ReminderFrequency;
pub use state::{format_clock, AnswerRecording, SessionPhase, SessionSnapshot};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::capture::MediaBlob;
use crate::evaluation::EvaluationResult;

use super::question::Question;

/// Phase of the interview session state machine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionPhase {
    /// Waiting for camera and microphone to come up
    DeviceCheck,
    /// Fixed countdown before recording begins
    Preparing,
    /// Answer recording in progress, timer running
    Recording,
    /// Recording paused, timer suspended
    Paused,
    /// All answers captured, waiting on the evaluation service
    Evaluating,
    /// Terminal: evaluation stored, session over
    Summary,
}

/// A captured answer for one question
#[derive(Debug, Clone)]
pub struct AnswerRecording {
    /// Index of the question this answer belongs to
    pub question_index: usize,

    /// Finalized media payload
    pub blob: MediaBlob,

    /// When the segment was finalized
    pub captured_at: DateTime<Utc>,
}

/// Read-model of the session state for the presentation layer
#[derive(Debug, Clone, Serialize)]
pub struct SessionSnapshot {
    /// Session identifier from the config
    pub session_id: String,

    /// Current phase
    pub phase: SessionPhase,

    /// Index of the current question (0-based)
    pub current_question: usize,

    /// The current question, if the session holds one for this index
    pub question: Option<Question>,

    /// Seconds left on the preparation countdown
    pub prep_remaining_secs: u32,

    /// Seconds left to answer the current question
    pub time_remaining_secs: u32,

    /// Whether the hint is currently revealed
    pub hint_visible: bool,

    /// Number of answers captured so far
    pub recording_count: usize,

    /// Evaluation result, populated in `Summary`
    pub evaluation: Option<EvaluationResult>,

    /// Most recent recoverable error, if any
    pub error: Option<String>,
}

/// Format seconds as an "m:ss" display clock
pub fn format_clock(total_secs: u32) -> String {
    let mins = total_secs / 60;
    let secs = total_secs % 60;
    format!("{}:{:02}", mins, secs)
}

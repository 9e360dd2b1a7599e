//! Answer evaluation
//!
//! The real scoring pipeline (speech-to-text plus a scoring model) is an
//! external service; this module defines the trait seam and result types,
//! plus the canned placeholder evaluator used until that service exists.

mod canned;
mod types;

pub use canned::CannedEvaluator;
pub use types::{DimensionScores, EvaluationResult, FeedbackItem, ScoreDelta};

use crate::session::AnswerRecording;
use anyhow::Result;

/// Scoring/evaluation service consumed by the session controller
///
/// Called once per session with every captured answer; asynchronous because
/// the real implementation is a remote transcription + scoring call.
#[async_trait::async_trait]
pub trait Evaluator: Send + Sync {
    async fn evaluate(&self, recordings: &[AnswerRecording]) -> Result<EvaluationResult>;
}

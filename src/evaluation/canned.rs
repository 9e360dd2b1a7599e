use anyhow::{bail, Result};
use tracing::info;

use super::types::{DimensionScores, EvaluationResult, FeedbackItem};
use super::Evaluator;
use crate::session::AnswerRecording;

/// Placeholder evaluator with hard-coded transcript, scores, and feedback
///
/// Stands in for the real transcription + scoring service during development.
#[derive(Debug, Clone, Copy, Default)]
pub struct CannedEvaluator;

impl CannedEvaluator {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait::async_trait]
impl Evaluator for CannedEvaluator {
    async fn evaluate(&self, recordings: &[AnswerRecording]) -> Result<EvaluationResult> {
        if recordings.is_empty() {
            bail!("no recordings to evaluate");
        }

        info!("Evaluating {} recorded answers (canned)", recordings.len());

        Ok(EvaluationResult {
            transcript: "This is a simulated transcription of the interview response.".to_string(),
            scores: DimensionScores {
                accuracy: 85,
                clarity: 90,
                confidence: 75,
            },
            feedback: vec![
                FeedbackItem {
                    category: "Content".to_string(),
                    text: "Your answer demonstrated good understanding of the topic. \
                           Consider providing more specific examples."
                        .to_string(),
                    emoji: "🎯".to_string(),
                },
                FeedbackItem {
                    category: "Delivery".to_string(),
                    text: "Clear and confident speaking. Work on maintaining consistent \
                           pace throughout."
                        .to_string(),
                    emoji: "🗣️".to_string(),
                },
                FeedbackItem {
                    category: "Structure".to_string(),
                    text: "Well-organized response with clear beginning, middle, and end."
                        .to_string(),
                    emoji: "📝".to_string(),
                },
            ],
        })
    }
}

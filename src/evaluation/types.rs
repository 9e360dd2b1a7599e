use serde::{Deserialize, Serialize};

/// Per-dimension answer scores, each in 0..=100
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DimensionScores {
    pub accuracy: u8,
    pub clarity: u8,
    pub confidence: u8,
}

/// Signed change between two score sets (current minus previous)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreDelta {
    pub accuracy: i16,
    pub clarity: i16,
    pub confidence: i16,
}

impl DimensionScores {
    /// Mean of the three dimensions
    pub fn average(&self) -> f64 {
        (self.accuracy as f64 + self.clarity as f64 + self.confidence as f64) / 3.0
    }

    /// Improvement over a previous session's scores
    pub fn delta_from(&self, previous: &DimensionScores) -> ScoreDelta {
        ScoreDelta {
            accuracy: self.accuracy as i16 - previous.accuracy as i16,
            clarity: self.clarity as i16 - previous.clarity as i16,
            confidence: self.confidence as i16 - previous.confidence as i16,
        }
    }
}

/// One piece of categorized feedback about the candidate's answers
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedbackItem {
    /// Feedback category (e.g. "Content", "Delivery", "Structure")
    pub category: String,

    /// Feedback text shown to the candidate
    pub text: String,

    /// Display emoji for the category
    pub emoji: String,
}

/// Result returned by the evaluation service for a completed session
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvaluationResult {
    /// Transcribed text of the candidate's answers
    pub transcript: String,

    /// Scores per dimension
    pub scores: DimensionScores,

    /// Ordered feedback items
    pub feedback: Vec<FeedbackItem>,
}

use serde::{Deserialize, Serialize};

use super::config::QuestionCategory;

/// A single interview question
///
/// Supplied externally as an ordered sequence; the question bank itself lives
/// outside this crate.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Question {
    /// Question identifier within its bank
    pub id: u64,

    /// Prompt text read to the candidate
    pub text: String,

    /// Optional hint, revealed on demand during recording
    pub hint: Option<String>,

    /// Question category
    pub category: QuestionCategory,
}

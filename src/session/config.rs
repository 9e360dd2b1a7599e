use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use super::error::SessionError;
use super::question::Question;

/// Interview difficulty level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

/// Question category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum QuestionCategory {
    Competency,
    Behavioural,
    Technical,
}

/// Configuration for an interview practice session
///
/// Created once by the caller before the session starts; never mutated while
/// the session runs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Unique session identifier
    pub session_id: String,

    /// Interview difficulty level
    pub difficulty: Difficulty,

    /// Enabled question categories
    pub categories: HashSet<QuestionCategory>,

    /// Number of questions in the session
    pub question_count: usize,

    /// Answer time allotted per question
    pub seconds_per_question: u32,

    /// Whether a question's recording may be replaced by a redo
    pub allow_rerecording: bool,

    /// Free-form job-function tags (e.g. "backend", "product")
    pub job_functions: Vec<String>,

    /// Preparation countdown before each session's first recording
    /// Default: 10 seconds
    pub prep_countdown_secs: u32,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            session_id: format!("interview-{}", uuid::Uuid::new_v4()),
            difficulty: Difficulty::Medium,
            categories: [
                QuestionCategory::Competency,
                QuestionCategory::Behavioural,
                QuestionCategory::Technical,
            ]
            .into_iter()
            .collect(),
            question_count: 2,
            seconds_per_question: 120,
            allow_rerecording: false,
            job_functions: Vec::new(),
            prep_countdown_secs: 10,
        }
    }
}

impl SessionConfig {
    /// Validate the configuration itself
    pub fn validate(&self) -> Result<(), SessionError> {
        if self.question_count == 0 {
            return Err(SessionError::InvalidConfig(
                "question_count must be positive".to_string(),
            ));
        }
        if self.seconds_per_question == 0 {
            return Err(SessionError::InvalidConfig(
                "seconds_per_question must be positive".to_string(),
            ));
        }
        if self.categories.is_empty() {
            return Err(SessionError::InvalidConfig(
                "at least one question category must be enabled".to_string(),
            ));
        }
        Ok(())
    }

    /// Validate an externally supplied question sequence against this config
    pub fn validate_questions(&self, questions: &[Question]) -> Result<(), SessionError> {
        if questions.len() != self.question_count {
            return Err(SessionError::InvalidConfig(format!(
                "expected {} questions, got {}",
                self.question_count,
                questions.len()
            )));
        }
        for question in questions {
            if !self.categories.contains(&question.category) {
                return Err(SessionError::InvalidConfig(format!(
                    "question {} has disabled category {:?}",
                    question.id, question.category
                )));
            }
        }
        Ok(())
    }
}

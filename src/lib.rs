pub mod capture;
pub mod config;
pub mod evaluation;
pub mod session;

pub use capture::{
    CaptureDevice, CaptureStream, MediaBlob, MediaTrack, Recorder, RecorderHandle,
    SimulatedDevices, TrackKind,
};
pub use config::Config;
pub use evaluation::{
    CannedEvaluator, DimensionScores, EvaluationResult, Evaluator, FeedbackItem, ScoreDelta,
};
pub use session::{
    format_clock, AnswerRecording, Difficulty, InterviewSession, Question, QuestionCategory,
    ReminderFrequency, SessionConfig, SessionError, SessionEvent, SessionPhase, SessionSnapshot,
};

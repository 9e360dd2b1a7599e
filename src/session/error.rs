use thiserror::Error;

use super::state::SessionPhase;

/// Errors surfaced by the session controller
///
/// Device, recorder, and evaluation failures are recoverable and recorded in
/// session state rather than thrown past the controller. `InvalidTransition`
/// and `InvalidConfig` indicate caller misuse.
#[derive(Debug, Clone, Error)]
pub enum SessionError {
    /// Camera or microphone denied/absent; the user may retry the device check
    #[error("capture devices unavailable: {0}")]
    DeviceUnavailable(String),

    /// Recorder start/stop failed; the question proceeds without a recording
    #[error("recorder failure: {0}")]
    RecorderFailure(String),

    /// Evaluation service failed; the user may retry evaluation
    #[error("evaluation failure: {0}")]
    EvaluationFailure(String),

    /// Command issued in a phase that does not accept it
    #[error("{command} is not valid in phase {phase:?}")]
    InvalidTransition {
        phase: SessionPhase,
        command: &'static str,
    },

    /// Session configuration or question sequence rejected up front
    #[error("invalid session config: {0}")]
    InvalidConfig(String),
}

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::sync::{broadcast, Mutex, MutexGuard};
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

use crate::capture::{CaptureDevice, CaptureStream, Recorder, RecorderHandle};
use crate::evaluation::{EvaluationResult, Evaluator};

use super::config::SessionConfig;
use super::error::SessionError;
use super::question::Question;
use super::state::{AnswerRecording, SessionPhase, SessionSnapshot};

/// Events emitted as the session progresses
#[derive(Debug, Clone)]
pub enum SessionEvent {
    /// Phase transition
    PhaseChanged(SessionPhase),
    /// Preparation countdown tick (seconds remaining)
    PrepTick(u32),
    /// Answer timer tick (seconds remaining)
    Tick(u32),
    /// Advanced to the question at this index
    QuestionAdvanced(usize),
    /// Hint visibility changed
    HintToggled(bool),
    /// A recoverable error was recorded in state
    Error(String),
}

/// Drives one interview from device check through evaluation hand-off
///
/// Cheap to clone; all clones share one session. The controller exclusively
/// owns the capture stream and the active recorder handle; timer tasks and the
/// evaluation call carry an epoch so late callbacks against a session that has
/// moved on (or been abandoned) are discarded instead of applied.
#[derive(Clone)]
pub struct InterviewSession {
    shared: Arc<Shared>,
}

struct Shared {
    devices: Arc<dyn CaptureDevice>,
    recorder: Arc<dyn Recorder>,
    evaluator: Arc<dyn Evaluator>,
    event_tx: broadcast::Sender<SessionEvent>,
    state: Mutex<SessionInner>,
}

struct SessionInner {
    config: SessionConfig,
    questions: Vec<Question>,
    phase: SessionPhase,
    current_question: usize,
    prep_remaining_secs: u32,
    time_remaining_secs: u32,
    hint_visible: bool,
    recordings: Vec<AnswerRecording>,
    evaluation: Option<EvaluationResult>,
    last_error: Option<SessionError>,
    stream: Option<CaptureStream>,
    active_segment: Option<RecorderHandle>,
    /// Bumped whenever the current timer or in-flight async call becomes stale
    epoch: u64,
    timer: Option<JoinHandle<()>>,
    torn_down: bool,
}

impl InterviewSession {
    /// Start a new session in `DeviceCheck` and attempt device acquisition
    ///
    /// On acquisition failure the session stays in `DeviceCheck` with the
    /// error recorded; call `retry_device_check` to attempt again.
    pub async fn start(
        config: SessionConfig,
        questions: Vec<Question>,
        devices: Arc<dyn CaptureDevice>,
        recorder: Arc<dyn Recorder>,
        evaluator: Arc<dyn Evaluator>,
    ) -> Result<Self, SessionError> {
        config.validate()?;
        config.validate_questions(&questions)?;

        info!("Starting interview session: {}", config.session_id);

        let (event_tx, _) = broadcast::channel(64);
        let session = Self {
            shared: Arc::new(Shared {
                devices,
                recorder,
                evaluator,
                event_tx,
                state: Mutex::new(SessionInner {
                    config,
                    questions,
                    phase: SessionPhase::DeviceCheck,
                    current_question: 0,
                    prep_remaining_secs: 0,
                    time_remaining_secs: 0,
                    hint_visible: false,
                    recordings: Vec::new(),
                    evaluation: None,
                    last_error: None,
                    stream: None,
                    active_segment: None,
                    epoch: 0,
                    timer: None,
                    torn_down: false,
                }),
            }),
        };

        session.run_device_check().await;
        Ok(session)
    }

    /// Subscribe to session events
    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.shared.event_tx.subscribe()
    }

    /// Current state as an owned, serializable snapshot
    pub async fn snapshot(&self) -> SessionSnapshot {
        let st = self.shared.state.lock().await;
        SessionSnapshot {
            session_id: st.config.session_id.clone(),
            phase: st.phase,
            current_question: st.current_question,
            question: st.questions.get(st.current_question).cloned(),
            prep_remaining_secs: st.prep_remaining_secs,
            time_remaining_secs: st.time_remaining_secs,
            hint_visible: st.hint_visible,
            recording_count: st.recordings.len(),
            evaluation: st.evaluation.clone(),
            error: st.last_error.as_ref().map(|e| e.to_string()),
        }
    }

    /// All answers captured so far
    pub async fn recordings(&self) -> Vec<AnswerRecording> {
        self.shared.state.lock().await.recordings.clone()
    }

    /// The captured answer for one question, if any
    pub async fn recording_for(&self, question_index: usize) -> Option<AnswerRecording> {
        self.shared
            .state
            .lock()
            .await
            .recordings
            .iter()
            .find(|r| r.question_index == question_index)
            .cloned()
    }

    /// Re-attempt device acquisition after a failed device check
    pub async fn retry_device_check(&self) -> Result<(), SessionError> {
        {
            let mut st = self.shared.state.lock().await;
            if st.phase != SessionPhase::DeviceCheck {
                return Err(self.invalid_transition(&st, "retry_device_check"));
            }
            st.last_error = None;
        }
        self.run_device_check().await;
        Ok(())
    }

    /// Toggle hint visibility; no-op outside `Recording`/`Paused`
    pub async fn toggle_hint(&self) {
        let mut st = self.shared.state.lock().await;
        if !matches!(st.phase, SessionPhase::Recording | SessionPhase::Paused) {
            return;
        }
        st.hint_visible = !st.hint_visible;
        let _ = self
            .shared
            .event_tx
            .send(SessionEvent::HintToggled(st.hint_visible));
    }

    /// Pause or resume the answer timer; no-op outside `Recording`/`Paused`
    ///
    /// Pausing suspends the timer task entirely; the remaining time is kept
    /// and the countdown resumes where it left off.
    pub async fn toggle_pause(&self) {
        let mut st = self.shared.state.lock().await;
        match st.phase {
            SessionPhase::Recording => {
                self.cancel_timer(&mut st);
                st.phase = SessionPhase::Paused;
                info!("Session paused with {}s remaining", st.time_remaining_secs);
                self.emit_phase(&st);
            }
            SessionPhase::Paused => {
                st.phase = SessionPhase::Recording;
                self.spawn_question_timer(&mut st);
                info!("Session resumed with {}s remaining", st.time_remaining_secs);
                self.emit_phase(&st);
            }
            _ => {}
        }
    }

    /// Finish the current question and move on (or into evaluation)
    pub async fn next_question(&self) -> Result<(), SessionError> {
        let mut st = self.shared.state.lock().await;
        if !matches!(st.phase, SessionPhase::Recording | SessionPhase::Paused) {
            return Err(self.invalid_transition(&st, "next_question"));
        }
        self.advance(&mut st).await;
        Ok(())
    }

    /// Retry a failed evaluation; only valid in `Evaluating` after a failure
    pub async fn retry_evaluation(&self) -> Result<(), SessionError> {
        let mut st = self.shared.state.lock().await;
        let failed = st.phase == SessionPhase::Evaluating
            && matches!(st.last_error, Some(SessionError::EvaluationFailure(_)));
        if !failed {
            return Err(self.invalid_transition(&st, "retry_evaluation"));
        }
        st.last_error = None;
        self.spawn_evaluation(&mut st);
        Ok(())
    }

    /// Tear the session down, releasing every acquired resource
    ///
    /// Safe to call from any phase and idempotent. Any in-flight timer tick or
    /// evaluation callback that lands afterwards is discarded.
    pub async fn abandon(&self) {
        let mut st = self.shared.state.lock().await;
        if st.torn_down {
            return;
        }
        st.torn_down = true;
        self.cancel_timer(&mut st);

        if let Some(handle) = st.active_segment.take() {
            if let Err(e) = self.shared.recorder.stop(handle).await {
                warn!("Failed to stop recorder during teardown: {}", e);
            }
        }
        if let Some(stream) = st.stream.take() {
            if let Err(e) = self.shared.devices.release(stream).await {
                warn!("Failed to release capture stream during teardown: {}", e);
            }
        }

        info!("Session abandoned: {}", st.config.session_id);
    }

    // ---- internal transitions ------------------------------------------------

    async fn run_device_check(&self) {
        let epoch = {
            let st = self.shared.state.lock().await;
            st.epoch
        };

        // Await the grant without holding the state lock so abandon() stays
        // responsive while the host platform prompts the user.
        match self.shared.devices.acquire().await {
            Ok(stream) => {
                let mut st = self.shared.state.lock().await;
                if st.torn_down || st.epoch != epoch || st.phase != SessionPhase::DeviceCheck {
                    drop(st);
                    warn!("Discarding capture stream acquired for a stale device check");
                    if let Err(e) = self.shared.devices.release(stream).await {
                        warn!("Failed to release stale capture stream: {}", e);
                    }
                    return;
                }
                info!(
                    "Devices ready: audio '{}', video '{}'",
                    stream.audio_track.label, stream.video_track.label
                );
                st.stream = Some(stream);
                st.last_error = None;
                self.begin_preparation(&mut st);
            }
            Err(e) => {
                let mut st = self.shared.state.lock().await;
                if st.torn_down {
                    return;
                }
                let err = SessionError::DeviceUnavailable(e.to_string());
                warn!("Device check failed: {}", err);
                self.record_error(&mut st, err);
            }
        }
    }

    fn begin_preparation(&self, st: &mut MutexGuard<'_, SessionInner>) {
        st.phase = SessionPhase::Preparing;
        st.prep_remaining_secs = st.config.prep_countdown_secs;
        self.emit_phase(st);

        if st.prep_remaining_secs == 0 {
            // Degenerate config: skip straight to the first recording segment
            self.retire_timer(st);
            let this = self.clone();
            st.timer = Some(tokio::spawn(async move {
                this.begin_recording().await;
            }));
            return;
        }

        self.retire_timer(st);
        let epoch = st.epoch;
        let this = self.clone();
        st.timer = Some(tokio::spawn(async move {
            this.run_prep_countdown(epoch).await;
        }));
    }

    async fn run_prep_countdown(self, epoch: u64) {
        let mut interval = tokio::time::interval(Duration::from_secs(1));
        interval.tick().await; // first tick completes immediately
        loop {
            interval.tick().await;
            let mut st = self.shared.state.lock().await;
            if st.epoch != epoch || st.phase != SessionPhase::Preparing {
                return; // stale countdown
            }
            st.prep_remaining_secs = st.prep_remaining_secs.saturating_sub(1);
            let _ = self
                .shared
                .event_tx
                .send(SessionEvent::PrepTick(st.prep_remaining_secs));
            if st.prep_remaining_secs == 0 {
                drop(st);
                self.begin_recording().await;
                return;
            }
        }
    }

    /// Enter `Recording` for the current question on the already-open stream
    async fn begin_recording(&self) {
        let mut st = self.shared.state.lock().await;
        if st.torn_down {
            return;
        }
        self.start_segment(&mut st).await;
        st.phase = SessionPhase::Recording;
        st.time_remaining_secs = st.config.seconds_per_question;
        st.hint_visible = false;
        self.spawn_question_timer(&mut st);
        self.emit_phase(&st);
    }

    /// Bind a fresh recorder segment to the open stream
    async fn start_segment(&self, st: &mut MutexGuard<'_, SessionInner>) {
        let started = match st.stream.as_ref() {
            Some(stream) => self.shared.recorder.start(stream).await,
            None => {
                // Stream lost (should not happen past DeviceCheck); record and move on
                error!("No capture stream available for recording segment");
                self.record_error(
                    st,
                    SessionError::RecorderFailure("no open capture stream".to_string()),
                );
                return;
            }
        };

        match started {
            Ok(handle) => {
                st.active_segment = Some(handle);
            }
            Err(e) => {
                let err = SessionError::RecorderFailure(e.to_string());
                warn!(
                    "Recorder failed to start for question {}: {}",
                    st.current_question, err
                );
                self.record_error(st, err);
            }
        }
    }

    /// Stop and flush the active segment into a recordings entry
    async fn finish_segment(&self, st: &mut MutexGuard<'_, SessionInner>) {
        let Some(handle) = st.active_segment.take() else {
            // Segment never started (earlier recorder failure); the question
            // simply has no usable recording.
            return;
        };

        match self.shared.recorder.stop(handle).await {
            Ok(blob) => {
                let entry = AnswerRecording {
                    question_index: st.current_question,
                    blob,
                    captured_at: Utc::now(),
                };
                let existing = st
                    .recordings
                    .iter()
                    .position(|r| r.question_index == entry.question_index);
                match existing {
                    Some(i) if st.config.allow_rerecording => st.recordings[i] = entry,
                    Some(_) => {
                        warn!(
                            "Duplicate recording for question {} dropped (re-recording disabled)",
                            st.current_question
                        );
                    }
                    None => st.recordings.push(entry),
                }
            }
            Err(e) => {
                let err = SessionError::RecorderFailure(e.to_string());
                warn!(
                    "Recorder failed to stop for question {}: {}",
                    st.current_question, err
                );
                self.record_error(st, err);
            }
        }
    }

    /// Advance past the current question, into the next one or into evaluation
    async fn advance(&self, st: &mut MutexGuard<'_, SessionInner>) {
        self.retire_timer(st);
        self.finish_segment(st).await;

        if st.current_question + 1 < st.config.question_count {
            st.current_question += 1;
            st.time_remaining_secs = st.config.seconds_per_question;
            st.hint_visible = false;
            self.start_segment(st).await;
            st.phase = SessionPhase::Recording;
            self.spawn_question_timer(st);
            info!(
                "Advanced to question {}/{}",
                st.current_question + 1,
                st.config.question_count
            );
            let _ = self
                .shared
                .event_tx
                .send(SessionEvent::QuestionAdvanced(st.current_question));
            self.emit_phase(st);
        } else {
            self.begin_evaluation(st).await;
        }
    }

    async fn begin_evaluation(&self, st: &mut MutexGuard<'_, SessionInner>) {
        // The capture stream is done for this session; release it before the
        // evaluation round-trip so the camera indicator goes dark immediately.
        if let Some(stream) = st.stream.take() {
            if let Err(e) = self.shared.devices.release(stream).await {
                warn!("Failed to release capture stream: {}", e);
            }
        }

        st.phase = SessionPhase::Evaluating;
        info!(
            "All {} questions answered, handing {} recordings to evaluation",
            st.config.question_count,
            st.recordings.len()
        );
        self.emit_phase(st);
        self.spawn_evaluation(st);
    }

    fn spawn_evaluation(&self, st: &mut MutexGuard<'_, SessionInner>) {
        let epoch = st.epoch;
        let recordings = st.recordings.clone();
        let this = self.clone();
        tokio::spawn(async move {
            this.run_evaluation(epoch, recordings).await;
        });
    }

    async fn run_evaluation(self, epoch: u64, recordings: Vec<AnswerRecording>) {
        let result = self.shared.evaluator.evaluate(&recordings).await;

        let mut st = self.shared.state.lock().await;
        if st.torn_down || st.epoch != epoch || st.phase != SessionPhase::Evaluating {
            warn!("Discarding evaluation result for a stale session");
            return;
        }

        match result {
            Ok(evaluation) => {
                info!(
                    "Evaluation complete: accuracy {}, clarity {}, confidence {}",
                    evaluation.scores.accuracy,
                    evaluation.scores.clarity,
                    evaluation.scores.confidence
                );
                st.evaluation = Some(evaluation);
                st.phase = SessionPhase::Summary;
                self.emit_phase(&st);
            }
            Err(e) => {
                let err = SessionError::EvaluationFailure(e.to_string());
                warn!("Evaluation failed: {}", err);
                self.record_error(&mut st, err);
                // Stay in Evaluating; the caller may retry_evaluation()
            }
        }
    }

    // ---- timer subsystem -----------------------------------------------------

    fn spawn_question_timer(&self, st: &mut MutexGuard<'_, SessionInner>) {
        self.retire_timer(st);
        let epoch = st.epoch;
        let this = self.clone();
        st.timer = Some(tokio::spawn(async move {
            this.run_question_timer(epoch).await;
        }));
    }

    async fn run_question_timer(self, epoch: u64) {
        let mut interval = tokio::time::interval(Duration::from_secs(1));
        interval.tick().await; // first tick completes immediately
        loop {
            interval.tick().await;
            let mut st = self.shared.state.lock().await;
            if st.epoch != epoch || st.phase != SessionPhase::Recording {
                return; // stale tick
            }
            st.time_remaining_secs = st.time_remaining_secs.saturating_sub(1);
            let _ = self
                .shared
                .event_tx
                .send(SessionEvent::Tick(st.time_remaining_secs));
            if st.time_remaining_secs == 0 {
                self.advance(&mut st).await;
                return;
            }
        }
    }

    /// Invalidate the current timer without aborting it
    ///
    /// Used on paths that may run inside the timer task itself: the epoch bump
    /// makes the task's next tick a no-op, at which point it exits.
    fn retire_timer(&self, st: &mut MutexGuard<'_, SessionInner>) {
        st.epoch += 1;
        st.timer = None;
    }

    /// Cancel the current timer task outright
    ///
    /// Only called from command context (pause, abandon), never from within
    /// the timer task.
    fn cancel_timer(&self, st: &mut MutexGuard<'_, SessionInner>) {
        st.epoch += 1;
        if let Some(task) = st.timer.take() {
            task.abort();
        }
    }

    // ---- helpers ---------------------------------------------------------------

    fn emit_phase(&self, st: &MutexGuard<'_, SessionInner>) {
        let _ = self
            .shared
            .event_tx
            .send(SessionEvent::PhaseChanged(st.phase));
    }

    fn record_error(&self, st: &mut MutexGuard<'_, SessionInner>, err: SessionError) {
        let _ = self.shared.event_tx.send(SessionEvent::Error(err.to_string()));
        st.last_error = Some(err);
    }

    fn invalid_transition(
        &self,
        st: &MutexGuard<'_, SessionInner>,
        command: &'static str,
    ) -> SessionError {
        let err = SessionError::InvalidTransition {
            phase: st.phase,
            command,
        };
        error!("{}", err);
        err
    }
}

// Integration tests for the interview session state machine
//
// All timing-sensitive tests run on a paused tokio clock so countdowns are
// deterministic and instant.

use anyhow::{bail, Result};
use interview_sim::{
    AnswerRecording, CannedEvaluator, CaptureDevice, CaptureStream, Difficulty, EvaluationResult,
    Evaluator, InterviewSession, MediaBlob, MediaTrack, Question, QuestionCategory, Recorder,
    RecorderHandle, SessionConfig, SessionError, SessionEvent, SessionPhase, TrackKind,
};
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, Notify};
use uuid::Uuid;

/// Mock camera/microphone provider with a failure budget and call counters
#[derive(Default)]
struct MockDevices {
    fail_acquires: AtomicUsize,
    acquires: AtomicUsize,
    releases: AtomicUsize,
}

impl MockDevices {
    fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    fn failing_first(n: usize) -> Arc<Self> {
        let devices = Self::default();
        devices.fail_acquires.store(n, Ordering::SeqCst);
        Arc::new(devices)
    }
}

#[async_trait::async_trait]
impl CaptureDevice for MockDevices {
    async fn acquire(&self) -> Result<CaptureStream> {
        self.acquires.fetch_add(1, Ordering::SeqCst);
        if self.fail_acquires.load(Ordering::SeqCst) > 0 {
            self.fail_acquires.fetch_sub(1, Ordering::SeqCst);
            bail!("permission denied");
        }
        Ok(CaptureStream {
            id: Uuid::new_v4(),
            audio_track: MediaTrack {
                kind: TrackKind::Audio,
                label: "Mock Microphone".to_string(),
            },
            video_track: MediaTrack {
                kind: TrackKind::Video,
                label: "Mock Camera".to_string(),
            },
        })
    }

    async fn release(&self, _stream: CaptureStream) -> Result<()> {
        self.releases.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// Mock recorder with start/stop failure budgets
#[derive(Default)]
struct MockRecorder {
    next_handle: AtomicU64,
    fail_starts: AtomicUsize,
    fail_stops: AtomicUsize,
    stopped: AtomicUsize,
}

impl MockRecorder {
    fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }
}

#[async_trait::async_trait]
impl Recorder for MockRecorder {
    async fn start(&self, _stream: &CaptureStream) -> Result<RecorderHandle> {
        if self.fail_starts.load(Ordering::SeqCst) > 0 {
            self.fail_starts.fetch_sub(1, Ordering::SeqCst);
            bail!("encoder init failed");
        }
        Ok(RecorderHandle(self.next_handle.fetch_add(1, Ordering::SeqCst)))
    }

    async fn stop(&self, handle: RecorderHandle) -> Result<MediaBlob> {
        if self.fail_stops.load(Ordering::SeqCst) > 0 {
            self.fail_stops.fetch_sub(1, Ordering::SeqCst);
            bail!("flush failed");
        }
        self.stopped.fetch_add(1, Ordering::SeqCst);
        Ok(MediaBlob {
            data: format!("segment-{}", handle.0).into_bytes(),
            mime_type: "audio/webm".to_string(),
        })
    }
}

/// Evaluator that blocks until the test releases it
#[derive(Default)]
struct GatedEvaluator {
    gate: Notify,
    calls: AtomicUsize,
}

#[async_trait::async_trait]
impl Evaluator for GatedEvaluator {
    async fn evaluate(&self, recordings: &[AnswerRecording]) -> Result<EvaluationResult> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.gate.notified().await;
        CannedEvaluator::new().evaluate(recordings).await
    }
}

/// Evaluator that fails a fixed number of times before succeeding
#[derive(Default)]
struct FlakyEvaluator {
    fail_calls: AtomicUsize,
}

#[async_trait::async_trait]
impl Evaluator for FlakyEvaluator {
    async fn evaluate(&self, recordings: &[AnswerRecording]) -> Result<EvaluationResult> {
        if self.fail_calls.load(Ordering::SeqCst) > 0 {
            self.fail_calls.fetch_sub(1, Ordering::SeqCst);
            bail!("scoring service unavailable");
        }
        CannedEvaluator::new().evaluate(recordings).await
    }
}

fn test_config(question_count: usize, seconds_per_question: u32) -> SessionConfig {
    SessionConfig {
        session_id: "test-session".to_string(),
        difficulty: Difficulty::Medium,
        question_count,
        seconds_per_question,
        prep_countdown_secs: 10,
        ..SessionConfig::default()
    }
}

fn test_questions(count: usize) -> Vec<Question> {
    (0..count)
        .map(|i| Question {
            id: i as u64 + 1,
            text: format!("Question {}", i + 1),
            hint: Some(format!("Hint {}", i + 1)),
            category: QuestionCategory::Technical,
        })
        .collect()
}

async fn wait_for_phase(rx: &mut broadcast::Receiver<SessionEvent>, phase: SessionPhase) {
    let wait = async {
        loop {
            match rx.recv().await {
                Ok(SessionEvent::PhaseChanged(p)) if p == phase => return,
                Ok(_) => {}
                Err(e) => panic!("event stream closed while waiting for {:?}: {}", phase, e),
            }
        }
    };
    tokio::time::timeout(Duration::from_secs(600), wait)
        .await
        .unwrap_or_else(|_| panic!("timed out waiting for phase {:?}", phase));
}

#[tokio::test(start_paused = true)]
async fn session_begins_in_device_check_and_enters_preparing() {
    let devices = MockDevices::new();
    let session = InterviewSession::start(
        test_config(2, 60),
        test_questions(2),
        devices.clone(),
        MockRecorder::new(),
        Arc::new(CannedEvaluator::new()),
    )
    .await
    .unwrap();

    // Device check succeeded during start, so we are already preparing;
    // recording never begins before the countdown runs down.
    let snapshot = session.snapshot().await;
    assert_eq!(snapshot.phase, SessionPhase::Preparing);
    assert_eq!(snapshot.prep_remaining_secs, 10);
    assert_eq!(snapshot.current_question, 0);
    assert_eq!(devices.acquires.load(Ordering::SeqCst), 1);
}

#[tokio::test(start_paused = true)]
async fn scripted_two_question_session_reaches_summary() {
    let devices = MockDevices::new();
    let recorder = MockRecorder::new();
    let session = InterviewSession::start(
        test_config(2, 1),
        test_questions(2),
        devices.clone(),
        recorder.clone(),
        Arc::new(CannedEvaluator::new()),
    )
    .await
    .unwrap();

    let mut events = session.subscribe();
    wait_for_phase(&mut events, SessionPhase::Recording).await;

    let snapshot = session.snapshot().await;
    assert_eq!(snapshot.current_question, 0);
    assert_eq!(snapshot.time_remaining_secs, 1);
    assert_eq!(snapshot.prep_remaining_secs, 0);

    // One tick exhausts question 0 and auto-advances
    wait_for_phase(&mut events, SessionPhase::Summary).await;

    let snapshot = session.snapshot().await;
    assert_eq!(snapshot.phase, SessionPhase::Summary);
    assert_eq!(snapshot.recording_count, 2);
    let evaluation = snapshot.evaluation.expect("evaluation populated in summary");
    assert_eq!(evaluation.scores.accuracy, 85);

    let recordings = session.recordings().await;
    assert_eq!(recordings.len(), 2);
    assert_eq!(recordings[0].question_index, 0);
    assert_eq!(recordings[1].question_index, 1);

    // Stream released exactly once, on entering evaluation
    assert_eq!(devices.acquires.load(Ordering::SeqCst), 1);
    assert_eq!(devices.releases.load(Ordering::SeqCst), 1);
}

#[tokio::test(start_paused = true)]
async fn prep_countdown_ignores_pause_and_hint_commands() {
    let session = InterviewSession::start(
        test_config(1, 30),
        test_questions(1),
        MockDevices::new(),
        MockRecorder::new(),
        Arc::new(CannedEvaluator::new()),
    )
    .await
    .unwrap();

    let mut events = session.subscribe();

    // Commands outside Recording/Paused are no-ops
    session.toggle_pause().await;
    session.toggle_hint().await;
    session.toggle_pause().await;

    let snapshot = session.snapshot().await;
    assert_eq!(snapshot.phase, SessionPhase::Preparing);
    assert!(!snapshot.hint_visible);

    wait_for_phase(&mut events, SessionPhase::Recording).await;
    let snapshot = session.snapshot().await;
    assert_eq!(snapshot.prep_remaining_secs, 0);
    assert!(!snapshot.hint_visible);
}

#[tokio::test(start_paused = true)]
async fn device_failure_stays_in_device_check_and_retry_recovers() {
    let devices = MockDevices::failing_first(1);
    let session = InterviewSession::start(
        test_config(1, 30),
        test_questions(1),
        devices.clone(),
        MockRecorder::new(),
        Arc::new(CannedEvaluator::new()),
    )
    .await
    .unwrap();

    let snapshot = session.snapshot().await;
    assert_eq!(snapshot.phase, SessionPhase::DeviceCheck);
    let error = snapshot.error.expect("device error surfaced in state");
    assert!(error.contains("capture devices unavailable"));

    session.retry_device_check().await.unwrap();

    let snapshot = session.snapshot().await;
    assert_eq!(snapshot.phase, SessionPhase::Preparing);
    assert!(snapshot.error.is_none());
    assert_eq!(devices.acquires.load(Ordering::SeqCst), 2);
    assert_eq!(devices.releases.load(Ordering::SeqCst), 0);

    session.abandon().await;
    assert_eq!(devices.releases.load(Ordering::SeqCst), 1);
}

#[tokio::test(start_paused = true)]
async fn pause_suspends_timer_without_resetting_it() {
    let session = InterviewSession::start(
        test_config(1, 5),
        test_questions(1),
        MockDevices::new(),
        MockRecorder::new(),
        Arc::new(CannedEvaluator::new()),
    )
    .await
    .unwrap();

    let mut events = session.subscribe();
    wait_for_phase(&mut events, SessionPhase::Recording).await;

    session.toggle_pause().await;
    let snapshot = session.snapshot().await;
    assert_eq!(snapshot.phase, SessionPhase::Paused);
    assert_eq!(snapshot.time_remaining_secs, 5);

    // Paused phase has no timer; time passing changes nothing
    tokio::time::sleep(Duration::from_secs(30)).await;
    let snapshot = session.snapshot().await;
    assert_eq!(snapshot.phase, SessionPhase::Paused);
    assert_eq!(snapshot.time_remaining_secs, 5);

    session.toggle_pause().await;
    wait_for_phase(&mut events, SessionPhase::Evaluating).await;
    session.abandon().await;
}

#[tokio::test(start_paused = true)]
async fn timer_ticks_never_go_negative() {
    let session = InterviewSession::start(
        test_config(1, 3),
        test_questions(1),
        MockDevices::new(),
        MockRecorder::new(),
        Arc::new(CannedEvaluator::new()),
    )
    .await
    .unwrap();

    let mut events = session.subscribe();
    let mut ticks = Vec::new();
    loop {
        match tokio::time::timeout(Duration::from_secs(600), events.recv())
            .await
            .expect("session stalled")
        {
            Ok(SessionEvent::Tick(t)) => ticks.push(t),
            Ok(SessionEvent::PhaseChanged(SessionPhase::Summary)) => break,
            Ok(_) => {}
            Err(e) => panic!("event stream closed: {}", e),
        }
    }

    assert_eq!(ticks, vec![2, 1, 0]);
}

#[tokio::test(start_paused = true)]
async fn explicit_next_question_resets_timer_and_clears_hint() {
    let session = InterviewSession::start(
        test_config(2, 60),
        test_questions(2),
        MockDevices::new(),
        MockRecorder::new(),
        Arc::new(CannedEvaluator::new()),
    )
    .await
    .unwrap();

    let mut events = session.subscribe();
    wait_for_phase(&mut events, SessionPhase::Recording).await;

    session.toggle_hint().await;
    assert!(session.snapshot().await.hint_visible);

    session.next_question().await.unwrap();
    let snapshot = session.snapshot().await;
    assert_eq!(snapshot.phase, SessionPhase::Recording);
    assert_eq!(snapshot.current_question, 1);
    assert_eq!(snapshot.time_remaining_secs, 60);
    assert!(!snapshot.hint_visible);
    assert_eq!(snapshot.recording_count, 1);

    // Advancing past the last question goes to evaluation, never recording
    session.next_question().await.unwrap();
    wait_for_phase(&mut events, SessionPhase::Summary).await;
    assert_eq!(session.recordings().await.len(), 2);
}

#[tokio::test(start_paused = true)]
async fn commands_in_wrong_phase_are_invalid_transitions() {
    let session = InterviewSession::start(
        test_config(1, 60),
        test_questions(1),
        MockDevices::new(),
        MockRecorder::new(),
        Arc::new(CannedEvaluator::new()),
    )
    .await
    .unwrap();

    let mut events = session.subscribe();
    wait_for_phase(&mut events, SessionPhase::Recording).await;

    assert!(matches!(
        session.retry_device_check().await,
        Err(SessionError::InvalidTransition { .. })
    ));
    assert!(matches!(
        session.retry_evaluation().await,
        Err(SessionError::InvalidTransition { .. })
    ));

    session.next_question().await.unwrap();
    wait_for_phase(&mut events, SessionPhase::Summary).await;

    // Summary is terminal
    assert!(matches!(
        session.next_question().await,
        Err(SessionError::InvalidTransition { .. })
    ));
}

#[tokio::test(start_paused = true)]
async fn recorder_stop_failure_still_advances_without_a_recording() {
    let recorder = MockRecorder::new();
    recorder.fail_stops.store(1, Ordering::SeqCst);

    let session = InterviewSession::start(
        test_config(2, 60),
        test_questions(2),
        MockDevices::new(),
        recorder.clone(),
        Arc::new(CannedEvaluator::new()),
    )
    .await
    .unwrap();

    let mut events = session.subscribe();
    wait_for_phase(&mut events, SessionPhase::Recording).await;

    session.next_question().await.unwrap();
    let snapshot = session.snapshot().await;
    assert_eq!(snapshot.current_question, 1);
    assert_eq!(snapshot.recording_count, 0);
    let error = snapshot.error.expect("recorder failure surfaced in state");
    assert!(error.contains("recorder failure"));

    session.next_question().await.unwrap();
    wait_for_phase(&mut events, SessionPhase::Summary).await;

    let recordings = session.recordings().await;
    assert_eq!(recordings.len(), 1);
    assert_eq!(recordings[0].question_index, 1);
    assert!(session.recording_for(0).await.is_none());
}

#[tokio::test(start_paused = true)]
async fn recorder_start_failure_does_not_deadlock_the_question() {
    let recorder = MockRecorder::new();
    recorder.fail_starts.store(1, Ordering::SeqCst);

    let session = InterviewSession::start(
        test_config(2, 60),
        test_questions(2),
        MockDevices::new(),
        recorder.clone(),
        Arc::new(CannedEvaluator::new()),
    )
    .await
    .unwrap();

    let mut events = session.subscribe();
    wait_for_phase(&mut events, SessionPhase::Recording).await;
    assert!(session.snapshot().await.error.is_some());

    // Question 0 has no active segment; the session still advances and the
    // second question records normally.
    session.next_question().await.unwrap();
    session.next_question().await.unwrap();
    wait_for_phase(&mut events, SessionPhase::Summary).await;

    let recordings = session.recordings().await;
    assert_eq!(recordings.len(), 1);
    assert_eq!(recordings[0].question_index, 1);
}

#[tokio::test(start_paused = true)]
async fn evaluation_failure_leaves_evaluating_and_retry_succeeds() {
    let evaluator = Arc::new(FlakyEvaluator::default());
    evaluator.fail_calls.store(1, Ordering::SeqCst);

    let session = InterviewSession::start(
        test_config(1, 60),
        test_questions(1),
        MockDevices::new(),
        MockRecorder::new(),
        evaluator,
    )
    .await
    .unwrap();

    let mut events = session.subscribe();
    wait_for_phase(&mut events, SessionPhase::Recording).await;
    session.next_question().await.unwrap();
    wait_for_phase(&mut events, SessionPhase::Evaluating).await;

    // Wait for the failure to land in state
    let error = tokio::time::timeout(Duration::from_secs(600), async {
        loop {
            if let Ok(SessionEvent::Error(e)) = events.recv().await {
                return e;
            }
        }
    })
    .await
    .expect("evaluation failure never surfaced");
    assert!(error.contains("evaluation failure"));

    let snapshot = session.snapshot().await;
    assert_eq!(snapshot.phase, SessionPhase::Evaluating);
    assert!(snapshot.evaluation.is_none());

    session.retry_evaluation().await.unwrap();
    wait_for_phase(&mut events, SessionPhase::Summary).await;
    assert!(session.snapshot().await.evaluation.is_some());
}

#[tokio::test(start_paused = true)]
async fn abandon_discards_late_evaluation_result() {
    let devices = MockDevices::new();
    let evaluator = Arc::new(GatedEvaluator::default());

    let session = InterviewSession::start(
        test_config(1, 60),
        test_questions(1),
        devices.clone(),
        MockRecorder::new(),
        evaluator.clone(),
    )
    .await
    .unwrap();

    let mut events = session.subscribe();
    wait_for_phase(&mut events, SessionPhase::Recording).await;
    session.next_question().await.unwrap();
    wait_for_phase(&mut events, SessionPhase::Evaluating).await;

    // Evaluation is in flight; abandon, then let the callback arrive late
    session.abandon().await;
    evaluator.gate.notify_one();
    for _ in 0..10 {
        tokio::task::yield_now().await;
    }

    let snapshot = session.snapshot().await;
    assert_ne!(snapshot.phase, SessionPhase::Summary);
    assert!(snapshot.evaluation.is_none());
    assert_eq!(evaluator.calls.load(Ordering::SeqCst), 1);

    // Stream was released on entering evaluation; abandon must not double-release
    assert_eq!(devices.acquires.load(Ordering::SeqCst), 1);
    assert_eq!(devices.releases.load(Ordering::SeqCst), 1);
}

#[tokio::test(start_paused = true)]
async fn abandon_mid_recording_releases_the_stream() {
    let devices = MockDevices::new();
    let recorder = MockRecorder::new();

    let session = InterviewSession::start(
        test_config(3, 60),
        test_questions(3),
        devices.clone(),
        recorder.clone(),
        Arc::new(CannedEvaluator::new()),
    )
    .await
    .unwrap();

    let mut events = session.subscribe();
    wait_for_phase(&mut events, SessionPhase::Recording).await;

    session.abandon().await;
    assert_eq!(devices.releases.load(Ordering::SeqCst), 1);
    // Active segment was stopped during teardown
    assert_eq!(recorder.stopped.load(Ordering::SeqCst), 1);

    // Abandon is idempotent
    session.abandon().await;
    assert_eq!(devices.releases.load(Ordering::SeqCst), 1);

    // No timer survives teardown
    tokio::time::sleep(Duration::from_secs(120)).await;
    assert_eq!(session.snapshot().await.time_remaining_secs, 60);
}

#[tokio::test]
async fn invalid_config_is_rejected_before_device_check() {
    let devices = MockDevices::new();
    let result = InterviewSession::start(
        test_config(0, 60),
        Vec::new(),
        devices.clone(),
        MockRecorder::new(),
        Arc::new(CannedEvaluator::new()),
    )
    .await;

    assert!(matches!(result, Err(SessionError::InvalidConfig(_))));
    assert_eq!(devices.acquires.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn question_sequence_must_match_config() {
    let result = InterviewSession::start(
        test_config(2, 60),
        test_questions(1),
        MockDevices::new(),
        MockRecorder::new(),
        Arc::new(CannedEvaluator::new()),
    )
    .await;

    assert!(matches!(result, Err(SessionError::InvalidConfig(_))));
}

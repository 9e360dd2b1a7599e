use anyhow::Result;
use interview_sim::{
    CannedEvaluator, Config, Difficulty, InterviewSession, Question, QuestionCategory,
    SessionConfig, SessionEvent, SessionPhase, SimulatedDevices,
};
use std::sync::Arc;
use tracing::info;

/// Demo run: a full session against the simulated capture stack and the
/// canned evaluator, printing the final snapshot as JSON.
#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let cfg = Config::load("config/interview-sim")?;

    info!("Interview Sim v0.1.0");
    info!("Loaded config: {}", cfg.service.name);

    let session_config = SessionConfig {
        difficulty: Difficulty::Medium,
        question_count: cfg.session.question_count,
        seconds_per_question: cfg.session.seconds_per_question,
        prep_countdown_secs: cfg.session.prep_countdown_secs,
        allow_rerecording: cfg.session.allow_rerecording,
        job_functions: vec!["software-engineering".to_string()],
        ..SessionConfig::default()
    };

    let questions = vec![
        Question {
            id: 1,
            text: "Tell me about a time when you had to solve a complex technical problem."
                .to_string(),
            hint: Some("Focus on your problem-solving process and the outcome.".to_string()),
            category: QuestionCategory::Technical,
        },
        Question {
            id: 2,
            text: "How do you handle conflicts within your team?".to_string(),
            hint: Some("Share a specific example and your approach to resolution.".to_string()),
            category: QuestionCategory::Behavioural,
        },
    ];

    let devices = Arc::new(SimulatedDevices::new());
    let session = InterviewSession::start(
        session_config,
        questions,
        devices.clone(),
        devices,
        Arc::new(CannedEvaluator::new()),
    )
    .await?;

    let mut events = session.subscribe();
    while let Ok(event) = events.recv().await {
        match event {
            SessionEvent::PhaseChanged(SessionPhase::Summary) => break,
            SessionEvent::PhaseChanged(phase) => info!("Phase: {:?}", phase),
            SessionEvent::QuestionAdvanced(index) => info!("Now on question {}", index + 1),
            SessionEvent::Error(e) => info!("Session error: {}", e),
            _ => {}
        }
    }

    let snapshot = session.snapshot().await;
    println!("{}", serde_json::to_string_pretty(&snapshot)?);

    Ok(())
}

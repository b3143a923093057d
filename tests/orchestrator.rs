//! End-to-end turn pipeline tests against the scripted gateway.

use cognisim::error::{GatewayError, SessionError, TurnStage};
use cognisim::gateway::{CompletionRequest, Gateway, ScriptedGateway};
use cognisim::persona::GuardedTopic;
use cognisim::state::LevelDecision;
use cognisim::synth::policy;
use cognisim::{Config, OpennessLevel, Orchestrator, Persona};
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

/// Gateway that is permanently down.
struct DownGateway;

impl Gateway for DownGateway {
    fn name(&self) -> &str {
        "down"
    }

    fn complete<'a>(
        &'a self,
        _request: &'a CompletionRequest,
    ) -> Pin<Box<dyn Future<Output = Result<String, GatewayError>> + Send + 'a>> {
        Box::pin(async move {
            Err(GatewayError::Timeout {
                gateway: "down".into(),
            })
        })
    }
}

fn persona() -> Arc<Persona> {
    Arc::new(Persona {
        name: "Madam Chan".into(),
        background: "52-year-old mother of two, recently unemployed.".into(),
        presenting_problem: "Referred after a neighbour reported shouting at home.".into(),
        speech_style: "short, clipped sentences".into(),
        guarded_topics: vec![
            GuardedTopic {
                topic: "family".into(),
                keywords: vec!["husband".into(), "shouting".into()],
                unlocked_at: OpennessLevel::TentativelyOpen,
            },
            GuardedTopic {
                topic: "finances".into(),
                keywords: vec!["money".into(), "debt".into(), "rent".into()],
                unlocked_at: OpennessLevel::ModeratelyOpen,
            },
            GuardedTopic {
                topic: "trauma".into(),
                keywords: vec!["trauma".into(), "childhood".into()],
                unlocked_at: OpennessLevel::SignificantlyOpen,
            },
        ],
    })
}

fn orchestrator(gateway: Arc<ScriptedGateway>) -> Orchestrator {
    Orchestrator::new(gateway, &Config::default()).unwrap()
}

#[tokio::test]
async fn gentle_greeting_holds_closed() {
    let gateway = Arc::new(ScriptedGateway::new());
    let orchestrator = orchestrator(gateway);
    let id = orchestrator.create_session(persona());

    let receipt = orchestrator
        .submit_message(id, "Hi, I'm here to help, how are you?")
        .await
        .unwrap();
    assert_eq!(receipt.decision, LevelDecision::Held);
    assert_eq!(receipt.state.openness_level, OpennessLevel::Closed);
    assert!(policy::count_sentences(&receipt.reply) <= 1);
}

#[tokio::test]
async fn sustained_validation_opens_up_gradually() {
    let gateway = Arc::new(ScriptedGateway::new());
    let orchestrator = orchestrator(gateway);
    let id = orchestrator.create_session(persona());

    let messages = [
        "Take your time, there's no pressure.",
        "That sounds really hard, I hear you.",
        "I can see this has been a lot for you, take your time.",
        "Thank you for sharing that with me, it's okay.",
    ];
    let mut levels = Vec::new();
    for message in messages {
        let receipt = orchestrator.submit_message(id, message).await.unwrap();
        levels.push(receipt.state.openness_level);
    }

    // Two advances, a pacing hold, then a third advance.
    assert_eq!(
        levels,
        vec![
            OpennessLevel::Cautious,
            OpennessLevel::TentativelyOpen,
            OpennessLevel::TentativelyOpen,
            OpennessLevel::ModeratelyOpen,
        ]
    );
}

#[tokio::test]
async fn pressured_guarded_topic_clamps_the_level() {
    let gateway = Arc::new(ScriptedGateway::new());
    let orchestrator = orchestrator(gateway);
    let id = orchestrator.create_session(persona());

    let receipt = orchestrator
        .submit_message(id, "Tell me about your childhood trauma in detail.")
        .await
        .unwrap();
    assert_eq!(receipt.decision, LevelDecision::Refused);
    assert_eq!(receipt.state.openness_level, OpennessLevel::Closed);
    assert!(receipt.state.behaviors.iter().any(|b| b == "deflecting"));
}

#[tokio::test]
async fn dismissive_message_walks_the_level_back() {
    let gateway = Arc::new(ScriptedGateway::new());
    let orchestrator = orchestrator(gateway);
    let id = orchestrator.create_session(persona());

    orchestrator
        .submit_message(id, "Take your time, no rush.")
        .await
        .unwrap();
    orchestrator
        .submit_message(id, "That makes sense, I hear you.")
        .await
        .unwrap();
    assert_eq!(
        orchestrator.state(id).await.unwrap().openness_level,
        OpennessLevel::TentativelyOpen
    );

    let receipt = orchestrator
        .submit_message(id, "Honestly, you're overreacting, it's not a big deal.")
        .await
        .unwrap();
    assert_eq!(receipt.decision, LevelDecision::Retreated);
    assert_eq!(receipt.state.openness_level, OpennessLevel::Cautious);
}

#[tokio::test]
async fn double_oracle_failure_commits_a_no_op_turn() {
    let gateway = Arc::new(ScriptedGateway::new());
    gateway.push_brain("not json at all");
    gateway.push_brain("still not json");
    let orchestrator = orchestrator(gateway);
    let id = orchestrator.create_session(persona());
    let before = orchestrator.state(id).await.unwrap();

    let receipt = orchestrator
        .submit_message(id, "Take your time, no rush.")
        .await
        .unwrap();
    let after = orchestrator.state(id).await.unwrap();

    assert!(after.same_posture(&before));
    assert_eq!(after.turn_index, 1);
    assert_eq!(receipt.reply, policy::canned_deflection(OpennessLevel::Closed));

    // The failed turn is fully committed; the next one proceeds normally.
    let next = orchestrator
        .submit_message(id, "That sounds hard, I hear you.")
        .await
        .unwrap();
    assert_eq!(next.turn_index, 2);
    assert_eq!(next.state.openness_level, OpennessLevel::Cautious);
}

#[tokio::test]
async fn retry_exhaustion_surfaces_as_temporarily_unavailable() {
    let mut config = Config::default();
    config.reliability.max_retries = 1;
    config.reliability.base_backoff_ms = 1;
    let orchestrator = Orchestrator::new(Arc::new(DownGateway), &config).unwrap();
    let id = orchestrator.create_session(persona());

    let err = orchestrator
        .submit_message(id, "How are you?")
        .await
        .unwrap_err();
    match err {
        SessionError::TemporarilyUnavailable { stage, source } => {
            assert_eq!(stage, TurnStage::Transition);
            assert!(matches!(source, GatewayError::Timeout { .. }));
        }
        other => panic!("expected TemporarilyUnavailable, got {other:?}"),
    }

    // Nothing committed: the session is intact and still usable.
    let state = orchestrator.state(id).await.unwrap();
    assert_eq!(state.turn_index, 0);
    assert!(orchestrator.export_turns(id).await.unwrap().is_empty());
}

#[tokio::test]
async fn concurrent_submissions_serialize_per_session() {
    let gateway = Arc::new(ScriptedGateway::new());
    let orchestrator = Arc::new(orchestrator(gateway));
    let id = orchestrator.create_session(persona());

    let a = {
        let orchestrator = Arc::clone(&orchestrator);
        tokio::spawn(async move {
            orchestrator
                .submit_message(id, "How are you today?")
                .await
                .unwrap()
        })
    };
    let b = {
        let orchestrator = Arc::clone(&orchestrator);
        tokio::spawn(async move {
            orchestrator
                .submit_message(id, "How has your week been?")
                .await
                .unwrap()
        })
    };
    let (first, second) = (a.await.unwrap(), b.await.unwrap());

    let mut indexes = vec![first.turn_index, second.turn_index];
    indexes.sort_unstable();
    assert_eq!(indexes, vec![1, 2]);

    let turns = orchestrator.export_turns(id).await.unwrap();
    assert_eq!(turns.len(), 2);
    assert_eq!(orchestrator.state(id).await.unwrap().turn_index, 2);
}

#[tokio::test]
async fn exported_turns_carry_full_state_snapshots() {
    let gateway = Arc::new(ScriptedGateway::new());
    let orchestrator = orchestrator(gateway);
    let id = orchestrator.create_session(persona());

    orchestrator
        .submit_message(id, "Take your time, no rush.")
        .await
        .unwrap();
    let turns = orchestrator.export_turns(id).await.unwrap();
    assert_eq!(turns.len(), 1);
    assert_eq!(turns[0].turn_index, 1);
    assert_eq!(turns[0].incoming_message, "Take your time, no rush.");
    assert!(!turns[0].state.emotions.is_empty());
    // The log serializes for transcript export.
    let json = serde_json::to_string(&turns).unwrap();
    assert!(json.contains("\"openness_level\""));
}

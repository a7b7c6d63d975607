mod support;

use std::sync::Arc;

use serde_json::json;

use checker_core::broker::CredentialBroker;
use checker_core::domain::{ServiceAccount, SubmissionDraft};
use checker_core::forwarding::SubmissionPipeline;
use checker_core::ports::PortError;
use support::{InMemoryStore, ScriptedAnalysis, ScriptedLms};

fn pipeline(
    store: Arc<InMemoryStore>,
    analysis: Arc<ScriptedAnalysis>,
) -> SubmissionPipeline {
    let broker = CredentialBroker::new(
        store.clone(),
        Arc::new(ScriptedLms::new()),
        ServiceAccount {
            username: "svc".to_string(),
            password: "secret".to_string(),
            user_id: 2,
        },
    );
    SubmissionPipeline::new(store, analysis, broker)
}

fn draft() -> SubmissionDraft {
    SubmissionDraft {
        title: Some("Essay".to_string()),
        content_type: Some("text".to_string()),
        content: Some("the essay body".to_string()),
        assignment_id: Some("11".to_string()),
        course_id: Some("4".to_string()),
    }
}

fn upstream_result() -> serde_json::Value {
    json!({
        "submissionId": "sub-123",
        "ai_generated": 0.73,
        "assessment": "review",
    })
}

#[tokio::test]
async fn successful_submit_persists_the_raw_result() {
    let store = Arc::new(InMemoryStore::new());
    let analysis = Arc::new(ScriptedAnalysis::new(upstream_result()));
    let pipeline = pipeline(store.clone(), analysis.clone());

    let result = pipeline.submit("session-a", &draft()).await.unwrap();

    assert_eq!(result, upstream_result());
    assert_eq!(analysis.submit_count(), 1);
    assert_eq!(store.analysis_record_count(), 1);
}

#[tokio::test]
async fn forwarded_payload_uses_the_analysis_intake_field_names() {
    let store = Arc::new(InMemoryStore::new());
    let analysis = Arc::new(ScriptedAnalysis::new(upstream_result()));
    let pipeline = pipeline(store.clone(), analysis.clone());

    pipeline.submit("session-a", &draft()).await.unwrap();

    let payload = analysis.last_payload().expect("payload should be recorded");
    assert_eq!(
        payload,
        json!({
            "title": "Essay",
            "content_type": "text",
            "content": "the essay body",
            "moodle_assignment_id": "11",
            "moodle_course_id": "4",
        })
    );
}

#[tokio::test]
async fn missing_assignment_id_is_rejected_before_any_side_effect() {
    let store = Arc::new(InMemoryStore::new());
    let analysis = Arc::new(ScriptedAnalysis::new(upstream_result()));
    let pipeline = pipeline(store.clone(), analysis.clone());

    let mut bad = draft();
    bad.assignment_id = None;

    let err = pipeline.submit("session-a", &bad).await.unwrap_err();

    assert!(matches!(err, PortError::Validation(_)));
    assert_eq!(analysis.submit_count(), 0);
    assert_eq!(store.analysis_record_count(), 0);
}

#[tokio::test]
async fn response_without_a_submission_id_is_not_persisted() {
    let store = Arc::new(InMemoryStore::new());
    let analysis = Arc::new(ScriptedAnalysis::new(json!({ "status": "accepted" })));
    let pipeline = pipeline(store.clone(), analysis.clone());

    let err = pipeline.submit("session-a", &draft()).await.unwrap_err();

    assert!(matches!(err, PortError::Unexpected(_)));
    assert_eq!(store.analysis_record_count(), 0);
}

#[tokio::test]
async fn results_replay_the_persisted_blob_without_an_upstream_call() {
    let store = Arc::new(InMemoryStore::new());
    let analysis = Arc::new(ScriptedAnalysis::new(upstream_result()));
    let pipeline = pipeline(store.clone(), analysis.clone());

    let submitted = pipeline.submit("session-a", &draft()).await.unwrap();
    let replayed = pipeline.results("session-a", "sub-123").await.unwrap();

    assert_eq!(submitted, replayed);
    assert_eq!(analysis.fetch_count(), 0);
}

#[tokio::test]
async fn cache_miss_falls_back_to_exactly_one_fetch() {
    let store = Arc::new(InMemoryStore::new());
    let analysis = Arc::new(ScriptedAnalysis::new(upstream_result()));
    let pipeline = pipeline(store.clone(), analysis.clone());

    let result = pipeline.results("session-a", "unknown-id").await.unwrap();

    assert_eq!(result, upstream_result());
    assert_eq!(analysis.fetch_count(), 1);
}

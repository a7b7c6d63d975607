mod support;

use std::sync::Arc;

use chrono::{Duration, Utc};

use checker_core::broker::CredentialBroker;
use checker_core::domain::{ServiceAccount, UpstreamSession};
use support::{InMemoryStore, ScriptedLms};

fn account() -> ServiceAccount {
    ServiceAccount {
        username: "svc".to_string(),
        password: "secret".to_string(),
        user_id: 2,
    }
}

fn broker(store: Arc<InMemoryStore>, lms: Arc<ScriptedLms>) -> CredentialBroker {
    CredentialBroker::new(store, lms, account())
}

#[tokio::test]
async fn fresh_session_performs_exactly_one_exchange() {
    let store = Arc::new(InMemoryStore::new());
    let lms = Arc::new(ScriptedLms::new());
    let broker = broker(store.clone(), lms.clone());

    let token = broker.ensure_lms_token("session-a").await.unwrap();

    assert!(!token.is_empty());
    assert_eq!(lms.exchange_count(), 1);
    assert_eq!(store.session_count(), 1);

    let row = store.session("session-a").unwrap();
    assert_eq!(row.lms_token.as_deref(), Some(token.as_str()));
    assert!(row.expires_at.unwrap() > Utc::now());
}

#[tokio::test]
async fn cached_token_is_returned_without_a_second_exchange() {
    let store = Arc::new(InMemoryStore::new());
    let lms = Arc::new(ScriptedLms::new());
    let broker = broker(store.clone(), lms.clone());

    let first = broker.ensure_lms_token("session-a").await.unwrap();
    let second = broker.ensure_lms_token("session-a").await.unwrap();

    assert_eq!(first, second);
    assert_eq!(lms.exchange_count(), 1);
    assert_eq!(store.session_count(), 1);
}

#[tokio::test]
async fn expired_token_is_rederived() {
    let store = Arc::new(InMemoryStore::new());
    let lms = Arc::new(ScriptedLms::new());
    let broker = broker(store.clone(), lms.clone());

    store.put_session(UpstreamSession {
        session_id: "session-a".to_string(),
        lms_token: Some("stale".to_string()),
        analysis_token: None,
        created_at: Utc::now() - Duration::days(2),
        expires_at: Some(Utc::now() - Duration::days(1)),
    });

    let token = broker.ensure_lms_token("session-a").await.unwrap();

    assert_ne!(token, "stale");
    assert_eq!(lms.exchange_count(), 1);
}

#[tokio::test]
async fn reauthentication_keeps_the_analysis_credential() {
    let store = Arc::new(InMemoryStore::new());
    let lms = Arc::new(ScriptedLms::new());
    let broker = broker(store.clone(), lms.clone());

    store.put_session(UpstreamSession {
        session_id: "session-a".to_string(),
        lms_token: None,
        analysis_token: Some("analysis-cred".to_string()),
        created_at: Utc::now(),
        expires_at: None,
    });

    broker.ensure_lms_token("session-a").await.unwrap();

    let row = store.session("session-a").unwrap();
    assert_eq!(row.analysis_token.as_deref(), Some("analysis-cred"));
}

#[tokio::test]
async fn missing_analysis_credential_is_the_empty_string() {
    let store = Arc::new(InMemoryStore::new());
    let lms = Arc::new(ScriptedLms::new());
    let broker = broker(store.clone(), lms.clone());

    // Unknown session id, and a session without the credential: both empty.
    assert_eq!(broker.analysis_token("nope").await.unwrap(), "");

    broker.ensure_lms_token("session-a").await.unwrap();
    assert_eq!(broker.analysis_token("session-a").await.unwrap(), "");
}

#[tokio::test]
async fn fetch_courses_authenticates_lazily_and_passes_raw_json_through() {
    let store = Arc::new(InMemoryStore::new());
    let lms = Arc::new(ScriptedLms::new());
    let broker = broker(store.clone(), lms.clone());

    let courses = broker.fetch_courses("session-a").await.unwrap();

    assert_eq!(lms.exchange_count(), 1);
    // The gateway response is not reshaped.
    assert_eq!(courses[0]["fullname"], "Course 1");
    assert_eq!(courses[0]["userid"], 2);

    // A second listing reuses the cached token.
    broker.fetch_courses("session-a").await.unwrap();
    assert_eq!(lms.exchange_count(), 1);
}

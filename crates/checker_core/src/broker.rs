//! crates/checker_core/src/broker.rs
//!
//! The session and credential broker: maps an opaque session id to the pair
//! of upstream bearer credentials, acquiring the LMS token lazily and caching
//! it in the store with a fixed validity window.

use std::sync::Arc;

use chrono::{Duration, Utc};
use serde_json::Value;

use crate::domain::{ServiceAccount, UpstreamSession};
use crate::ports::{LmsGateway, PortResult, Store};

/// Hours an LMS token stays valid from the moment it is issued.
const LMS_TOKEN_VALIDITY_HOURS: i64 = 24;

/// Brokers upstream credentials for callers identified by a session id.
///
/// The credential cache is a last-writer-wins table: concurrent calls for the
/// same session id may each perform the upstream exchange and both upserts
/// will land on the same row. Redundant exchanges are accepted; duplicate
/// rows are not possible.
#[derive(Clone)]
pub struct CredentialBroker {
    store: Arc<dyn Store>,
    lms: Arc<dyn LmsGateway>,
    account: ServiceAccount,
}

impl CredentialBroker {
    pub fn new(store: Arc<dyn Store>, lms: Arc<dyn LmsGateway>, account: ServiceAccount) -> Self {
        Self {
            store,
            lms,
            account,
        }
    }

    /// Returns a valid LMS token for `session_id`, performing the upstream
    /// exchange when the session row is absent, the token is absent, or the
    /// token has expired. Expiry is enforced uniformly on every read.
    pub async fn ensure_lms_token(&self, session_id: &str) -> PortResult<String> {
        let existing = self.store.get_upstream_session(session_id).await?;

        if let Some(session) = &existing {
            if let Some(token) = &session.lms_token {
                let live = session
                    .expires_at
                    .map(|expires_at| Utc::now() <= expires_at)
                    .unwrap_or(false);
                if live {
                    return Ok(token.clone());
                }
            }
        }

        let token = self
            .lms
            .exchange_credential(&self.account.username, &self.account.password)
            .await?;

        let now = Utc::now();
        let session = UpstreamSession {
            session_id: session_id.to_string(),
            lms_token: Some(token.clone()),
            // Re-authentication must not drop an analysis credential the
            // session already holds.
            analysis_token: existing.and_then(|s| s.analysis_token),
            created_at: now,
            expires_at: Some(now + Duration::hours(LMS_TOKEN_VALIDITY_HOURS)),
        };
        self.store.upsert_upstream_session(&session).await?;

        Ok(token)
    }

    /// Returns the cached analysis-service credential, or the empty string
    /// when the session has none. Downstream calls then carry an empty
    /// bearer value and the upstream decides whether to reject it.
    pub async fn analysis_token(&self, session_id: &str) -> PortResult<String> {
        let session = self.store.get_upstream_session(session_id).await?;
        Ok(session
            .and_then(|s| s.analysis_token)
            .unwrap_or_default())
    }

    /// Lists the service account's courses from the LMS, acquiring or
    /// refreshing the session's token first. The LMS response shape is
    /// passed through unmodified.
    pub async fn fetch_courses(&self, session_id: &str) -> PortResult<Value> {
        let token = self.ensure_lms_token(session_id).await?;
        self.lms.list_courses(&token, self.account.user_id).await
    }
}

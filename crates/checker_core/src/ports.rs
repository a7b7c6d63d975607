//! crates/checker_core/src/ports.rs
//!
//! Defines the service contracts (traits) for the application's core logic.
//! These traits form the boundary of the hexagonal architecture, allowing the core
//! to be independent of specific external implementations like databases or APIs.

use async_trait::async_trait;
use serde_json::Value;

use crate::domain::{
    AnalysisRecord, Assignment, CompositionBreakdown, Content, Course, LogEntry, NewSubmission,
    Submission, UpstreamSession, User, UserCredentials,
};
use chrono::{DateTime, Utc};

//=========================================================================================
// Generic Port Error and Result Types
//=========================================================================================

/// A generic error type for all port operations.
/// This abstracts away the specific errors from external services (e.g., database, network).
#[derive(Debug, thiserror::Error)]
pub enum PortError {
    /// A request is missing a required field or carries an unusable value.
    #[error("validation error: {0}")]
    Validation(String),

    /// The upstream credential exchange did not yield a token.
    #[error("authentication failed: {0}")]
    Authentication(String),

    /// An upstream HTTP call failed. `status` is 0 when no response was
    /// received (transport failure); otherwise it is the HTTP status code.
    #[error("upstream request failed (status {status}): {body}")]
    Gateway { status: u16, body: String },

    #[error("item not found: {0}")]
    NotFound(String),

    /// A local bearer token was missing or rejected.
    #[error("unauthorized")]
    Unauthorized,

    #[error("an unexpected error occurred: {0}")]
    Unexpected(String),
}

/// A convenience type alias for `Result<T, PortError>`.
pub type PortResult<T> = Result<T, PortError>;

//=========================================================================================
// Service Ports (Traits)
//=========================================================================================

/// Parameterized read/write/list operations against the relational store.
/// No business logic lives behind this trait.
#[async_trait]
pub trait Store: Send + Sync {
    // --- Upstream Session Cache ---
    /// Insert-or-overwrite keyed by session id. Last writer wins; this is
    /// the only concurrency control the credential cache has.
    async fn upsert_upstream_session(&self, session: &UpstreamSession) -> PortResult<()>;

    async fn get_upstream_session(&self, session_id: &str) -> PortResult<Option<UpstreamSession>>;

    // --- Local Users & Bearer Tokens ---
    async fn create_user(&self, username: &str, password_hash: &str) -> PortResult<User>;

    async fn get_user_by_username(&self, username: &str) -> PortResult<UserCredentials>;

    async fn create_auth_token(
        &self,
        token: &str,
        user_id: i64,
        expires_at: DateTime<Utc>,
    ) -> PortResult<()>;

    /// Resolves a bearer token to its user id, or `Unauthorized`.
    async fn validate_auth_token(&self, token: &str) -> PortResult<i64>;

    // --- Courses / Assignments ---
    async fn create_course(&self, name: &str) -> PortResult<Course>;

    async fn list_courses(&self) -> PortResult<Vec<Course>>;

    async fn get_course(&self, course_id: i64) -> PortResult<Course>;

    async fn create_assignment(&self, course_id: i64, name: &str) -> PortResult<Assignment>;

    async fn list_assignments(&self, course_id: i64) -> PortResult<Vec<Assignment>>;

    // --- Submissions and Children ---
    /// Writes the submission row and all child rows in one transaction and
    /// returns the generated submission id.
    async fn create_submission(&self, submission: &NewSubmission) -> PortResult<i64>;

    async fn list_submissions(&self, assignment_id: i64) -> PortResult<Vec<Submission>>;

    async fn list_breakdown(&self, submission_id: i64) -> PortResult<Vec<CompositionBreakdown>>;

    async fn list_logs(&self, submission_id: i64) -> PortResult<Vec<LogEntry>>;

    async fn get_content(&self, submission_id: i64) -> PortResult<Option<Content>>;

    // --- Forwarded Analysis Results ---
    async fn save_analysis_record(&self, record: &AnalysisRecord) -> PortResult<()>;

    async fn get_analysis_record(&self, submission_id: &str)
        -> PortResult<Option<AnalysisRecord>>;
}

/// Stateless request/response functions against the upstream LMS.
#[async_trait]
pub trait LmsGateway: Send + Sync {
    /// Exchanges the fixed service credential for a bearer token.
    /// Fails with `Authentication` if the response carries no token.
    async fn exchange_credential(&self, username: &str, password: &str) -> PortResult<String>;

    /// Lists the courses visible to `user_id`. The response shape is the
    /// LMS's own; it is returned unmodified.
    async fn list_courses(&self, token: &str, user_id: i64) -> PortResult<Value>;
}

/// Stateless request/response functions against the content analysis service.
#[async_trait]
pub trait AnalysisGateway: Send + Sync {
    /// Forwards a submission; returns the raw JSON response, including
    /// whatever submission identifier the analysis service assigned.
    async fn submit_content(&self, token: &str, payload: &Value) -> PortResult<Value>;

    /// Fetches an analysis result by upstream submission id.
    async fn fetch_result(&self, token: &str, submission_id: &str) -> PortResult<Value>;
}

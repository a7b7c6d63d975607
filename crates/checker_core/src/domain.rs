//! crates/checker_core/src/domain.rs
//!
//! Defines the pure, core data structures for the application.
//! These structs are independent of any database or serialization format,
//! except for the nested view documents which carry their wire casing.

use chrono::{DateTime, Utc};
use serde::Serialize;

/// A caller's cached upstream credentials, keyed by an opaque session id.
///
/// Distinct from the local auth token: this row holds the bearer tokens the
/// service acquired on the caller's behalf from the two upstream services.
#[derive(Debug, Clone)]
pub struct UpstreamSession {
    pub session_id: String,
    pub lms_token: Option<String>,
    pub analysis_token: Option<String>,
    pub created_at: DateTime<Utc>,
    pub expires_at: Option<DateTime<Utc>>,
}

/// The fixed service account used for the upstream LMS token exchange.
#[derive(Debug, Clone)]
pub struct ServiceAccount {
    pub username: String,
    pub password: String,
    /// The numeric LMS user the course listing is scoped to.
    pub user_id: i64,
}

// Represents a local API user - used throughout the auth flow
#[derive(Debug, Clone)]
pub struct User {
    pub id: i64,
    pub username: String,
}

// Only used internally for login - contains sensitive data
#[derive(Debug, Clone)]
pub struct UserCredentials {
    pub id: i64,
    pub username: String,
    pub password_hash: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct Course {
    pub id: i64,
    pub name: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct Assignment {
    pub id: i64,
    pub course_id: i64,
    pub name: String,
}

/// A locally recorded submission row. The complementary "student written"
/// percentage is never stored; it is derived from `ai_generated` at
/// presentation time so the two can not drift apart.
#[derive(Debug, Clone, Serialize)]
pub struct Submission {
    pub id: i64,
    pub assignment_id: i64,
    pub student_written: Option<String>,
    /// Fraction of the content assessed as AI generated, in `[0, 1]`.
    pub ai_generated: Option<f64>,
    pub ai_use_assessment: Option<String>,
    pub assessment: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CompositionBreakdown {
    pub id: i64,
    pub submission_id: i64,
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub section: Option<String>,
    pub confidence: Option<String>,
    pub details: Option<String>,
    pub word_count: Option<i64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct LogEntry {
    pub id: i64,
    pub submission_id: i64,
    pub timestamp: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub content: Option<String>,
    pub matched: bool,
    pub similarity: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Content {
    pub submission_id: i64,
    pub title: Option<String>,
    pub body: Option<String>,
}

/// A forwarded submission as persisted after a successful analysis call.
/// `results` is the upstream's raw response, kept verbatim for exact replay.
#[derive(Debug, Clone)]
pub struct AnalysisRecord {
    pub submission_id: String,
    pub course_id: Option<String>,
    pub assignment_id: Option<String>,
    pub title: Option<String>,
    pub content: Option<String>,
    pub results: serde_json::Value,
}

/// The payload a caller hands to the submission pipeline. Required fields
/// are optional here so validation can reject them with a proper error
/// instead of failing at the request boundary.
#[derive(Debug, Clone)]
pub struct SubmissionDraft {
    pub title: Option<String>,
    pub content_type: Option<String>,
    pub content: Option<String>,
    pub assignment_id: Option<String>,
    pub course_id: Option<String>,
}

/// A new submission row plus its child rows, written in one transaction.
#[derive(Debug, Clone, Default)]
pub struct NewSubmission {
    pub assignment_id: i64,
    pub student_written: Option<String>,
    pub ai_generated: Option<f64>,
    pub ai_use_assessment: Option<String>,
    pub assessment: Option<String>,
    pub composition_breakdown: Vec<NewBreakdown>,
    pub logs: Vec<NewLogEntry>,
    pub content: Option<NewContent>,
}

#[derive(Debug, Clone)]
pub struct NewBreakdown {
    pub kind: Option<String>,
    pub section: Option<String>,
    pub confidence: Option<String>,
    pub details: Option<String>,
    pub word_count: Option<i64>,
}

#[derive(Debug, Clone)]
pub struct NewLogEntry {
    pub timestamp: Option<String>,
    pub kind: Option<String>,
    pub content: Option<String>,
    pub matched: bool,
    pub similarity: Option<String>,
}

#[derive(Debug, Clone)]
pub struct NewContent {
    pub title: Option<String>,
    pub body: Option<String>,
}

//=========================================================================================
// Nested View Documents
//=========================================================================================

/// The id-keyed nested course document returned by the full-course read.
#[derive(Debug, Clone, Serialize)]
pub struct CourseFull {
    pub id: i64,
    pub name: String,
    pub assignments: Vec<AssignmentDetail>,
}

#[derive(Debug, Clone, Serialize)]
pub struct AssignmentDetail {
    #[serde(flatten)]
    pub assignment: Assignment,
    pub submissions: Vec<SubmissionDetail>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SubmissionDetail {
    #[serde(flatten)]
    pub submission: Submission,
    #[serde(rename = "compositionBreakdown")]
    pub composition_breakdown: Vec<CompositionBreakdown>,
    pub logs: Vec<LogEntry>,
    pub content: Option<Content>,
}

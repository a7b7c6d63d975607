//! Shared test doubles for the core integration tests: an in-memory `Store`
//! and scripted gateways that count their upstream calls.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::{json, Value};

use checker_core::domain::{
    AnalysisRecord, Assignment, CompositionBreakdown, Content, Course, LogEntry, NewSubmission,
    Submission, UpstreamSession, User, UserCredentials,
};
use checker_core::ports::{AnalysisGateway, LmsGateway, PortError, PortResult, Store};

//=========================================================================================
// In-Memory Store
//=========================================================================================

#[derive(Default)]
struct Tables {
    sessions: HashMap<String, UpstreamSession>,
    users: Vec<UserCredentials>,
    tokens: HashMap<String, (i64, DateTime<Utc>)>,
    courses: Vec<Course>,
    assignments: Vec<Assignment>,
    submissions: Vec<Submission>,
    breakdowns: Vec<CompositionBreakdown>,
    logs: Vec<LogEntry>,
    contents: Vec<Content>,
    analysis_records: HashMap<String, AnalysisRecord>,
    next_id: i64,
}

impl Tables {
    fn next_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }
}

/// A `Store` over plain vectors and maps, close enough to the SQLite
/// adapter's semantics (auto-increment ids, upsert by primary key) for the
/// broker, pipeline and aggregator tests.
#[derive(Default)]
pub struct InMemoryStore {
    tables: Mutex<Tables>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn session_count(&self) -> usize {
        self.tables.lock().unwrap().sessions.len()
    }

    pub fn session(&self, session_id: &str) -> Option<UpstreamSession> {
        self.tables.lock().unwrap().sessions.get(session_id).cloned()
    }

    /// Seeds a session row directly, bypassing the broker.
    pub fn put_session(&self, session: UpstreamSession) {
        let mut tables = self.tables.lock().unwrap();
        tables.sessions.insert(session.session_id.clone(), session);
    }

    pub fn analysis_record_count(&self) -> usize {
        self.tables.lock().unwrap().analysis_records.len()
    }
}

#[async_trait]
impl Store for InMemoryStore {
    async fn upsert_upstream_session(&self, session: &UpstreamSession) -> PortResult<()> {
        let mut tables = self.tables.lock().unwrap();
        tables
            .sessions
            .insert(session.session_id.clone(), session.clone());
        Ok(())
    }

    async fn get_upstream_session(&self, session_id: &str) -> PortResult<Option<UpstreamSession>> {
        Ok(self.tables.lock().unwrap().sessions.get(session_id).cloned())
    }

    async fn create_user(&self, username: &str, password_hash: &str) -> PortResult<User> {
        let mut tables = self.tables.lock().unwrap();
        let id = tables.next_id();
        tables.users.push(UserCredentials {
            id,
            username: username.to_string(),
            password_hash: password_hash.to_string(),
        });
        Ok(User {
            id,
            username: username.to_string(),
        })
    }

    async fn get_user_by_username(&self, username: &str) -> PortResult<UserCredentials> {
        self.tables
            .lock()
            .unwrap()
            .users
            .iter()
            .find(|u| u.username == username)
            .cloned()
            .ok_or_else(|| PortError::NotFound(format!("user {username}")))
    }

    async fn create_auth_token(
        &self,
        token: &str,
        user_id: i64,
        expires_at: DateTime<Utc>,
    ) -> PortResult<()> {
        let mut tables = self.tables.lock().unwrap();
        tables.tokens.insert(token.to_string(), (user_id, expires_at));
        Ok(())
    }

    async fn validate_auth_token(&self, token: &str) -> PortResult<i64> {
        let tables = self.tables.lock().unwrap();
        match tables.tokens.get(token) {
            Some((user_id, expires_at)) if Utc::now() <= *expires_at => Ok(*user_id),
            _ => Err(PortError::Unauthorized),
        }
    }

    async fn create_course(&self, name: &str) -> PortResult<Course> {
        let mut tables = self.tables.lock().unwrap();
        let id = tables.next_id();
        let course = Course {
            id,
            name: name.to_string(),
        };
        tables.courses.push(course.clone());
        Ok(course)
    }

    async fn list_courses(&self) -> PortResult<Vec<Course>> {
        Ok(self.tables.lock().unwrap().courses.clone())
    }

    async fn get_course(&self, course_id: i64) -> PortResult<Course> {
        self.tables
            .lock()
            .unwrap()
            .courses
            .iter()
            .find(|c| c.id == course_id)
            .cloned()
            .ok_or_else(|| PortError::NotFound(format!("course {course_id}")))
    }

    async fn create_assignment(&self, course_id: i64, name: &str) -> PortResult<Assignment> {
        let mut tables = self.tables.lock().unwrap();
        let id = tables.next_id();
        let assignment = Assignment {
            id,
            course_id,
            name: name.to_string(),
        };
        tables.assignments.push(assignment.clone());
        Ok(assignment)
    }

    async fn list_assignments(&self, course_id: i64) -> PortResult<Vec<Assignment>> {
        Ok(self
            .tables
            .lock()
            .unwrap()
            .assignments
            .iter()
            .filter(|a| a.course_id == course_id)
            .cloned()
            .collect())
    }

    async fn create_submission(&self, submission: &NewSubmission) -> PortResult<i64> {
        let mut tables = self.tables.lock().unwrap();
        let id = tables.next_id();
        tables.submissions.push(Submission {
            id,
            assignment_id: submission.assignment_id,
            student_written: submission.student_written.clone(),
            ai_generated: submission.ai_generated,
            ai_use_assessment: submission.ai_use_assessment.clone(),
            assessment: submission.assessment.clone(),
        });
        for cb in &submission.composition_breakdown {
            let row_id = tables.next_id();
            tables.breakdowns.push(CompositionBreakdown {
                id: row_id,
                submission_id: id,
                kind: cb.kind.clone(),
                section: cb.section.clone(),
                confidence: cb.confidence.clone(),
                details: cb.details.clone(),
                word_count: cb.word_count,
            });
        }
        for log in &submission.logs {
            let row_id = tables.next_id();
            tables.logs.push(LogEntry {
                id: row_id,
                submission_id: id,
                timestamp: log.timestamp.clone(),
                kind: log.kind.clone(),
                content: log.content.clone(),
                matched: log.matched,
                similarity: log.similarity.clone(),
            });
        }
        if let Some(content) = &submission.content {
            tables.contents.push(Content {
                submission_id: id,
                title: content.title.clone(),
                body: content.body.clone(),
            });
        }
        Ok(id)
    }

    async fn list_submissions(&self, assignment_id: i64) -> PortResult<Vec<Submission>> {
        Ok(self
            .tables
            .lock()
            .unwrap()
            .submissions
            .iter()
            .filter(|s| s.assignment_id == assignment_id)
            .cloned()
            .collect())
    }

    async fn list_breakdown(&self, submission_id: i64) -> PortResult<Vec<CompositionBreakdown>> {
        Ok(self
            .tables
            .lock()
            .unwrap()
            .breakdowns
            .iter()
            .filter(|b| b.submission_id == submission_id)
            .cloned()
            .collect())
    }

    async fn list_logs(&self, submission_id: i64) -> PortResult<Vec<LogEntry>> {
        Ok(self
            .tables
            .lock()
            .unwrap()
            .logs
            .iter()
            .filter(|l| l.submission_id == submission_id)
            .cloned()
            .collect())
    }

    async fn get_content(&self, submission_id: i64) -> PortResult<Option<Content>> {
        Ok(self
            .tables
            .lock()
            .unwrap()
            .contents
            .iter()
            .find(|c| c.submission_id == submission_id)
            .cloned())
    }

    async fn save_analysis_record(&self, record: &AnalysisRecord) -> PortResult<()> {
        let mut tables = self.tables.lock().unwrap();
        tables
            .analysis_records
            .insert(record.submission_id.clone(), record.clone());
        Ok(())
    }

    async fn get_analysis_record(
        &self,
        submission_id: &str,
    ) -> PortResult<Option<AnalysisRecord>> {
        Ok(self
            .tables
            .lock()
            .unwrap()
            .analysis_records
            .get(submission_id)
            .cloned())
    }
}

//=========================================================================================
// Scripted Gateways
//=========================================================================================

/// An `LmsGateway` that issues sequentially numbered tokens and counts how
/// many exchanges it has served.
#[derive(Default)]
pub struct ScriptedLms {
    exchanges: AtomicUsize,
}

impl ScriptedLms {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn exchange_count(&self) -> usize {
        self.exchanges.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl LmsGateway for ScriptedLms {
    async fn exchange_credential(&self, _username: &str, _password: &str) -> PortResult<String> {
        let n = self.exchanges.fetch_add(1, Ordering::SeqCst) + 1;
        Ok(format!("lms-token-{n}"))
    }

    async fn list_courses(&self, token: &str, user_id: i64) -> PortResult<Value> {
        Ok(json!([{ "id": 1, "fullname": "Course 1", "token": token, "userid": user_id }]))
    }
}

/// An `AnalysisGateway` returning a fixed response, counting calls and
/// keeping the last submitted payload for inspection.
pub struct ScriptedAnalysis {
    submits: AtomicUsize,
    fetches: AtomicUsize,
    response: Value,
    last_payload: Mutex<Option<Value>>,
}

impl ScriptedAnalysis {
    pub fn new(response: Value) -> Self {
        Self {
            submits: AtomicUsize::new(0),
            fetches: AtomicUsize::new(0),
            response,
            last_payload: Mutex::new(None),
        }
    }

    pub fn submit_count(&self) -> usize {
        self.submits.load(Ordering::SeqCst)
    }

    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }

    pub fn last_payload(&self) -> Option<Value> {
        self.last_payload.lock().unwrap().clone()
    }
}

#[async_trait]
impl AnalysisGateway for ScriptedAnalysis {
    async fn submit_content(&self, _token: &str, payload: &Value) -> PortResult<Value> {
        self.submits.fetch_add(1, Ordering::SeqCst);
        *self.last_payload.lock().unwrap() = Some(payload.clone());
        Ok(self.response.clone())
    }

    async fn fetch_result(&self, _token: &str, _submission_id: &str) -> PortResult<Value> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        Ok(self.response.clone())
    }
}

//! services/api/src/adapters/db.rs
//!
//! This module contains the database adapter, which is the concrete implementation
//! of the `Store` port from the `core` crate. It handles all interactions with the
//! SQLite database using `sqlx`.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use checker_core::domain::{
    AnalysisRecord, Assignment, CompositionBreakdown, Content, Course, LogEntry, NewSubmission,
    Submission, UpstreamSession, User, UserCredentials,
};
use checker_core::ports::{PortError, PortResult, Store};
use sqlx::{FromRow, SqlitePool};

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// A database adapter that implements the `Store` port.
#[derive(Clone)]
pub struct SqliteStore {
    pool: SqlitePool,
}

/// Idempotent table creation, run once at startup.
const SCHEMA: &[&str] = &[
    "CREATE TABLE IF NOT EXISTS upstream_sessions (
        session_id TEXT PRIMARY KEY,
        lms_token TEXT,
        analysis_token TEXT,
        created_at TEXT NOT NULL,
        expires_at TEXT
    )",
    "CREATE TABLE IF NOT EXISTS users (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        username TEXT UNIQUE NOT NULL,
        password_hash TEXT NOT NULL
    )",
    "CREATE TABLE IF NOT EXISTS auth_tokens (
        token TEXT PRIMARY KEY,
        user_id INTEGER NOT NULL,
        expires_at TEXT NOT NULL,
        FOREIGN KEY(user_id) REFERENCES users(id)
    )",
    "CREATE TABLE IF NOT EXISTS courses (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        name TEXT NOT NULL
    )",
    "CREATE TABLE IF NOT EXISTS assignments (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        course_id INTEGER NOT NULL,
        name TEXT NOT NULL,
        FOREIGN KEY(course_id) REFERENCES courses(id)
    )",
    "CREATE TABLE IF NOT EXISTS submissions (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        assignment_id INTEGER NOT NULL,
        student_written TEXT,
        ai_generated REAL,
        ai_use_assessment TEXT,
        assessment TEXT,
        FOREIGN KEY(assignment_id) REFERENCES assignments(id)
    )",
    "CREATE TABLE IF NOT EXISTS composition_breakdown (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        submission_id INTEGER NOT NULL,
        type TEXT,
        section TEXT,
        confidence TEXT,
        details TEXT,
        word_count INTEGER,
        FOREIGN KEY(submission_id) REFERENCES submissions(id)
    )",
    "CREATE TABLE IF NOT EXISTS logs (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        submission_id INTEGER NOT NULL,
        timestamp TEXT,
        type TEXT,
        content TEXT,
        matched BOOLEAN NOT NULL DEFAULT 0,
        similarity TEXT,
        FOREIGN KEY(submission_id) REFERENCES submissions(id)
    )",
    "CREATE TABLE IF NOT EXISTS contents (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        submission_id INTEGER NOT NULL,
        title TEXT,
        body TEXT,
        FOREIGN KEY(submission_id) REFERENCES submissions(id)
    )",
    "CREATE TABLE IF NOT EXISTS analysis_records (
        submission_id TEXT PRIMARY KEY,
        course_id TEXT,
        assignment_id TEXT,
        title TEXT,
        content TEXT,
        results TEXT NOT NULL
    )",
];

impl SqliteStore {
    /// Creates a new `SqliteStore`.
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// A helper function to create the schema at startup. Safe to run on
    /// every start.
    pub async fn init_schema(&self) -> Result<(), sqlx::Error> {
        for statement in SCHEMA {
            sqlx::query(statement).execute(&self.pool).await?;
        }
        Ok(())
    }
}

fn unexpected(e: sqlx::Error) -> PortError {
    PortError::Unexpected(e.to_string())
}

//=========================================================================================
// "Impure" Database Record Structs
//=========================================================================================

#[derive(FromRow)]
struct SessionRecord {
    session_id: String,
    lms_token: Option<String>,
    analysis_token: Option<String>,
    created_at: DateTime<Utc>,
    expires_at: Option<DateTime<Utc>>,
}
impl SessionRecord {
    fn to_domain(self) -> UpstreamSession {
        UpstreamSession {
            session_id: self.session_id,
            lms_token: self.lms_token,
            analysis_token: self.analysis_token,
            created_at: self.created_at,
            expires_at: self.expires_at,
        }
    }
}

#[derive(FromRow)]
struct UserRecord {
    id: i64,
    username: String,
    password_hash: String,
}
impl UserRecord {
    fn to_domain(self) -> UserCredentials {
        UserCredentials {
            id: self.id,
            username: self.username,
            password_hash: self.password_hash,
        }
    }
}

#[derive(FromRow)]
struct CourseRecord {
    id: i64,
    name: String,
}
impl CourseRecord {
    fn to_domain(self) -> Course {
        Course {
            id: self.id,
            name: self.name,
        }
    }
}

#[derive(FromRow)]
struct AssignmentRecord {
    id: i64,
    course_id: i64,
    name: String,
}
impl AssignmentRecord {
    fn to_domain(self) -> Assignment {
        Assignment {
            id: self.id,
            course_id: self.course_id,
            name: self.name,
        }
    }
}

#[derive(FromRow)]
struct SubmissionRecord {
    id: i64,
    assignment_id: i64,
    student_written: Option<String>,
    ai_generated: Option<f64>,
    ai_use_assessment: Option<String>,
    assessment: Option<String>,
}
impl SubmissionRecord {
    fn to_domain(self) -> Submission {
        Submission {
            id: self.id,
            assignment_id: self.assignment_id,
            student_written: self.student_written,
            ai_generated: self.ai_generated,
            ai_use_assessment: self.ai_use_assessment,
            assessment: self.assessment,
        }
    }
}

#[derive(FromRow)]
struct BreakdownRecord {
    id: i64,
    submission_id: i64,
    #[sqlx(rename = "type")]
    kind: Option<String>,
    section: Option<String>,
    confidence: Option<String>,
    details: Option<String>,
    word_count: Option<i64>,
}
impl BreakdownRecord {
    fn to_domain(self) -> CompositionBreakdown {
        CompositionBreakdown {
            id: self.id,
            submission_id: self.submission_id,
            kind: self.kind,
            section: self.section,
            confidence: self.confidence,
            details: self.details,
            word_count: self.word_count,
        }
    }
}

#[derive(FromRow)]
struct LogRecord {
    id: i64,
    submission_id: i64,
    timestamp: Option<String>,
    #[sqlx(rename = "type")]
    kind: Option<String>,
    content: Option<String>,
    matched: bool,
    similarity: Option<String>,
}
impl LogRecord {
    fn to_domain(self) -> LogEntry {
        LogEntry {
            id: self.id,
            submission_id: self.submission_id,
            timestamp: self.timestamp,
            kind: self.kind,
            content: self.content,
            matched: self.matched,
            similarity: self.similarity,
        }
    }
}

#[derive(FromRow)]
struct ContentRecord {
    submission_id: i64,
    title: Option<String>,
    body: Option<String>,
}
impl ContentRecord {
    fn to_domain(self) -> Content {
        Content {
            submission_id: self.submission_id,
            title: self.title,
            body: self.body,
        }
    }
}

#[derive(FromRow)]
struct AnalysisRecordRow {
    submission_id: String,
    course_id: Option<String>,
    assignment_id: Option<String>,
    title: Option<String>,
    content: Option<String>,
    results: String,
}
impl AnalysisRecordRow {
    fn to_domain(self) -> PortResult<AnalysisRecord> {
        let results = serde_json::from_str(&self.results)
            .map_err(|e| PortError::Unexpected(format!("stored analysis blob is corrupt: {e}")))?;
        Ok(AnalysisRecord {
            submission_id: self.submission_id,
            course_id: self.course_id,
            assignment_id: self.assignment_id,
            title: self.title,
            content: self.content,
            results,
        })
    }
}

//=========================================================================================
// `Store` Trait Implementation
//=========================================================================================

#[async_trait]
impl Store for SqliteStore {
    async fn upsert_upstream_session(&self, session: &UpstreamSession) -> PortResult<()> {
        sqlx::query(
            "INSERT INTO upstream_sessions (session_id, lms_token, analysis_token, created_at, expires_at)
             VALUES (?, ?, ?, ?, ?)
             ON CONFLICT(session_id) DO UPDATE SET
                 lms_token = excluded.lms_token,
                 analysis_token = excluded.analysis_token,
                 expires_at = excluded.expires_at",
        )
        .bind(&session.session_id)
        .bind(&session.lms_token)
        .bind(&session.analysis_token)
        .bind(session.created_at)
        .bind(session.expires_at)
        .execute(&self.pool)
        .await
        .map_err(unexpected)?;
        Ok(())
    }

    async fn get_upstream_session(&self, session_id: &str) -> PortResult<Option<UpstreamSession>> {
        let record = sqlx::query_as::<_, SessionRecord>(
            "SELECT session_id, lms_token, analysis_token, created_at, expires_at
             FROM upstream_sessions WHERE session_id = ?",
        )
        .bind(session_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(unexpected)?;
        Ok(record.map(SessionRecord::to_domain))
    }

    async fn create_user(&self, username: &str, password_hash: &str) -> PortResult<User> {
        let result = sqlx::query("INSERT INTO users (username, password_hash) VALUES (?, ?)")
            .bind(username)
            .bind(password_hash)
            .execute(&self.pool)
            .await
            .map_err(|e| match &e {
                sqlx::Error::Database(db) if db.is_unique_violation() => {
                    PortError::Validation(format!("username '{username}' is already taken"))
                }
                _ => unexpected(e),
            })?;
        Ok(User {
            id: result.last_insert_rowid(),
            username: username.to_string(),
        })
    }

    async fn get_user_by_username(&self, username: &str) -> PortResult<UserCredentials> {
        let record = sqlx::query_as::<_, UserRecord>(
            "SELECT id, username, password_hash FROM users WHERE username = ?",
        )
        .bind(username)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::RowNotFound => PortError::NotFound(format!("user {username} not found")),
            _ => unexpected(e),
        })?;
        Ok(record.to_domain())
    }

    async fn create_auth_token(
        &self,
        token: &str,
        user_id: i64,
        expires_at: DateTime<Utc>,
    ) -> PortResult<()> {
        sqlx::query("INSERT INTO auth_tokens (token, user_id, expires_at) VALUES (?, ?, ?)")
            .bind(token)
            .bind(user_id)
            .bind(expires_at)
            .execute(&self.pool)
            .await
            .map_err(unexpected)?;
        Ok(())
    }

    async fn validate_auth_token(&self, token: &str) -> PortResult<i64> {
        let row = sqlx::query_as::<_, (i64, DateTime<Utc>)>(
            "SELECT user_id, expires_at FROM auth_tokens WHERE token = ?",
        )
        .bind(token)
        .fetch_optional(&self.pool)
        .await
        .map_err(unexpected)?;

        match row {
            Some((user_id, expires_at)) if Utc::now() <= expires_at => Ok(user_id),
            _ => Err(PortError::Unauthorized),
        }
    }

    async fn create_course(&self, name: &str) -> PortResult<Course> {
        let result = sqlx::query("INSERT INTO courses (name) VALUES (?)")
            .bind(name)
            .execute(&self.pool)
            .await
            .map_err(unexpected)?;
        Ok(Course {
            id: result.last_insert_rowid(),
            name: name.to_string(),
        })
    }

    async fn list_courses(&self) -> PortResult<Vec<Course>> {
        let records =
            sqlx::query_as::<_, CourseRecord>("SELECT id, name FROM courses ORDER BY id")
                .fetch_all(&self.pool)
                .await
                .map_err(unexpected)?;
        Ok(records.into_iter().map(CourseRecord::to_domain).collect())
    }

    async fn get_course(&self, course_id: i64) -> PortResult<Course> {
        let record =
            sqlx::query_as::<_, CourseRecord>("SELECT id, name FROM courses WHERE id = ?")
                .bind(course_id)
                .fetch_one(&self.pool)
                .await
                .map_err(|e| match e {
                    sqlx::Error::RowNotFound => {
                        PortError::NotFound(format!("course {course_id} not found"))
                    }
                    _ => unexpected(e),
                })?;
        Ok(record.to_domain())
    }

    async fn create_assignment(&self, course_id: i64, name: &str) -> PortResult<Assignment> {
        let result = sqlx::query("INSERT INTO assignments (course_id, name) VALUES (?, ?)")
            .bind(course_id)
            .bind(name)
            .execute(&self.pool)
            .await
            .map_err(unexpected)?;
        Ok(Assignment {
            id: result.last_insert_rowid(),
            course_id,
            name: name.to_string(),
        })
    }

    async fn list_assignments(&self, course_id: i64) -> PortResult<Vec<Assignment>> {
        let records = sqlx::query_as::<_, AssignmentRecord>(
            "SELECT id, course_id, name FROM assignments WHERE course_id = ? ORDER BY id",
        )
        .bind(course_id)
        .fetch_all(&self.pool)
        .await
        .map_err(unexpected)?;
        Ok(records
            .into_iter()
            .map(AssignmentRecord::to_domain)
            .collect())
    }

    async fn create_submission(&self, submission: &NewSubmission) -> PortResult<i64> {
        // The submission row and every child row land in one transaction, so
        // a submission can never exist with only part of its children.
        let mut tx = self.pool.begin().await.map_err(unexpected)?;

        let result = sqlx::query(
            "INSERT INTO submissions (assignment_id, student_written, ai_generated, ai_use_assessment, assessment)
             VALUES (?, ?, ?, ?, ?)",
        )
        .bind(submission.assignment_id)
        .bind(&submission.student_written)
        .bind(submission.ai_generated)
        .bind(&submission.ai_use_assessment)
        .bind(&submission.assessment)
        .execute(&mut *tx)
        .await
        .map_err(unexpected)?;
        let submission_id = result.last_insert_rowid();

        for cb in &submission.composition_breakdown {
            sqlx::query(
                "INSERT INTO composition_breakdown (submission_id, type, section, confidence, details, word_count)
                 VALUES (?, ?, ?, ?, ?, ?)",
            )
            .bind(submission_id)
            .bind(&cb.kind)
            .bind(&cb.section)
            .bind(&cb.confidence)
            .bind(&cb.details)
            .bind(cb.word_count)
            .execute(&mut *tx)
            .await
            .map_err(unexpected)?;
        }

        for log in &submission.logs {
            sqlx::query(
                "INSERT INTO logs (submission_id, timestamp, type, content, matched, similarity)
                 VALUES (?, ?, ?, ?, ?, ?)",
            )
            .bind(submission_id)
            .bind(&log.timestamp)
            .bind(&log.kind)
            .bind(&log.content)
            .bind(log.matched)
            .bind(&log.similarity)
            .execute(&mut *tx)
            .await
            .map_err(unexpected)?;
        }

        if let Some(content) = &submission.content {
            sqlx::query("INSERT INTO contents (submission_id, title, body) VALUES (?, ?, ?)")
                .bind(submission_id)
                .bind(&content.title)
                .bind(&content.body)
                .execute(&mut *tx)
                .await
                .map_err(unexpected)?;
        }

        tx.commit().await.map_err(unexpected)?;
        Ok(submission_id)
    }

    async fn list_submissions(&self, assignment_id: i64) -> PortResult<Vec<Submission>> {
        let records = sqlx::query_as::<_, SubmissionRecord>(
            "SELECT id, assignment_id, student_written, ai_generated, ai_use_assessment, assessment
             FROM submissions WHERE assignment_id = ? ORDER BY id",
        )
        .bind(assignment_id)
        .fetch_all(&self.pool)
        .await
        .map_err(unexpected)?;
        Ok(records
            .into_iter()
            .map(SubmissionRecord::to_domain)
            .collect())
    }

    async fn list_breakdown(&self, submission_id: i64) -> PortResult<Vec<CompositionBreakdown>> {
        let records = sqlx::query_as::<_, BreakdownRecord>(
            "SELECT id, submission_id, type, section, confidence, details, word_count
             FROM composition_breakdown WHERE submission_id = ? ORDER BY id",
        )
        .bind(submission_id)
        .fetch_all(&self.pool)
        .await
        .map_err(unexpected)?;
        Ok(records
            .into_iter()
            .map(BreakdownRecord::to_domain)
            .collect())
    }

    async fn list_logs(&self, submission_id: i64) -> PortResult<Vec<LogEntry>> {
        let records = sqlx::query_as::<_, LogRecord>(
            "SELECT id, submission_id, timestamp, type, content, matched, similarity
             FROM logs WHERE submission_id = ? ORDER BY id",
        )
        .bind(submission_id)
        .fetch_all(&self.pool)
        .await
        .map_err(unexpected)?;
        Ok(records.into_iter().map(LogRecord::to_domain).collect())
    }

    async fn get_content(&self, submission_id: i64) -> PortResult<Option<Content>> {
        let record = sqlx::query_as::<_, ContentRecord>(
            "SELECT submission_id, title, body FROM contents WHERE submission_id = ?",
        )
        .bind(submission_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(unexpected)?;
        Ok(record.map(ContentRecord::to_domain))
    }

    async fn save_analysis_record(&self, record: &AnalysisRecord) -> PortResult<()> {
        let results = serde_json::to_string(&record.results)
            .map_err(|e| PortError::Unexpected(e.to_string()))?;
        sqlx::query(
            "INSERT INTO analysis_records (submission_id, course_id, assignment_id, title, content, results)
             VALUES (?, ?, ?, ?, ?, ?)
             ON CONFLICT(submission_id) DO UPDATE SET results = excluded.results",
        )
        .bind(&record.submission_id)
        .bind(&record.course_id)
        .bind(&record.assignment_id)
        .bind(&record.title)
        .bind(&record.content)
        .bind(results)
        .execute(&self.pool)
        .await
        .map_err(unexpected)?;
        Ok(())
    }

    async fn get_analysis_record(
        &self,
        submission_id: &str,
    ) -> PortResult<Option<AnalysisRecord>> {
        let row = sqlx::query_as::<_, AnalysisRecordRow>(
            "SELECT submission_id, course_id, assignment_id, title, content, results
             FROM analysis_records WHERE submission_id = ?",
        )
        .bind(submission_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(unexpected)?;
        row.map(AnalysisRecordRow::to_domain).transpose()
    }
}

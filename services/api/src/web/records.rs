//! services/api/src/web/records.rs
//!
//! Axum handlers for the locally persisted records: course/assignment/
//! submission CRUD and the two nested read endpoints served by the
//! aggregator.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json},
};
use checker_core::aggregate;
use checker_core::domain::{
    Course, CourseFull, NewBreakdown, NewContent, NewLogEntry, NewSubmission,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use utoipa::ToSchema;

use crate::web::{error_response, state::AppState};

//=========================================================================================
// Request/Response Types
//=========================================================================================

#[derive(Deserialize, ToSchema)]
pub struct CreateCoursePayload {
    pub name: String,
}

#[derive(Deserialize, ToSchema)]
pub struct CreateAssignmentPayload {
    pub course_id: i64,
    pub name: String,
}

/// A submission row plus its child collections, written transactionally.
#[derive(Deserialize, ToSchema)]
pub struct SubmissionPayload {
    pub assignment_id: Option<i64>,
    pub student_written: Option<String>,
    /// AI-generated fraction in `[0, 1]`.
    pub ai_generated: Option<f64>,
    pub ai_use_assessment: Option<String>,
    pub assessment: Option<String>,
    #[serde(rename = "compositionBreakdown", default)]
    pub composition_breakdown: Vec<BreakdownPayload>,
    #[serde(default)]
    pub logs: Vec<LogPayload>,
    pub content: Option<ContentPayload>,
}

#[derive(Deserialize, ToSchema)]
pub struct BreakdownPayload {
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub section: Option<String>,
    pub confidence: Option<String>,
    pub details: Option<String>,
    #[serde(rename = "wordCount")]
    pub word_count: Option<i64>,
}

#[derive(Deserialize, ToSchema)]
pub struct LogPayload {
    pub timestamp: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub content: Option<String>,
    #[serde(default)]
    pub matched: bool,
    pub similarity: Option<String>,
}

#[derive(Deserialize, ToSchema)]
pub struct ContentPayload {
    pub title: Option<String>,
    pub body: Option<String>,
}

#[derive(Serialize, ToSchema)]
pub struct CreatedSubmissionResponse {
    pub id: i64,
}

impl SubmissionPayload {
    fn into_new_submission(self) -> Result<NewSubmission, (StatusCode, String)> {
        let assignment_id = self
            .assignment_id
            .ok_or((StatusCode::BAD_REQUEST, "assignment_id is required".to_string()))?;
        Ok(NewSubmission {
            assignment_id,
            student_written: self.student_written,
            ai_generated: self.ai_generated,
            ai_use_assessment: self.ai_use_assessment,
            assessment: self.assessment,
            composition_breakdown: self
                .composition_breakdown
                .into_iter()
                .map(|cb| NewBreakdown {
                    kind: cb.kind,
                    section: cb.section,
                    confidence: cb.confidence,
                    details: cb.details,
                    word_count: cb.word_count,
                })
                .collect(),
            logs: self
                .logs
                .into_iter()
                .map(|log| NewLogEntry {
                    timestamp: log.timestamp,
                    kind: log.kind,
                    content: log.content,
                    matched: log.matched,
                    similarity: log.similarity,
                })
                .collect(),
            content: self.content.map(|c| NewContent {
                title: c.title,
                body: c.body,
            }),
        })
    }
}

//=========================================================================================
// CRUD Handlers
//=========================================================================================

/// POST /courses - Create a course record
#[utoipa::path(
    post,
    path = "/courses",
    request_body = CreateCoursePayload,
    responses((status = 200, description = "Course created"))
)]
pub async fn create_course_handler(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<CreateCoursePayload>,
) -> Result<Json<Course>, (StatusCode, String)> {
    let course = state
        .store
        .create_course(&payload.name)
        .await
        .map_err(|e| error_response("create course", e))?;
    Ok(Json(course))
}

/// GET /courses - List course records
#[utoipa::path(
    get,
    path = "/courses",
    responses((status = 200, description = "All locally recorded courses"))
)]
pub async fn list_courses_handler(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<Course>>, (StatusCode, String)> {
    let courses = state
        .store
        .list_courses()
        .await
        .map_err(|e| error_response("list courses", e))?;
    Ok(Json(courses))
}

/// POST /assignments - Create an assignment under a course
#[utoipa::path(
    post,
    path = "/assignments",
    request_body = CreateAssignmentPayload,
    responses((status = 200, description = "Assignment created"))
)]
pub async fn create_assignment_handler(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<CreateAssignmentPayload>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let assignment = state
        .store
        .create_assignment(payload.course_id, &payload.name)
        .await
        .map_err(|e| error_response("create assignment", e))?;
    Ok(Json(assignment))
}

/// POST /submissions - Record a submission with its child rows
#[utoipa::path(
    post,
    path = "/submissions",
    request_body = SubmissionPayload,
    responses(
        (status = 200, description = "Submission created", body = CreatedSubmissionResponse),
        (status = 400, description = "assignment_id missing")
    )
)]
pub async fn create_submission_handler(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<SubmissionPayload>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let new_submission = payload.into_new_submission()?;
    let id = state
        .store
        .create_submission(&new_submission)
        .await
        .map_err(|e| error_response("create submission", e))?;
    Ok(Json(CreatedSubmissionResponse { id }))
}

//=========================================================================================
// Nested Read Handlers
//=========================================================================================

/// GET /courses/{id}/full - The id-keyed nested course document
#[utoipa::path(
    get,
    path = "/courses/{id}/full",
    params(("id" = i64, Path, description = "The course id.")),
    responses(
        (status = 200, description = "Nested course document"),
        (status = 404, description = "Course not found")
    )
)]
pub async fn course_full_handler(
    State(state): State<Arc<AppState>>,
    Path(course_id): Path<i64>,
) -> Result<Json<CourseFull>, (StatusCode, String)> {
    let course = aggregate::course_full(state.store.as_ref(), course_id)
        .await
        .map_err(|e| error_response("course full", e))?;
    Ok(Json(course))
}

/// GET /courses/all/nested - The name-keyed display mapping over all courses
#[utoipa::path(
    get,
    path = "/courses/all/nested",
    responses((status = 200, description = "Name-keyed nested mapping"))
)]
pub async fn all_nested_handler(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Value>, (StatusCode, String)> {
    let nested = aggregate::all_nested(state.store.as_ref())
        .await
        .map_err(|e| error_response("all nested", e))?;
    Ok(Json(nested))
}

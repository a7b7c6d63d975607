//! services/api/src/web/rest.rs
//!
//! Contains the Axum handlers for the broker-facing REST endpoints and the
//! master definition for the OpenAPI specification.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Json},
};
use checker_core::domain::SubmissionDraft;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use utoipa::{OpenApi, ToSchema};
use uuid::Uuid;

use crate::web::{error_response, state::AppState};

//=========================================================================================
// OpenAPI Master Definition
//=========================================================================================

#[derive(OpenApi)]
#[openapi(
    paths(
        create_session_handler,
        list_upstream_courses_handler,
        submit_handler,
        results_handler,
        crate::web::auth::register_handler,
        crate::web::auth::login_handler,
        crate::web::records::create_course_handler,
        crate::web::records::list_courses_handler,
        crate::web::records::create_assignment_handler,
        crate::web::records::create_submission_handler,
        crate::web::records::course_full_handler,
        crate::web::records::all_nested_handler,
    ),
    components(
        schemas(
            CreateSessionResponse,
            AssignmentData,
            SubmitRequest,
            crate::web::auth::RegisterRequest,
            crate::web::auth::RegisterResponse,
            crate::web::auth::LoginRequest,
            crate::web::auth::LoginResponse,
            crate::web::records::CreateCoursePayload,
            crate::web::records::CreateAssignmentPayload,
            crate::web::records::SubmissionPayload,
            crate::web::records::CreatedSubmissionResponse,
            crate::web::records::BreakdownPayload,
            crate::web::records::LogPayload,
            crate::web::records::ContentPayload,
        )
    ),
    tags(
        (name = "Content Checker API", description = "Brokered access to the LMS and the content-integrity analysis service.")
    )
)]
pub struct ApiDoc;

//=========================================================================================
// API Response and Payload Structs
//=========================================================================================

/// The response payload sent after successfully creating a session.
#[derive(Serialize, ToSchema)]
pub struct CreateSessionResponse {
    #[serde(rename = "sessionId")]
    session_id: String,
}

/// The assignment data forwarded to the analysis service.
#[derive(Deserialize, ToSchema)]
pub struct AssignmentData {
    pub title: Option<String>,
    #[serde(rename = "type")]
    pub content_type: Option<String>,
    pub content: Option<String>,
    #[serde(rename = "assignmentId")]
    pub assignment_id: Option<String>,
    #[serde(rename = "courseId")]
    pub course_id: Option<String>,
}

impl AssignmentData {
    fn into_draft(self) -> SubmissionDraft {
        SubmissionDraft {
            title: self.title,
            content_type: self.content_type,
            content: self.content,
            assignment_id: self.assignment_id,
            course_id: self.course_id,
        }
    }
}

#[derive(Deserialize, ToSchema)]
pub struct SubmitRequest {
    #[serde(rename = "sessionId")]
    pub session_id: Option<String>,
    #[serde(rename = "assignmentData")]
    pub assignment_data: Option<AssignmentData>,
}

/// The `?sessionId=` query parameter shared by the session-scoped reads.
#[derive(Deserialize)]
pub struct SessionQuery {
    #[serde(rename = "sessionId")]
    pub session_id: Option<String>,
}

impl SessionQuery {
    fn require(self) -> Result<String, (StatusCode, String)> {
        self.session_id
            .filter(|s| !s.is_empty())
            .ok_or((StatusCode::BAD_REQUEST, "Session ID required".to_string()))
    }
}

//=========================================================================================
// REST API Handlers
//=========================================================================================

/// Create a new broker session.
///
/// Assigns a fresh opaque session id and eagerly performs the first LMS
/// authentication so a broken upstream surfaces here rather than on the
/// first data call.
#[utoipa::path(
    post,
    path = "/api/session",
    responses(
        (status = 200, description = "Session created and authenticated", body = CreateSessionResponse),
        (status = 401, description = "Upstream authentication failed")
    )
)]
pub async fn create_session_handler(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let session_id = Uuid::new_v4().to_string();

    state
        .broker
        .ensure_lms_token(&session_id)
        .await
        .map_err(|e| error_response("create session", e))?;

    Ok(Json(CreateSessionResponse { session_id }))
}

/// List the courses visible to the service account on the upstream LMS.
///
/// The LMS response is returned verbatim.
#[utoipa::path(
    get,
    path = "/api/courses",
    params(("sessionId" = String, Query, description = "The broker session id.")),
    responses(
        (status = 200, description = "Raw LMS course listing"),
        (status = 400, description = "Session ID missing"),
        (status = 502, description = "Upstream request failed")
    )
)]
pub async fn list_upstream_courses_handler(
    State(state): State<Arc<AppState>>,
    Query(query): Query<SessionQuery>,
) -> Result<Json<Value>, (StatusCode, String)> {
    let session_id = query.require()?;

    let courses = state
        .broker
        .fetch_courses(&session_id)
        .await
        .map_err(|e| error_response("list upstream courses", e))?;

    Ok(Json(courses))
}

/// Forward a submission to the analysis service.
#[utoipa::path(
    post,
    path = "/api/submit",
    request_body = SubmitRequest,
    responses(
        (status = 200, description = "Raw analysis response"),
        (status = 400, description = "Session ID or assignment data missing"),
        (status = 502, description = "Upstream request failed")
    )
)]
pub async fn submit_handler(
    State(state): State<Arc<AppState>>,
    Json(req): Json<SubmitRequest>,
) -> Result<Json<Value>, (StatusCode, String)> {
    let session_id = req.session_id.filter(|s| !s.is_empty()).ok_or((
        StatusCode::BAD_REQUEST,
        "Session ID and assignment data required".to_string(),
    ))?;
    let assignment_data = req.assignment_data.ok_or((
        StatusCode::BAD_REQUEST,
        "Session ID and assignment data required".to_string(),
    ))?;

    let result = state
        .pipeline
        .submit(&session_id, &assignment_data.into_draft())
        .await
        .map_err(|e| error_response("submit", e))?;

    Ok(Json(result))
}

/// Fetch an analysis result, serving the locally persisted copy when one
/// exists.
#[utoipa::path(
    get,
    path = "/api/results/{submissionId}",
    params(
        ("submissionId" = String, Path, description = "The upstream-assigned submission id."),
        ("sessionId" = String, Query, description = "The broker session id.")
    ),
    responses(
        (status = 200, description = "Raw analysis result"),
        (status = 400, description = "Session ID missing"),
        (status = 502, description = "Upstream request failed")
    )
)]
pub async fn results_handler(
    State(state): State<Arc<AppState>>,
    Path(submission_id): Path<String>,
    Query(query): Query<SessionQuery>,
) -> Result<Json<Value>, (StatusCode, String)> {
    let session_id = query.require()?;

    let results = state
        .pipeline
        .results(&session_id, &submission_id)
        .await
        .map_err(|e| error_response("fetch results", e))?;

    Ok(Json(results))
}

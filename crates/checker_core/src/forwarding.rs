//! crates/checker_core/src/forwarding.rs
//!
//! Submission ingestion: forwards a draft to the analysis service with the
//! broker's credential and persists the raw result for later replay.

use std::sync::Arc;

use serde_json::{json, Value};

use crate::broker::CredentialBroker;
use crate::domain::{AnalysisRecord, SubmissionDraft};
use crate::ports::{AnalysisGateway, PortError, PortResult, Store};

/// Forwards submissions to the analysis upstream and serves results back,
/// cache-first, from the store.
#[derive(Clone)]
pub struct SubmissionPipeline {
    store: Arc<dyn Store>,
    analysis: Arc<dyn AnalysisGateway>,
    broker: CredentialBroker,
}

impl SubmissionPipeline {
    pub fn new(
        store: Arc<dyn Store>,
        analysis: Arc<dyn AnalysisGateway>,
        broker: CredentialBroker,
    ) -> Self {
        Self {
            store,
            analysis,
            broker,
        }
    }

    /// Forwards `draft` to the analysis service and, on success, persists the
    /// raw response keyed by the submission id the upstream assigned.
    ///
    /// Validation failures and upstream failures both leave the store
    /// untouched; the local record exists only if the upstream call
    /// succeeded.
    pub async fn submit(&self, session_id: &str, draft: &SubmissionDraft) -> PortResult<Value> {
        let title = required(&draft.title, "title")?;
        let content_type = required(&draft.content_type, "type")?;
        let content = required(&draft.content, "content")?;
        let assignment_id = required(&draft.assignment_id, "assignmentId")?;
        let course_id = required(&draft.course_id, "courseId")?;

        let token = self.broker.analysis_token(session_id).await?;
        // The analysis intake schema names the Moodle ids explicitly.
        let payload = json!({
            "title": title,
            "content_type": content_type,
            "content": content,
            "moodle_assignment_id": assignment_id,
            "moodle_course_id": course_id,
        });
        let result = self.analysis.submit_content(&token, &payload).await?;

        let upstream_id = result
            .get("submissionId")
            .and_then(Value::as_str)
            .ok_or_else(|| {
                PortError::Unexpected("analysis response carried no submissionId".to_string())
            })?;

        let record = AnalysisRecord {
            submission_id: upstream_id.to_string(),
            course_id: Some(course_id.to_string()),
            assignment_id: Some(assignment_id.to_string()),
            title: Some(title.to_string()),
            content: Some(content.to_string()),
            results: result.clone(),
        };
        self.store.save_analysis_record(&record).await?;

        Ok(result)
    }

    /// Returns the analysis result for `submission_id`.
    ///
    /// The persisted blob is authoritative once written: if a local record
    /// exists it is replayed verbatim with no upstream call. Only a miss
    /// falls through to a single gateway fetch, using whatever analysis
    /// credential the session holds (possibly empty).
    pub async fn results(&self, session_id: &str, submission_id: &str) -> PortResult<Value> {
        if let Some(record) = self.store.get_analysis_record(submission_id).await? {
            return Ok(record.results);
        }

        let token = self.broker.analysis_token(session_id).await?;
        self.analysis.fetch_result(&token, submission_id).await
    }
}

fn required<'a>(field: &'a Option<String>, name: &str) -> PortResult<&'a str> {
    match field.as_deref() {
        Some(value) if !value.is_empty() => Ok(value),
        _ => Err(PortError::Validation(format!("{name} is required"))),
    }
}

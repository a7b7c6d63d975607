//! crates/checker_core/src/aggregate.rs
//!
//! The hierarchical result aggregator: reconstructs nested course documents
//! from the flat relational rows. Two shapes are produced from the same
//! tables - an id-keyed document for the full-course read and a name-keyed
//! display mapping for the all-courses read.
//!
//! Storage reads and the row-to-presentation transformation are kept
//! separate: `present_submission` is a pure function over already-fetched
//! rows so the display rules can be tested without a store.

use futures::try_join;
use serde_json::{json, Map, Value};

use crate::domain::{
    AssignmentDetail, CompositionBreakdown, Content, CourseFull, LogEntry, Submission,
    SubmissionDetail,
};
use crate::ports::{PortResult, Store};

/// Builds the id-keyed nested document for one course.
///
/// Fails with `NotFound` only when the course itself does not exist. Every
/// lower level tolerates zero rows: an assignment without submissions gets an
/// empty list, a submission without children gets empty lists and a null
/// content.
pub async fn course_full(store: &dyn Store, course_id: i64) -> PortResult<CourseFull> {
    let course = store.get_course(course_id).await?;
    let assignments = store.list_assignments(course_id).await?;

    let mut details = Vec::with_capacity(assignments.len());
    for assignment in assignments {
        let submissions = store.list_submissions(assignment.id).await?;

        let mut submission_details = Vec::with_capacity(submissions.len());
        for submission in submissions {
            let (composition_breakdown, logs, content) =
                fetch_children(store, submission.id).await?;
            submission_details.push(SubmissionDetail {
                submission,
                composition_breakdown,
                logs,
                content,
            });
        }

        details.push(AssignmentDetail {
            assignment,
            submissions: submission_details,
        });
    }

    Ok(CourseFull {
        id: course.id,
        name: course.name,
        assignments: details,
    })
}

/// Builds the name-keyed display mapping over every course:
/// course name -> assignment name -> "Submission {id}" -> presentation
/// object. Empty at any level yields an empty object, never an error.
pub async fn all_nested(store: &dyn Store) -> PortResult<Value> {
    let mut by_course = Map::new();

    for course in store.list_courses().await? {
        let mut by_assignment = Map::new();

        for assignment in store.list_assignments(course.id).await? {
            let mut by_submission = Map::new();

            for submission in store.list_submissions(assignment.id).await? {
                let (breakdown, logs, content) = fetch_children(store, submission.id).await?;
                by_submission.insert(
                    format!("Submission {}", submission.id),
                    present_submission(&submission, &breakdown, &logs, content.as_ref()),
                );
            }

            by_assignment.insert(assignment.name, Value::Object(by_submission));
        }

        by_course.insert(course.name, Value::Object(by_assignment));
    }

    Ok(Value::Object(by_course))
}

/// The three child collections of one submission are independent and
/// read-only, so they are fetched concurrently.
async fn fetch_children(
    store: &dyn Store,
    submission_id: i64,
) -> PortResult<(Vec<CompositionBreakdown>, Vec<LogEntry>, Option<Content>)> {
    try_join!(
        store.list_breakdown(submission_id),
        store.list_logs(submission_id),
        store.get_content(submission_id),
    )
}

/// Pure transformation from one submission's rows to its display object.
///
/// A missing AI score counts as 0 before the arithmetic, so an unscored
/// submission renders as 100% student written. The two percentages are
/// rounded independently (half away from zero); for scores like 0.005 they
/// deliberately do not sum to 100%.
pub fn present_submission(
    submission: &Submission,
    breakdown: &[CompositionBreakdown],
    logs: &[LogEntry],
    content: Option<&Content>,
) -> Value {
    let score = submission.ai_generated.unwrap_or(0.0);

    json!({
        "compositionBreakdown": breakdown
            .iter()
            .map(|cb| {
                json!({
                    "type": cb.kind,
                    "section": cb.section,
                    "confidence": cb.confidence,
                    "details": cb.details,
                    "wordCount": cb.word_count,
                })
            })
            .collect::<Vec<_>>(),
        "Student written": format!("{}%", ((1.0 - score) * 100.0).round() as i64),
        "AI generated": format!("{}%", (score * 100.0).round() as i64),
        "AI Use Assessment": submission.ai_use_assessment,
        "logs": logs
            .iter()
            .map(|log| {
                json!({
                    "timestamp": log.timestamp,
                    "type": log.kind,
                    "content": log.content,
                    "matched": log.matched,
                    "similarity": log.similarity,
                })
            })
            .collect::<Vec<_>>(),
        "Assessment": submission.assessment,
        "content": {
            "title": content.and_then(|c| c.title.clone()).unwrap_or_default(),
            "body": content.and_then(|c| c.body.clone()).unwrap_or_default(),
        },
    })
}

pub mod aggregate;
pub mod broker;
pub mod domain;
pub mod forwarding;
pub mod ports;

pub use broker::CredentialBroker;
pub use domain::{
    AnalysisRecord, Assignment, CompositionBreakdown, Content, Course, CourseFull, LogEntry,
    NewSubmission, ServiceAccount, Submission, SubmissionDraft, UpstreamSession, User,
    UserCredentials,
};
pub use forwarding::SubmissionPipeline;
pub use ports::{AnalysisGateway, LmsGateway, PortError, PortResult, Store};

pub mod analysis;
pub mod db;
mod http;
pub mod lms;

pub use analysis::AnalysisHttpGateway;
pub use db::SqliteStore;
pub use lms::LmsHttpGateway;

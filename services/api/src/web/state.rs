//! services/api/src/web/state.rs
//!
//! Defines the application's shared state.

use crate::config::Config;
use checker_core::broker::CredentialBroker;
use checker_core::forwarding::SubmissionPipeline;
use checker_core::ports::Store;
use std::sync::Arc;

/// The shared application state, created once at startup and passed to all handlers.
///
/// The broker and pipeline are injected here rather than living as ambient
/// module state; every handler reaches credentials through them.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn Store>,
    pub broker: CredentialBroker,
    pub pipeline: SubmissionPipeline,
    pub config: Arc<Config>,
}

//! services/api/src/adapters/analysis.rs
//!
//! This module contains the adapter for the content-integrity analysis
//! service. It implements the `AnalysisGateway` port from the `core` crate.

use async_trait::async_trait;
use checker_core::ports::{AnalysisGateway, PortResult};
use serde_json::Value;

use super::http::{read_json, transport_error};

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// An adapter that implements the `AnalysisGateway` port over the analysis
/// service's JSON API.
#[derive(Clone)]
pub struct AnalysisHttpGateway {
    client: reqwest::Client,
    base_url: String,
}

impl AnalysisHttpGateway {
    /// Creates a new `AnalysisHttpGateway`.
    pub fn new(client: reqwest::Client, base_url: String) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }
}

//=========================================================================================
// `AnalysisGateway` Trait Implementation
//=========================================================================================

#[async_trait]
impl AnalysisGateway for AnalysisHttpGateway {
    async fn submit_content(&self, token: &str, payload: &Value) -> PortResult<Value> {
        // An empty token is sent as an empty bearer value; the upstream
        // decides whether to reject it.
        let response = self
            .client
            .post(format!("{}/content/submit", self.base_url))
            .bearer_auth(token)
            .json(payload)
            .send()
            .await
            .map_err(transport_error)?;

        read_json(response).await
    }

    async fn fetch_result(&self, token: &str, submission_id: &str) -> PortResult<Value> {
        let response = self
            .client
            .get(format!(
                "{}/analysis/results/{submission_id}",
                self.base_url
            ))
            .bearer_auth(token)
            .send()
            .await
            .map_err(transport_error)?;

        read_json(response).await
    }
}

//! services/api/src/adapters/lms.rs
//!
//! This module contains the adapter for the upstream learning-management
//! service. It implements the `LmsGateway` port from the `core` crate: a
//! form-encoded token exchange and form-encoded RPC calls identified by a
//! function-name parameter.

use async_trait::async_trait;
use checker_core::ports::{LmsGateway, PortError, PortResult};
use serde_json::Value;

use super::http::{read_json, transport_error};

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// An adapter that implements the `LmsGateway` port over the LMS's HTTP API.
#[derive(Clone)]
pub struct LmsHttpGateway {
    client: reqwest::Client,
    base_url: String,
    /// The LMS-side service name the token exchange is scoped to.
    service: String,
}

impl LmsHttpGateway {
    /// Creates a new `LmsHttpGateway`.
    pub fn new(client: reqwest::Client, base_url: String, service: String) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            service,
        }
    }
}

//=========================================================================================
// `LmsGateway` Trait Implementation
//=========================================================================================

#[async_trait]
impl LmsGateway for LmsHttpGateway {
    async fn exchange_credential(&self, username: &str, password: &str) -> PortResult<String> {
        let response = self
            .client
            .post(format!("{}/login/token.php", self.base_url))
            .form(&[
                ("username", username),
                ("password", password),
                ("service", &self.service),
            ])
            .send()
            .await
            .map_err(transport_error)?;

        let body = read_json(response).await?;

        // A failed exchange still returns 200 with an error document, so the
        // presence of the token field is the only success signal.
        body.get("token")
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| {
                PortError::Authentication("LMS token exchange returned no token".to_string())
            })
    }

    async fn list_courses(&self, token: &str, user_id: i64) -> PortResult<Value> {
        let user_id = user_id.to_string();
        let response = self
            .client
            .post(format!("{}/webservice/rest/server.php", self.base_url))
            .form(&[
                ("wstoken", token),
                ("wsfunction", "core_enrol_get_users_courses"),
                ("moodlewsrestformat", "json"),
                ("userid", &user_id),
            ])
            .send()
            .await
            .map_err(transport_error)?;

        // The LMS response shape is not interpreted here.
        read_json(response).await
    }
}

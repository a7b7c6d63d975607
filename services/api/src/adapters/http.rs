//! services/api/src/adapters/http.rs
//!
//! Shared response handling for the two upstream HTTP adapters.

use checker_core::ports::{PortError, PortResult};
use serde_json::Value;

/// Maps a transport-level failure (connect, DNS, body read) to the gateway
/// error. Status 0 marks "no response received".
pub(crate) fn transport_error(e: reqwest::Error) -> PortError {
    PortError::Gateway {
        status: e.status().map(|s| s.as_u16()).unwrap_or(0),
        body: e.to_string(),
    }
}

/// Checks the status and decodes the body as JSON. Non-success responses
/// surface the status and raw body; no retry is attempted.
pub(crate) async fn read_json(response: reqwest::Response) -> PortResult<Value> {
    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(PortError::Gateway {
            status: status.as_u16(),
            body,
        });
    }
    response.json::<Value>().await.map_err(transport_error)
}

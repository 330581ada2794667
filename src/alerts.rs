//! Client for the remote sensor alerts API.
//!
//! The list endpoint is polled on a fixed interval and returns one raw
//! record per device. A per-device endpoint exists on some deployments;
//! when it is missing (404) the client falls back to filtering the list
//! result.

use crate::reading::RawReading;
use serde::Deserialize;

/// Alerts client error types.
#[derive(Debug)]
pub enum AlertsError {
    /// Network/HTTP error
    Network(String),
    /// Server returned an error response
    Server { status: u16, message: String },
    /// Malformed response body
    Parse(String),
}

impl std::fmt::Display for AlertsError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AlertsError::Network(msg) => write!(f, "Alerts network error: {msg}"),
            AlertsError::Server { status, message } => {
                write!(f, "Alerts server error ({status}): {message}")
            }
            AlertsError::Parse(msg) => write!(f, "Alerts parse error: {msg}"),
        }
    }
}

impl std::error::Error for AlertsError {}

/// Some deployments wrap the device list in an envelope, others return
/// a bare array.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum AlertsPayload {
    Wrapped { alerts: Vec<RawReading> },
    Bare(Vec<RawReading>),
}

impl AlertsPayload {
    fn into_records(self) -> Vec<RawReading> {
        match self {
            AlertsPayload::Wrapped { alerts } => alerts,
            AlertsPayload::Bare(records) => records,
        }
    }
}

/// HTTP client for the alerts endpoints.
pub struct AlertsClient {
    url: String,
    token: Option<String>,
    client: reqwest::Client,
}

impl AlertsClient {
    pub fn new(url: impl Into<String>, token: Option<String>) -> Self {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(10))
            .build()
            .expect("Failed to create HTTP client");

        Self {
            url: url.into(),
            token,
            client,
        }
    }

    fn device_url(&self, device_id: &str) -> String {
        format!("{}/{}", self.url.trim_end_matches('/'), device_id)
    }

    async fn get(&self, url: &str) -> Result<reqwest::Response, AlertsError> {
        let mut request = self.client.get(url);
        if let Some(ref token) = self.token {
            request = request.header("Authorization", format!("Bearer {token}"));
        }

        request
            .send()
            .await
            .map_err(|e| AlertsError::Network(e.to_string()))
    }

    /// Fetch the full device list.
    pub async fn fetch_all(&self) -> Result<Vec<RawReading>, AlertsError> {
        let response = self.get(&self.url).await?;

        let status = response.status();
        if !status.is_success() {
            let message = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(AlertsError::Server {
                status: status.as_u16(),
                message,
            });
        }

        let payload: AlertsPayload = response
            .json()
            .await
            .map_err(|e| AlertsError::Parse(e.to_string()))?;

        Ok(payload.into_records())
    }

    /// Fetch one device record, falling back to filtering the list
    /// endpoint when the by-device endpoint is absent.
    pub async fn fetch_device(&self, device_id: &str) -> Result<Option<RawReading>, AlertsError> {
        let response = self.get(&self.device_url(device_id)).await?;

        let status = response.status();
        if status.as_u16() == 404 {
            let records = self.fetch_all().await?;
            return Ok(records
                .into_iter()
                .find(|r| r.device_id.as_deref() == Some(device_id)));
        }

        if !status.is_success() {
            let message = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(AlertsError::Server {
                status: status.as_u16(),
                message,
            });
        }

        response
            .json()
            .await
            .map(Some)
            .map_err(|e| AlertsError::Parse(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_payload_bare_array() {
        let payload: AlertsPayload =
            serde_json::from_str(r#"[{"deviceId": "DEV-1"}, {"deviceId": "DEV-2"}]"#).unwrap();
        assert_eq!(payload.into_records().len(), 2);
    }

    #[test]
    fn test_payload_wrapped() {
        let payload: AlertsPayload =
            serde_json::from_str(r#"{"alerts": [{"deviceId": "DEV-1"}]}"#).unwrap();
        let records = payload.into_records();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].device_id.as_deref(), Some("DEV-1"));
    }

    #[test]
    fn test_device_url() {
        let client = AlertsClient::new("http://host/api/alerts/", None);
        assert_eq!(client.device_url("DEV-1"), "http://host/api/alerts/DEV-1");
    }

    #[tokio::test]
    async fn test_fetch_all_unreachable_is_network_error() {
        let client = AlertsClient::new("http://127.0.0.1:1/alerts", None);
        let err = client.fetch_all().await.unwrap_err();
        assert!(matches!(err, AlertsError::Network(_)));
    }
}

//! Weather client used to enrich inference requests.
//!
//! Weather is best-effort context: a failure here is logged by the
//! caller and the reading pipeline carries on with default ambient
//! fields.

use serde::{Deserialize, Serialize};

/// Current conditions at a sensor location.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeatherConditions {
    /// Air temperature in degrees Celsius
    pub temperature: f64,
    /// Relative humidity in percent
    pub humidity: f64,
    /// Pressure in hPa
    pub pressure: f64,
    /// Wind speed in m/s
    pub wind_speed: f64,
    /// Wind direction in degrees
    pub wind_direction: f64,
    /// Wind gust in m/s, when reported
    #[serde(default)]
    pub wind_gust: Option<f64>,
    /// Visibility in meters
    pub visibility: f64,
    /// Short textual description ("clear sky", ...)
    pub description: String,
}

/// Weather client error types.
#[derive(Debug)]
pub enum WeatherError {
    /// Network/HTTP error
    Network(String),
    /// Server returned an error response
    Server { status: u16, message: String },
    /// Malformed response body
    Parse(String),
}

impl std::fmt::Display for WeatherError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            WeatherError::Network(msg) => write!(f, "Weather network error: {msg}"),
            WeatherError::Server { status, message } => {
                write!(f, "Weather server error ({status}): {message}")
            }
            WeatherError::Parse(msg) => write!(f, "Weather parse error: {msg}"),
        }
    }
}

impl std::error::Error for WeatherError {}

/// HTTP client for the current-weather endpoint.
pub struct WeatherClient {
    url: String,
    api_key: Option<String>,
    client: reqwest::Client,
}

impl WeatherClient {
    pub fn new(url: impl Into<String>, api_key: Option<String>) -> Self {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(10))
            .build()
            .expect("Failed to create HTTP client");

        Self {
            url: url.into(),
            api_key,
            client,
        }
    }

    /// Fetch current conditions for a coordinate pair.
    pub async fn fetch(&self, lat: f64, lon: f64) -> Result<WeatherConditions, WeatherError> {
        let mut request = self
            .client
            .get(&self.url)
            .query(&[("lat", lat), ("lon", lon)]);

        if let Some(ref key) = self.api_key {
            request = request.query(&[("appid", key.as_str())]);
        }

        let response = request
            .send()
            .await
            .map_err(|e| WeatherError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let message = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(WeatherError::Server {
                status: status.as_u16(),
                message,
            });
        }

        response
            .json()
            .await
            .map_err(|e| WeatherError::Parse(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_conditions_parse_without_gust() {
        let json = r#"{
            "temperature": 28.5,
            "humidity": 31.0,
            "pressure": 1012.0,
            "wind_speed": 6.2,
            "wind_direction": 220.0,
            "visibility": 10000.0,
            "description": "clear sky"
        }"#;

        let conditions: WeatherConditions = serde_json::from_str(json).unwrap();
        assert_eq!(conditions.temperature, 28.5);
        assert_eq!(conditions.wind_gust, None);
        assert_eq!(conditions.description, "clear sky");
    }

    #[tokio::test]
    async fn test_fetch_unreachable_is_network_error() {
        let client = WeatherClient::new("http://127.0.0.1:1/weather", None);
        let err = client.fetch(46.5, 23.6).await.unwrap_err();
        assert!(matches!(err, WeatherError::Network(_)));
    }
}

use crate::core::parser::parse_measurement;
use crate::domain::model::Measurement;
use crate::domain::ports::ScaleSource;
use crate::utils::error::{Result, ScaleIotError};
use reqwest::{Client, StatusCode};
use std::time::Duration;

pub const DEFAULT_SCALE_TIMEOUT: Duration = Duration::from_secs(2);

/// Reads the scale's XML document over plain HTTP GET.
#[derive(Debug, Clone)]
pub struct HttpScaleReader {
    client: Client,
    timeout: Duration,
}

impl HttpScaleReader {
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ScaleIotError::ConfigError {
                message: format!("cannot build HTTP client: {}", e),
            })?;
        Ok(Self { client, timeout })
    }

    fn transport_error(&self, url: &str, e: reqwest::Error) -> ScaleIotError {
        if e.is_timeout() {
            ScaleIotError::Timeout {
                url: url.to_string(),
                after: self.timeout,
            }
        } else {
            ScaleIotError::Transport {
                url: url.to_string(),
                source: e,
            }
        }
    }
}

#[async_trait::async_trait]
impl ScaleSource for HttpScaleReader {
    async fn poll(&self, url: &str) -> Result<Measurement> {
        tracing::debug!("Making scale request to: {}", url);
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| self.transport_error(url, e))?;

        tracing::debug!("Scale response status: {}", response.status());
        if response.status() != StatusCode::OK {
            return Err(ScaleIotError::HttpStatus {
                url: url.to_string(),
                status: response.status().as_u16(),
            });
        }

        let body = response
            .text()
            .await
            .map_err(|e| self.transport_error(url, e))?;
        parse_measurement(&body)
    }
}

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;

use super::settings::ClientSettings;
use super::{Finding, ScanAck, ScanRequest, ScanStatus, ScanTransport, TransportError};

/// [`ScanTransport`] implementation speaking JSON over HTTP to the scan
/// backend.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    http: Client,
    base_url: String,
}

impl HttpTransport {
    pub fn new(settings: &ClientSettings) -> Result<Self> {
        let http = Client::builder()
            .user_agent("expocheck/0.1")
            .timeout(settings.timeout())
            .build()
            .context("failed to build scan backend HTTP client")?;
        Ok(Self {
            http,
            base_url: settings.base_url.trim_end_matches('/').to_string(),
        })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }
}

#[async_trait]
impl ScanTransport for HttpTransport {
    async fn submit_scan(&self, path: &str) -> Result<ScanAck, TransportError> {
        let response = self
            .http
            .post(self.endpoint("scan"))
            .json(&ScanRequest {
                path: path.to_string(),
            })
            .send()
            .await
            .map_err(connection_error)?;
        decode(response).await
    }

    async fn get_status(&self) -> Result<ScanStatus, TransportError> {
        let response = self
            .http
            .get(self.endpoint("status"))
            .send()
            .await
            .map_err(connection_error)?;
        decode(response).await
    }

    async fn get_results(&self) -> Result<Vec<Finding>, TransportError> {
        let response = self
            .http
            .get(self.endpoint("results"))
            .send()
            .await
            .map_err(connection_error)?;
        decode(response).await
    }
}

async fn decode<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, TransportError> {
    let status = response.status();
    if !status.is_success() {
        return Err(TransportError::UnexpectedStatus {
            status: status.as_u16(),
        });
    }
    response.json().await.map_err(|err| TransportError::Decode {
        reason: err.to_string(),
    })
}

fn connection_error(err: reqwest::Error) -> TransportError {
    TransportError::Connection {
        reason: err.to_string(),
    }
}

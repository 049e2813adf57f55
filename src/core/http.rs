//! Blocking HTTP(S) retrieval of remote text content.

use std::time::Duration;

use reqwest::blocking::Client;

use crate::config::HttpConfig;
use crate::error::{Error, Result};

/// Fetches the body of a URL as text.
pub trait HttpClient: Send + Sync {
    fn get_text(&self, url: &str) -> Result<String>;
}

/// `reqwest` backed client used outside of tests.
pub struct ReqwestClient {
    client: Client,
}

impl ReqwestClient {
    pub fn new(config: &HttpConfig) -> Result<Self> {
        let mut builder = Client::builder().user_agent(config.user_agent.clone());
        if config.timeout_secs > 0 {
            builder = builder.timeout(Duration::from_secs(config.timeout_secs));
        }

        let client = builder
            .build()
            .map_err(|e| Error::internal_io(e.to_string(), Some("create HTTP client".to_string())))?;

        Ok(Self { client })
    }
}

impl HttpClient for ReqwestClient {
    fn get_text(&self, url: &str) -> Result<String> {
        let response = self
            .client
            .get(url)
            .send()
            .map_err(|e| Error::network_request_failed(url, e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::network_bad_status(url, status.as_u16()));
        }

        response
            .text()
            .map_err(|e| Error::network_request_failed(url, e.to_string()))
    }
}

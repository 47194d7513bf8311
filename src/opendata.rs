use std::fs::File;
use std::path::Path;
use std::time::Duration;

use reqwest::blocking::Client;
use reqwest::header::{HeaderMap, HeaderValue, USER_AGENT};
use serde_json::Value;

use crate::error::LandcoverError;

/// Transport for the open data portal and the NRCan FTP mirror.
/// One attempt per request; failures are returned as-is.
pub trait OpenDataClient: Send + Sync {
    fn fetch_json(&self, url: &str) -> Result<Value, LandcoverError>;
    fn download_url(&self, url: &str, destination: &Path) -> Result<(), LandcoverError>;
}

#[derive(Clone)]
pub struct OpenDataHttpClient {
    client: Client,
}

impl OpenDataHttpClient {
    pub fn new(timeout_secs: u64) -> Result<Self, LandcoverError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            USER_AGENT,
            HeaderValue::from_str(&format!("nrcan-landcover/{}", env!("CARGO_PKG_VERSION")))
                .map_err(|err| LandcoverError::Http(err.to_string()))?,
        );
        let client = Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|err| LandcoverError::Http(err.to_string()))?;
        Ok(Self { client })
    }

    fn handle_status(
        response: reqwest::blocking::Response,
    ) -> Result<reqwest::blocking::Response, LandcoverError> {
        if response.status().is_success() {
            return Ok(response);
        }
        let status = response.status().as_u16();
        let message = response
            .text()
            .unwrap_or_else(|_| "request failed".to_string());
        Err(LandcoverError::HttpStatus { status, message })
    }
}

impl OpenDataClient for OpenDataHttpClient {
    fn fetch_json(&self, url: &str) -> Result<Value, LandcoverError> {
        let response = self
            .client
            .get(url)
            .send()
            .map_err(|err| LandcoverError::Http(err.to_string()))?;
        let response = Self::handle_status(response)?;
        response
            .json()
            .map_err(|err| LandcoverError::Http(err.to_string()))
    }

    fn download_url(&self, url: &str, destination: &Path) -> Result<(), LandcoverError> {
        let response = self
            .client
            .get(url)
            .send()
            .map_err(|err| LandcoverError::Http(err.to_string()))?;
        let mut response = Self::handle_status(response)?;
        if let Some(parent) = destination.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|err| LandcoverError::Filesystem(err.to_string()))?;
        }
        let mut file =
            File::create(destination).map_err(|err| LandcoverError::Filesystem(err.to_string()))?;
        std::io::copy(&mut response, &mut file)
            .map_err(|err| LandcoverError::Filesystem(err.to_string()))?;
        Ok(())
    }
}

pub fn is_remote(href: &str) -> bool {
    href.starts_with("http://") || href.starts_with("https://")
}

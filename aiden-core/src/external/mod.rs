//! HTTP adapters for the OSINT collector and the phishing content generator.

pub mod collector;
pub mod generator;

pub use collector::{
    CollectorReport, HttpOsintCollector, OsintCollector, RawFinding,
    SubjectDescriptor,
};
pub use generator::{ContentGenerator, GenerationRequest, HttpContentGenerator};

use std::time::Duration;

use crate::error::{AidenError, Result};

fn build_client(timeout: Duration) -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|e| {
            AidenError::Internal(format!("Failed to create HTTP client: {e}"))
        })
}

fn endpoint(base_url: &str, path: &str) -> String {
    format!("{}/{}", base_url.trim_end_matches('/'), path)
}

fn describe_send_error(err: &reqwest::Error) -> String {
    if err.is_timeout() {
        "request timed out".to_string()
    } else if err.is_connect() {
        format!("connection failed: {err}")
    } else {
        format!("request failed: {err}")
    }
}

/// Reads the response body, turning non-2xx statuses into errors.
async fn read_success_body(
    response: reqwest::Response,
) -> std::result::Result<String, String> {
    let status = response.status();
    let body = response
        .text()
        .await
        .map_err(|e| describe_send_error(&e))?;
    if !status.is_success() {
        let snippet: String = body.chars().take(200).collect();
        return Err(format!("HTTP {status}: {snippet}"));
    }
    Ok(body)
}

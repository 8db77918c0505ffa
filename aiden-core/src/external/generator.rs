use std::time::Duration;

use aiden_model::PhishingEmail;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use super::{build_client, describe_send_error, endpoint, read_success_body};
use crate::error::{AidenError, Result};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GenerationRequest {
    pub full_name: String,
    pub email: String,
    pub osint_data: Value,
}

#[derive(Deserialize)]
struct WireEmail {
    from_name: String,
    from_email: String,
    subject: String,
    body: String,
    #[serde(default)]
    explanation: Option<String>,
}

/// Validate a generator payload into a [`PhishingEmail`].
pub fn parse_generated_email(
    payload: Value,
) -> std::result::Result<PhishingEmail, String> {
    let wire: WireEmail =
        serde_json::from_value(payload).map_err(|e| e.to_string())?;
    for (field, value) in [
        ("from_name", &wire.from_name),
        ("from_email", &wire.from_email),
        ("subject", &wire.subject),
        ("body", &wire.body),
    ] {
        if value.trim().is_empty() {
            return Err(format!("`{field}` must not be empty"));
        }
    }
    Ok(PhishingEmail {
        from_name: wire.from_name,
        from_email: wire.from_email,
        subject: wire.subject,
        body: wire.body,
        explanation: wire.explanation.filter(|e| !e.trim().is_empty()),
    })
}

#[async_trait]
pub trait ContentGenerator: Send + Sync {
    async fn generate(&self, request: &GenerationRequest)
    -> Result<PhishingEmail>;
}

#[derive(Debug, Clone)]
pub struct HttpContentGenerator {
    client: reqwest::Client,
    base_url: String,
}

impl HttpContentGenerator {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        Ok(Self {
            client: build_client(timeout)?,
            base_url: base_url.into(),
        })
    }
}

#[async_trait]
impl ContentGenerator for HttpContentGenerator {
    async fn generate(
        &self,
        request: &GenerationRequest,
    ) -> Result<PhishingEmail> {
        let url = endpoint(&self.base_url, "generate_phishing");
        debug!(target: "aiden::osint", %url, "requesting phishing content");

        let response = self
            .client
            .post(&url)
            .json(request)
            .send()
            .await
            .map_err(|e| AidenError::generator(describe_send_error(&e)))?;
        let body = read_success_body(response)
            .await
            .map_err(AidenError::generator)?;

        let payload: Value = serde_json::from_str(&body).map_err(|e| {
            AidenError::generator(format!("response is not JSON: {e}"))
        })?;
        parse_generated_email(payload).map_err(|e| {
            AidenError::generator(format!("schema mismatch: {e}"))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn requires_the_four_core_fields() {
        let email = parse_generated_email(json!({
            "from_name": "IT Desk",
            "from_email": "it@acme.io",
            "subject": "Password expiry",
            "body": "Please reset",
            "explanation": ""
        }))
        .unwrap();
        assert_eq!(email.subject, "Password expiry");
        assert_eq!(email.explanation, None);

        assert!(
            parse_generated_email(json!({
                "from_name": "IT Desk",
                "from_email": "it@acme.io",
                "subject": "",
                "body": "Please reset"
            }))
            .is_err()
        );
        assert!(parse_generated_email(json!({"subject": "x"})).is_err());
    }
}

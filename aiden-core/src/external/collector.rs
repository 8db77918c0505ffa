use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::debug;

use super::{build_client, describe_send_error, endpoint, read_success_body};
use crate::error::{AidenError, Result};

/// Identity sent to the collector.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SubjectDescriptor {
    pub full_name: String,
    pub email: String,
    pub domain: String,
}

impl SubjectDescriptor {
    /// Descriptor for a bare email: the local part stands in for the name and
    /// the email's domain is the organisation domain.
    pub fn from_email(email: &str) -> Self {
        let (local, domain) = email.split_once('@').unwrap_or((email, ""));
        Self {
            full_name: local.to_string(),
            email: email.to_string(),
            domain: domain.to_string(),
        }
    }
}

/// One validated finding as returned by the collector.
#[derive(Debug, Clone, PartialEq)]
pub struct RawFinding {
    pub module: String,
    pub kind: String,
    pub data: String,
    pub date_found: Option<DateTime<Utc>>,
    pub corroboration: u32,
}

/// Validated collector response.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CollectorReport {
    pub raw_results: Option<Value>,
    pub ranked: Option<Value>,
    pub findings: Vec<RawFinding>,
}

#[derive(Deserialize)]
struct WireFinding {
    module: String,
    #[serde(rename = "type")]
    kind: String,
    data: String,
    #[serde(default)]
    date_found: Option<String>,
    corroboration: i64,
}

impl CollectorReport {
    /// Parse and validate a collector payload. The payload is either an array
    /// of findings or an object carrying at least one of `raw_results`,
    /// `ranked` and `findings`.
    pub fn from_json(payload: Value) -> std::result::Result<Self, String> {
        match payload {
            Value::Array(items) => Ok(Self {
                findings: parse_findings(items)?,
                ..Self::default()
            }),
            Value::Object(fields) => Self::from_object(fields),
            other => Err(format!(
                "expected an object or array, got {}",
                json_kind(&other)
            )),
        }
    }

    fn from_object(
        mut fields: Map<String, Value>,
    ) -> std::result::Result<Self, String> {
        let raw_results = fields.remove("raw_results").filter(|v| !v.is_null());
        let ranked = fields.remove("ranked").filter(|v| !v.is_null());
        let findings = match fields.remove("findings") {
            None | Some(Value::Null) => None,
            Some(Value::Array(items)) => Some(parse_findings(items)?),
            Some(other) => {
                return Err(format!(
                    "`findings` must be an array, got {}",
                    json_kind(&other)
                ));
            }
        };

        if raw_results.is_none() && ranked.is_none() && findings.is_none() {
            return Err(
                "response has none of `raw_results`, `ranked`, `findings`"
                    .to_string(),
            );
        }

        Ok(Self {
            raw_results,
            ranked,
            findings: findings.unwrap_or_default(),
        })
    }
}

fn parse_findings(
    items: Vec<Value>,
) -> std::result::Result<Vec<RawFinding>, String> {
    items
        .into_iter()
        .enumerate()
        .map(|(index, item)| {
            parse_finding(item).map_err(|e| format!("finding {index}: {e}"))
        })
        .collect()
}

/// Longest `module` or `type` the findings table stores.
const MAX_LABEL_CHARS: usize = 255;

fn parse_finding(item: Value) -> std::result::Result<RawFinding, String> {
    let wire: WireFinding =
        serde_json::from_value(item).map_err(|e| e.to_string())?;

    for (field, value) in [
        ("module", &wire.module),
        ("type", &wire.kind),
        ("data", &wire.data),
    ] {
        if value.trim().is_empty() {
            return Err(format!("`{field}` must not be empty"));
        }
    }
    for (field, value) in [("module", &wire.module), ("type", &wire.kind)] {
        let len = value.chars().count();
        if len > MAX_LABEL_CHARS {
            return Err(format!(
                "`{field}` is {len} characters, at most {MAX_LABEL_CHARS} allowed"
            ));
        }
    }

    let corroboration = u32::try_from(wire.corroboration).map_err(|_| {
        format!(
            "`corroboration` must be a non-negative integer, got {}",
            wire.corroboration
        )
    })?;

    let date_found = match wire.date_found.as_deref().map(str::trim) {
        None | Some("") => None,
        Some(raw) => Some(
            DateTime::parse_from_rfc3339(raw)
                .map_err(|e| format!("`date_found` is not RFC 3339: {e}"))?
                .with_timezone(&Utc),
        ),
    };

    Ok(RawFinding {
        module: wire.module,
        kind: wire.kind,
        data: wire.data,
        date_found,
        corroboration,
    })
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[async_trait]
pub trait OsintCollector: Send + Sync {
    async fn gather(&self, subject: &SubjectDescriptor)
    -> Result<CollectorReport>;

    /// Whether the collector answers its root endpoint.
    async fn health(&self) -> Result<bool>;
}

#[derive(Debug, Clone)]
pub struct HttpOsintCollector {
    client: reqwest::Client,
    probe: reqwest::Client,
    base_url: String,
}

impl HttpOsintCollector {
    const HEALTH_TIMEOUT: Duration = Duration::from_secs(5);

    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        Ok(Self {
            client: build_client(timeout)?,
            probe: build_client(Self::HEALTH_TIMEOUT)?,
            base_url: base_url.into(),
        })
    }
}

#[async_trait]
impl OsintCollector for HttpOsintCollector {
    async fn gather(
        &self,
        subject: &SubjectDescriptor,
    ) -> Result<CollectorReport> {
        let url = endpoint(&self.base_url, "gather_osint");
        debug!(target: "aiden::osint", %url, "requesting OSINT gather");

        let response = self
            .client
            .post(&url)
            .json(subject)
            .send()
            .await
            .map_err(|e| AidenError::collector(describe_send_error(&e)))?;
        let body = read_success_body(response)
            .await
            .map_err(AidenError::collector)?;

        let payload: Value = serde_json::from_str(&body).map_err(|e| {
            AidenError::collector(format!("response is not JSON: {e}"))
        })?;
        CollectorReport::from_json(payload).map_err(|e| {
            AidenError::collector(format!("schema mismatch: {e}"))
        })
    }

    async fn health(&self) -> Result<bool> {
        let url = endpoint(&self.base_url, "");
        match self.probe.get(&url).send().await {
            Ok(response) => Ok(response.status().is_success()),
            Err(err) => {
                debug!(
                    target: "aiden::osint",
                    error = %describe_send_error(&err),
                    "collector health probe failed"
                );
                Ok(false)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn accepts_bare_finding_arrays() {
        let report = CollectorReport::from_json(json!([
            {
                "module": "sfp_email",
                "type": "EMAILADDR",
                "data": "a@b.com",
                "corroboration": 2,
                "date_found": "2024-05-01T10:00:00Z"
            },
            {
                "module": "sfp_dns",
                "type": "DOMAIN",
                "data": "b.com",
                "corroboration": 0,
                "date_found": null
            }
        ]))
        .unwrap();

        assert_eq!(report.findings.len(), 2);
        assert_eq!(report.findings[0].corroboration, 2);
        assert!(report.findings[0].date_found.is_some());
        assert!(report.findings[1].date_found.is_none());
        assert!(report.raw_results.is_none());
    }

    #[test]
    fn accepts_text_only_envelopes() {
        let report = CollectorReport::from_json(json!({
            "raw_results": "harvester output",
            "ranked": "1. something"
        }))
        .unwrap();
        assert!(report.findings.is_empty());
        assert_eq!(report.ranked, Some(json!("1. something")));
    }

    #[test]
    fn rejects_empty_envelopes() {
        assert!(CollectorReport::from_json(json!({})).is_err());
        assert!(CollectorReport::from_json(json!({"ranked": null})).is_err());
        assert!(CollectorReport::from_json(json!("text")).is_err());
    }

    #[test]
    fn rejects_invalid_findings() {
        let negative = json!([{
            "module": "m", "type": "t", "data": "d", "corroboration": -1
        }]);
        let err = CollectorReport::from_json(negative).unwrap_err();
        assert!(err.contains("non-negative"), "{err}");

        let fractional = json!([{
            "module": "m", "type": "t", "data": "d", "corroboration": 1.5
        }]);
        assert!(CollectorReport::from_json(fractional).is_err());

        let blank = json!([{
            "module": " ", "type": "t", "data": "d", "corroboration": 1
        }]);
        assert!(CollectorReport::from_json(blank).is_err());

        let bad_date = json!({"findings": [{
            "module": "m", "type": "t", "data": "d", "corroboration": 1,
            "date_found": "yesterday"
        }]});
        assert!(CollectorReport::from_json(bad_date).is_err());
    }

    #[test]
    fn caps_label_lengths() {
        let at_limit = "m".repeat(MAX_LABEL_CHARS);
        let ok = json!([{
            "module": at_limit, "type": "t", "data": "d", "corroboration": 1
        }]);
        assert!(CollectorReport::from_json(ok).is_ok());

        let long_module = json!([{
            "module": "m".repeat(MAX_LABEL_CHARS + 1),
            "type": "t", "data": "d", "corroboration": 1
        }]);
        let err = CollectorReport::from_json(long_module).unwrap_err();
        assert!(err.contains("`module`"), "{err}");

        // Counted in characters, not bytes.
        let long_type = json!([{
            "module": "m", "type": "é".repeat(MAX_LABEL_CHARS + 1),
            "data": "d", "corroboration": 1
        }]);
        let err = CollectorReport::from_json(long_type).unwrap_err();
        assert!(err.contains("`type`"), "{err}");

        let multibyte = json!([{
            "module": "m", "type": "é".repeat(MAX_LABEL_CHARS),
            "data": "d", "corroboration": 1
        }]);
        assert!(CollectorReport::from_json(multibyte).is_ok());
    }

    #[test]
    fn descriptor_from_email_splits_domain() {
        let subject = SubjectDescriptor::from_email("jane.doe@acme.io");
        assert_eq!(subject.full_name, "jane.doe");
        assert_eq!(subject.domain, "acme.io");
    }
}

use std::{fmt, sync::Arc};

use aiden_model::Consent;
use chrono::Utc;
use serde::Deserialize;
use serde_json::Value;
use tracing::info;

use crate::database::ports::{ConsentsRepository, NewConsent};
use crate::error::{AidenError, Result};
use crate::validation;

const FIELD_MAX: usize = 255;

/// Consent form as submitted by the subject.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ConsentSubmission {
    pub name: String,
    pub email: String,
    pub target: String,
    #[serde(default)]
    pub agree: bool,
    #[serde(default)]
    pub meta: Option<Value>,
}

pub struct ConsentService {
    consents: Arc<dyn ConsentsRepository>,
}

impl fmt::Debug for ConsentService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConsentService")
            .field("consents_repo", &Arc::strong_count(&self.consents))
            .finish()
    }
}

impl ConsentService {
    pub fn new(consents: Arc<dyn ConsentsRepository>) -> Self {
        Self { consents }
    }

    /// Append an audit entry. `ip` and `user_agent` come from the request.
    pub async fn record(
        &self,
        submission: &ConsentSubmission,
        ip: Option<String>,
        user_agent: Option<String>,
    ) -> Result<Consent> {
        if !submission.agree {
            return Err(AidenError::Validation("agree must be accepted".into()));
        }
        let meta = match &submission.meta {
            None | Some(Value::Null) => None,
            Some(value @ Value::Object(_)) => Some(value.clone()),
            Some(_) => {
                return Err(AidenError::Validation(
                    "meta must be an object".into(),
                ));
            }
        };

        let consent = NewConsent {
            name: validation::required("name", &submission.name, FIELD_MAX)?,
            email: validation::email("email", &submission.email)?,
            target: validation::required(
                "target",
                &submission.target,
                FIELD_MAX,
            )?,
            agreed_at: Utc::now(),
            ip,
            user_agent,
            meta,
        };
        let stored = self.consents.insert_consent(&consent).await?;

        info!(
            target: "aiden::consent",
            consent_id = %stored.id,
            email = %stored.email,
            consent_target = %stored.target,
            ip = stored.ip.as_deref().unwrap_or("-"),
            agreed_at = %stored.agreed_at,
            "consent recorded"
        );
        Ok(stored)
    }
}

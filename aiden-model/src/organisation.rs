use std::{fmt, str::FromStr};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use url::Url;

use crate::{error::ModelError, ids::OrganisationId};

/// Domain sent to the collector when an organisation has no website.
pub const DEFAULT_SUBJECT_DOMAIN: &str = "company.com";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Organisation {
    pub id: OrganisationId,
    pub name: String,
    pub website: Option<String>,
    pub industry: Option<String>,
    pub size: Option<String>,
    pub logo_path: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Organisation {
    /// Host of the organisation website, or [`DEFAULT_SUBJECT_DOMAIN`].
    pub fn domain(&self) -> String {
        self.website
            .as_deref()
            .and_then(|site| Url::parse(site).ok())
            .and_then(|url| url.host_str().map(str::to_owned))
            .unwrap_or_else(|| DEFAULT_SUBJECT_DOMAIN.to_string())
    }
}

/// How often simulated campaigns run for an organisation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SimulationFrequency {
    Daily,
    Weekly,
    Biweekly,
    Monthly,
}

impl SimulationFrequency {
    pub fn as_str(&self) -> &'static str {
        match self {
            SimulationFrequency::Daily => "daily",
            SimulationFrequency::Weekly => "weekly",
            SimulationFrequency::Biweekly => "biweekly",
            SimulationFrequency::Monthly => "monthly",
        }
    }
}

impl fmt::Display for SimulationFrequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SimulationFrequency {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "daily" => Ok(SimulationFrequency::Daily),
            "weekly" => Ok(SimulationFrequency::Weekly),
            "biweekly" => Ok(SimulationFrequency::Biweekly),
            "monthly" => Ok(SimulationFrequency::Monthly),
            other => Err(ModelError::UnknownVariant {
                kind: "simulation frequency",
                value: other.to_string(),
            }),
        }
    }
}

/// Per-organisation simulation schedule. One row per organisation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrganisationSettings {
    pub organisation_id: OrganisationId,
    pub frequency: SimulationFrequency,
    pub timezone: String,
    pub start_at: Option<DateTime<Utc>>,
    pub updated_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn organisation(website: Option<&str>) -> Organisation {
        let now = Utc::now();
        Organisation {
            id: OrganisationId(1),
            name: "Acme".into(),
            website: website.map(str::to_owned),
            industry: None,
            size: None,
            logo_path: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn domain_uses_website_host() {
        let org = organisation(Some("https://www.acme.io/about"));
        assert_eq!(org.domain(), "www.acme.io");
    }

    #[test]
    fn domain_falls_back_without_usable_website() {
        assert_eq!(organisation(None).domain(), DEFAULT_SUBJECT_DOMAIN);
        assert_eq!(
            organisation(Some("not a url")).domain(),
            DEFAULT_SUBJECT_DOMAIN
        );
    }

    #[test]
    fn frequency_parses_lowercase_names() {
        assert_eq!(
            "biweekly".parse::<SimulationFrequency>(),
            Ok(SimulationFrequency::Biweekly)
        );
        assert!("hourly".parse::<SimulationFrequency>().is_err());
    }
}

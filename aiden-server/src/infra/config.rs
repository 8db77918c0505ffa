use anyhow::{Context, anyhow};
use aiden_core::orchestration::OrchestratorConfig;
use std::{
    env, fmt, fs,
    path::{Path, PathBuf},
    str::FromStr,
    time::Duration,
};

const DEFAULT_PASSWORD_PEPPER: &str = "change-me-password-pepper";
const DEFAULT_TOKEN_KEY: &str = "change-me-hmac-key";
/// Ceiling for hour-based windows (one year).
const MAX_WINDOW_HOURS: i64 = 24 * 365;

/// Server configuration loaded from environment variables (after `.env`) and
/// an optional orchestrator config file.
#[derive(Clone)]
pub struct Config {
    // Server settings
    pub server_host: String,
    pub server_port: u16,

    // Database settings
    pub database_url: Option<String>,

    /// Base64 AES-256 key for payloads at rest.
    pub encryption_key: Option<String>,

    // Authentication secrets (pepper for Argon2 + HMAC key for tokens)
    pub auth_password_pepper: String,
    pub auth_token_key: String,
    pub auth_token_ttl_hours: i64,

    // CORS settings
    pub cors_allowed_origins: Vec<String>,

    // External services
    pub collector_url: String,
    pub generator_url: String,
    pub collector_timeout: Duration,
    pub generator_timeout: Duration,

    /// Window in which employee OSINT is served from cache.
    pub osint_freshness_hours: i64,

    pub orchestrator: OrchestratorConfig,
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("server_host", &self.server_host)
            .field("server_port", &self.server_port)
            .field("database_url", &self.database_url.as_ref().map(|_| "<set>"))
            .field(
                "encryption_key",
                &self.encryption_key.as_ref().map(|_| "<redacted>"),
            )
            .field("cors_allowed_origins", &self.cors_allowed_origins)
            .field("collector_url", &self.collector_url)
            .field("generator_url", &self.generator_url)
            .field("collector_timeout", &self.collector_timeout)
            .field("generator_timeout", &self.generator_timeout)
            .field("osint_freshness_hours", &self.osint_freshness_hours)
            .field("orchestrator", &self.orchestrator)
            .finish_non_exhaustive()
    }
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        // Load .env file if present
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build from an arbitrary variable source. Unset variables take their
    /// defaults; set but unparsable values are errors.
    pub fn from_lookup(
        lookup: impl Fn(&str) -> Option<String>,
    ) -> anyhow::Result<Self> {
        let var = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        let orchestrator = load_orchestrator_config(
            var("ORCHESTRATOR_CONFIG_PATH").map(PathBuf::from),
            var("ORCHESTRATOR_CONFIG_JSON"),
        )?;

        let config = Self {
            server_host: var("SERVER_HOST")
                .unwrap_or_else(|| "0.0.0.0".to_string()),
            server_port: parse_or(var("SERVER_PORT"), "SERVER_PORT", 8080)?,

            database_url: var("DATABASE_URL"),
            encryption_key: var("ENCRYPTION_KEY"),

            auth_password_pepper: var("AUTH_PASSWORD_PEPPER")
                .unwrap_or_else(|| DEFAULT_PASSWORD_PEPPER.to_string()),
            auth_token_key: var("AUTH_TOKEN_KEY")
                .unwrap_or_else(|| DEFAULT_TOKEN_KEY.to_string()),
            auth_token_ttl_hours: parse_or(
                var("AUTH_TOKEN_TTL_HOURS"),
                "AUTH_TOKEN_TTL_HOURS",
                24,
            )?,

            cors_allowed_origins: var("CORS_ALLOWED_ORIGINS")
                .map(|raw| {
                    raw.split(',')
                        .map(|s| s.trim().to_string())
                        .filter(|s| !s.is_empty())
                        .collect()
                })
                .unwrap_or_default(),

            collector_url: var("COLLECTOR_URL")
                .unwrap_or_else(|| "http://127.0.0.1:8001".to_string()),
            generator_url: var("GENERATOR_URL")
                .unwrap_or_else(|| "http://127.0.0.1:8002".to_string()),
            collector_timeout: Duration::from_secs(parse_or(
                var("COLLECTOR_TIMEOUT_SECS"),
                "COLLECTOR_TIMEOUT_SECS",
                300,
            )?),
            generator_timeout: Duration::from_secs(parse_or(
                var("GENERATOR_TIMEOUT_SECS"),
                "GENERATOR_TIMEOUT_SECS",
                420,
            )?),

            osint_freshness_hours: parse_or(
                var("OSINT_FRESHNESS_HOURS"),
                "OSINT_FRESHNESS_HOURS",
                24,
            )?,

            orchestrator,
        };
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> anyhow::Result<()> {
        self.orchestrator
            .validate()
            .map_err(|err| anyhow!("invalid orchestrator config: {err}"))?;
        if !(1..=MAX_WINDOW_HOURS).contains(&self.auth_token_ttl_hours) {
            return Err(anyhow!(
                "AUTH_TOKEN_TTL_HOURS must be between 1 and {MAX_WINDOW_HOURS}"
            ));
        }
        if !(0..=MAX_WINDOW_HOURS).contains(&self.osint_freshness_hours) {
            return Err(anyhow!(
                "OSINT_FRESHNESS_HOURS must be between 0 and {MAX_WINDOW_HOURS}"
            ));
        }
        Ok(())
    }

    pub fn require_database_url(&self) -> anyhow::Result<&str> {
        self.database_url
            .as_deref()
            .context("DATABASE_URL must be set")
    }

    /// `true` while either auth secret is still the shipped placeholder.
    pub fn uses_default_auth_secrets(&self) -> bool {
        self.auth_password_pepper == DEFAULT_PASSWORD_PEPPER
            || self.auth_token_key == DEFAULT_TOKEN_KEY
    }
}

fn parse_or<T>(raw: Option<String>, key: &str, default: T) -> anyhow::Result<T>
where
    T: FromStr,
    T::Err: fmt::Display,
{
    match raw {
        None => Ok(default),
        Some(value) => value
            .parse()
            .map_err(|err| anyhow!("invalid {key} value {value:?}: {err}")),
    }
}

/// Orchestrator overrides. Evaluation order:
/// 1) `$ORCHESTRATOR_CONFIG_PATH` (TOML or JSON file),
/// 2) `$ORCHESTRATOR_CONFIG_JSON` (inline JSON),
/// 3) a default file in the working directory,
/// 4) defaults.
fn load_orchestrator_config(
    path: Option<PathBuf>,
    inline_json: Option<String>,
) -> anyhow::Result<OrchestratorConfig> {
    if let Some(path) = path {
        return load_from_file(&path);
    }

    if let Some(raw) = inline_json {
        return serde_json::from_str(&raw)
            .context("failed to parse ORCHESTRATOR_CONFIG_JSON");
    }

    if let Some(path) = find_default_file() {
        return load_from_file(&path);
    }

    Ok(OrchestratorConfig::default())
}

fn load_from_file(path: &Path) -> anyhow::Result<OrchestratorConfig> {
    let contents = fs::read_to_string(path).with_context(|| {
        format!("failed to read orchestrator config from {}", path.display())
    })?;

    match path.extension().and_then(|ext| ext.to_str()) {
        Some("json") => serde_json::from_str(&contents).with_context(|| {
            format!("invalid orchestrator config {}", path.display())
        }),
        Some("toml") => toml::from_str(&contents).map_err(|err| {
            anyhow!("invalid orchestrator config {}: {}", path.display(), err)
        }),
        _ => parse_from_str(&contents, &path.display().to_string()),
    }
}

fn parse_from_str(
    contents: &str,
    origin: &str,
) -> anyhow::Result<OrchestratorConfig> {
    // Try TOML first, then JSON.
    toml::from_str(contents).or_else(|toml_err| {
        serde_json::from_str(contents).map_err(|json_err| {
            anyhow!(
                "failed to parse orchestrator config {}: toml error: {}; json error: {}",
                origin,
                toml_err,
                json_err
            )
        })
    })
}

fn find_default_file() -> Option<PathBuf> {
    const CANDIDATES: &[&str] = &[
        "orchestrator.toml",
        "orchestrator.json",
        "config/orchestrator.toml",
        "config/orchestrator.json",
    ];

    CANDIDATES
        .iter()
        .map(Path::new)
        .find(|path| path.exists())
        .map(|path| path.to_path_buf())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn defaults_apply_when_unset() {
        let config = Config::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config.server_port, 8080);
        assert_eq!(config.collector_timeout, Duration::from_secs(300));
        assert_eq!(config.generator_timeout, Duration::from_secs(420));
        assert_eq!(config.osint_freshness_hours, 24);
        assert_eq!(config.orchestrator.workers, 4);
        assert!(config.uses_default_auth_secrets());
        assert!(config.require_database_url().is_err());
    }

    #[test]
    fn environment_overrides_are_parsed() {
        let config = Config::from_lookup(lookup(&[
            ("SERVER_PORT", "9000"),
            ("CORS_ALLOWED_ORIGINS", "http://a.test, http://b.test,"),
            ("ORCHESTRATOR_CONFIG_JSON", r#"{"workers": 2, "email_top_n": 5}"#),
        ]))
        .unwrap();
        assert_eq!(config.server_port, 9000);
        assert_eq!(
            config.cors_allowed_origins,
            vec!["http://a.test".to_string(), "http://b.test".to_string()]
        );
        assert_eq!(config.orchestrator.workers, 2);
        assert_eq!(config.orchestrator.email_top_n, 5);
    }

    #[test]
    fn malformed_values_are_rejected() {
        assert!(Config::from_lookup(lookup(&[("SERVER_PORT", "http")])).is_err());
        assert!(
            Config::from_lookup(lookup(&[("ORCHESTRATOR_CONFIG_JSON", r#"{"workers": 0}"#)]))
                .is_err()
        );
    }

    #[test]
    fn hour_windows_are_bounded() {
        for (key, value) in [
            ("AUTH_TOKEN_TTL_HOURS", "0"),
            ("AUTH_TOKEN_TTL_HOURS", "9223372036854775807"),
            ("AUTH_TOKEN_TTL_HOURS", "8761"),
            ("OSINT_FRESHNESS_HOURS", "-1"),
            ("OSINT_FRESHNESS_HOURS", "9223372036854775807"),
        ] {
            let err = Config::from_lookup(lookup(&[(key, value)])).unwrap_err();
            assert!(err.to_string().contains(key), "{key}={value}: {err}");
        }

        let config = Config::from_lookup(lookup(&[
            ("AUTH_TOKEN_TTL_HOURS", "8760"),
            ("OSINT_FRESHNESS_HOURS", "0"),
        ]))
        .unwrap();
        assert_eq!(config.auth_token_ttl_hours, 8760);
        assert_eq!(config.osint_freshness_hours, 0);
    }

    #[test]
    fn orchestrator_file_is_loaded() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(file, "workers = 8\nqueue_capacity = 32\n\n[retry]\nmax_attempts = 3").unwrap();

        let path = file.path().to_string_lossy().to_string();
        let config =
            Config::from_lookup(lookup(&[("ORCHESTRATOR_CONFIG_PATH", &path)])).unwrap();
        assert_eq!(config.orchestrator.workers, 8);
        assert_eq!(config.orchestrator.queue_capacity, 32);
        assert_eq!(config.orchestrator.retry.max_attempts, 3);
    }
}

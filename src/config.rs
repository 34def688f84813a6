//! Application configuration via environment variables.
//!
//! `Config` is loaded once at startup. The group-pipeline switches are
//! kept apart in [`PipelineConfig`] and re-read on every resolution.

use std::env;

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    pub workos_api_key: String,
    pub workos_client_id: String,
    pub workos_api_url: String,
    pub supabase_url: String,
    pub supabase_service_key: String,
    pub frontend_url: String,
    pub port: u16,
    pub cookie_https_only: bool,
    pub request_timeout_secs: u64,
}

impl Config {
    /// Load configuration from the process environment.
    ///
    /// Required: `WORKOS_API_KEY`, `WORKOS_CLIENT_ID`.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |key: &str| {
            lookup(key)
                .filter(|v| !v.is_empty())
                .ok_or_else(|| ConfigError::MissingEnv(key.into()))
        };

        Ok(Self {
            workos_api_key: required("WORKOS_API_KEY")?,
            workos_client_id: required("WORKOS_CLIENT_ID")?,
            workos_api_url: lookup("WORKOS_API_URL")
                .unwrap_or_else(|| "https://api.workos.com".into()),
            supabase_url: lookup("SUPABASE_URL").unwrap_or_default(),
            supabase_service_key: lookup("SUPABASE_SERVICE_KEY").unwrap_or_default(),
            frontend_url: lookup("FRONTEND_URL")
                .unwrap_or_else(|| "http://localhost:3000".into()),
            port: lookup("PORT")
                .and_then(|v| v.parse().ok())
                .unwrap_or(3001),
            cookie_https_only: lookup("COOKIE_HTTPS_ONLY")
                .map(|v| parse_flag(&v))
                .unwrap_or(false),
            request_timeout_secs: lookup("REQUEST_TIMEOUT_SECS")
                .and_then(|v| v.parse().ok())
                .unwrap_or(30),
        })
    }

    /// Whether a PostgREST store is configured.
    pub fn has_remote_store(&self) -> bool {
        !self.supabase_url.is_empty()
    }

    /// PostgREST endpoint under the Supabase project URL.
    pub fn postgrest_url(&self) -> String {
        format!("{}/rest/v1", self.supabase_url.trim_end_matches('/'))
    }
}

/// Configuration for tests; override fields with struct update syntax.
impl Config {
    pub fn test_default() -> Self {
        Self {
            workos_api_key: "sk_test_key".into(),
            workos_client_id: "client_test".into(),
            workos_api_url: "http://127.0.0.1:9".into(),
            supabase_url: String::new(),
            supabase_service_key: String::new(),
            frontend_url: "http://localhost:3000".into(),
            port: 3001,
            cookie_https_only: false,
            request_timeout_secs: 30,
        }
    }
}

/// Switches for the organization → team pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineConfig {
    pub use_external_org_pipeline: bool,
    pub admin_organization_name: String,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            use_external_org_pipeline: true,
            admin_organization_name: "admin".into(),
        }
    }
}

impl PipelineConfig {
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        Self {
            use_external_org_pipeline: lookup("USE_WORKOS_ORGS")
                .map(|v| parse_flag(&v))
                .unwrap_or(defaults.use_external_org_pipeline),
            admin_organization_name: lookup("ADMIN_ORG_NAME")
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
                .unwrap_or(defaults.admin_organization_name),
        }
    }
}

/// Where pipeline switches come from.
///
/// `Env` re-reads the environment on every `load`, so flipping the flag
/// takes effect without a restart.
#[derive(Debug, Clone)]
pub enum PipelineSettings {
    Env,
    Fixed(PipelineConfig),
}

impl PipelineSettings {
    pub fn load(&self) -> PipelineConfig {
        match self {
            PipelineSettings::Env => PipelineConfig::from_lookup(|key| env::var(key).ok()),
            PipelineSettings::Fixed(config) => config.clone(),
        }
    }
}

fn parse_flag(value: &str) -> bool {
    matches!(value.trim(), "true" | "1" | "True" | "TRUE" | "yes")
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingEnv(String),
}

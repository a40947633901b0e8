//! Infisical client for the secret store.
//!
//! Talks to the Infisical REST API directly: a list-secrets call against the
//! v3 "raw" endpoint, optionally preceded by a universal-auth login when a
//! machine identity is configured instead of a service token.

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use std::fmt;
use tracing::debug;

use crate::common::config::{ConfigError, InfisicalSettings};
use crate::common::utils::env_var;
use crate::secrets::SecretMap;
use crate::secrets::errors::SecretSourceError;
use crate::secrets::source::SecretSource;

/// Longest error body carried into an error message.
const MAX_ERROR_BODY: usize = 256;

/// How the client authenticates.
pub enum InfisicalAuth {
    /// Service token or pre-issued access token, sent as a bearer token.
    Token(SecretString),
    /// Machine identity exchanged for an access token on every load.
    UniversalAuth {
        client_id: String,
        client_secret: SecretString,
    },
}

impl InfisicalAuth {
    /// Reads credentials from the process environment.
    pub fn from_env() -> Option<Self> {
        Self::from_vars(env_var)
    }

    /// A token wins over a machine identity when both are present.
    pub fn from_vars<F>(lookup: F) -> Option<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(token) = lookup("INFISICAL_TOKEN").or_else(|| lookup("INFISICAL_SERVICE_TOKEN")) {
            return Some(InfisicalAuth::Token(SecretString::from(token)));
        }
        match (lookup("INFISICAL_CLIENT_ID"), lookup("INFISICAL_CLIENT_SECRET")) {
            (Some(client_id), Some(client_secret)) => Some(InfisicalAuth::UniversalAuth {
                client_id,
                client_secret: SecretString::from(client_secret),
            }),
            _ => None,
        }
    }
}

impl fmt::Debug for InfisicalAuth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InfisicalAuth::Token(_) => f.write_str("InfisicalAuth::Token([REDACTED])"),
            InfisicalAuth::UniversalAuth { client_id, .. } => f
                .debug_struct("InfisicalAuth::UniversalAuth")
                .field("client_id", client_id)
                .field("client_secret", &"[REDACTED]")
                .finish(),
        }
    }
}

/// A complete, usable Infisical configuration.
#[derive(Debug)]
pub struct InfisicalConfig {
    pub settings: InfisicalSettings,
    pub project_id: String,
    pub auth: InfisicalAuth,
}

impl InfisicalConfig {
    /// `None` when credentials or the project id are missing.
    pub fn from_parts(settings: InfisicalSettings, auth: Option<InfisicalAuth>) -> Option<Self> {
        let project_id = settings.project_id.clone().filter(|id| !id.is_empty())?;
        Some(Self {
            settings,
            project_id,
            auth: auth?,
        })
    }

    /// Builds the configuration from the `INFISICAL_*` process variables.
    pub fn from_env() -> Result<Option<Self>, ConfigError> {
        Self::from_vars(env_var)
    }

    /// Like [`from_env`](Self::from_env) over an arbitrary lookup. Only
    /// `INFISICAL_*` names are consulted.
    pub fn from_vars<F>(lookup: F) -> Result<Option<Self>, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut settings = InfisicalSettings::default();
        settings.apply_vars(&lookup)?;
        Ok(Self::from_parts(settings, InfisicalAuth::from_vars(&lookup)))
    }

    fn base_url(&self) -> &str {
        self.settings.site_url.trim_end_matches('/')
    }

    fn secrets_url(&self) -> String {
        format!("{}/api/v3/secrets/raw", self.base_url())
    }

    fn login_url(&self) -> String {
        format!("{}/api/v1/auth/universal-auth/login", self.base_url())
    }
}

/// [`SecretSource`] backed by the Infisical REST API.
pub struct InfisicalClient {
    http: reqwest::Client,
    config: Option<InfisicalConfig>,
}

impl InfisicalClient {
    /// A client without configuration reports itself as unconfigured.
    pub fn new(config: Option<InfisicalConfig>) -> Result<Self, SecretSourceError> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = config.as_ref().and_then(|c| c.settings.timeout()) {
            builder = builder.timeout(timeout);
        }
        Ok(Self {
            http: builder.build()?,
            config,
        })
    }

    pub fn from_env() -> crate::Result<Self> {
        Self::from_vars(env_var)
    }

    pub fn from_vars<F>(lookup: F) -> crate::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        Ok(Self::new(InfisicalConfig::from_vars(lookup)?)?)
    }

    pub fn is_configured(&self) -> bool {
        self.config.is_some()
    }

    async fn access_token(&self, config: &InfisicalConfig) -> Result<SecretString, SecretSourceError> {
        let (client_id, client_secret) = match &config.auth {
            InfisicalAuth::Token(token) => {
                return Ok(SecretString::from(token.expose_secret().to_string()));
            }
            InfisicalAuth::UniversalAuth {
                client_id,
                client_secret,
            } => (client_id, client_secret),
        };

        debug!(client_id = %client_id, "logging in to Infisical with universal auth");
        let response = self
            .http
            .post(config.login_url())
            .json(&serde_json::json!({
                "clientId": client_id,
                "clientSecret": client_secret.expose_secret(),
            }))
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(SecretSourceError::Auth(format!(
                "HTTP {}: {}",
                status.as_u16(),
                error_message(&body)
            )));
        }
        let login: LoginResponse = serde_json::from_str(&body)?;
        Ok(SecretString::from(login.access_token))
    }

    async fn list_secrets(&self, config: &InfisicalConfig) -> Result<SecretMap, SecretSourceError> {
        let token = self.access_token(config).await?;
        let settings = &config.settings;
        debug!(
            project_id = %config.project_id,
            environment = %settings.environment,
            secret_path = %settings.secret_path,
            "listing Infisical secrets"
        );

        let include_imports = if settings.include_imports { "true" } else { "false" };
        let response = self
            .http
            .get(config.secrets_url())
            .bearer_auth(token.expose_secret())
            .query(&[
                ("workspaceId", config.project_id.as_str()),
                ("environment", settings.environment.as_str()),
                ("secretPath", settings.secret_path.as_str()),
                ("include_imports", include_imports),
            ])
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(SecretSourceError::Status {
                status: status.as_u16(),
                message: error_message(&body),
            });
        }
        parse_secrets(&body)
    }
}

#[async_trait]
impl SecretSource for InfisicalClient {
    async fn load_all_secrets(&self) -> Result<Option<SecretMap>, SecretSourceError> {
        match &self.config {
            Some(config) => self.list_secrets(config).await.map(Some),
            None => Ok(None),
        }
    }

    fn name(&self) -> &str {
        "infisical"
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct LoginResponse {
    access_token: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawSecret {
    secret_key: String,
    #[serde(default)]
    secret_value: String,
}

#[derive(Deserialize)]
struct ImportedSecrets {
    #[serde(default)]
    secrets: Vec<RawSecret>,
}

#[derive(Deserialize)]
struct ListSecretsResponse {
    secrets: Vec<RawSecret>,
    #[serde(default)]
    imports: Vec<ImportedSecrets>,
}

/// Direct secrets win over imported ones; among imports, the first listed wins.
fn parse_secrets(body: &str) -> Result<SecretMap, SecretSourceError> {
    let response: ListSecretsResponse = serde_json::from_str(body)?;

    let mut secrets: SecretMap = response
        .secrets
        .into_iter()
        .map(|s| (s.secret_key, s.secret_value))
        .collect();
    for import in response.imports {
        for secret in import.secrets {
            secrets.entry(secret.secret_key).or_insert(secret.secret_value);
        }
    }
    Ok(secrets)
}

/// Prefers the `message` field of an Infisical error body.
fn error_message(body: &str) -> String {
    #[derive(Deserialize)]
    struct ErrorBody {
        message: String,
    }

    match serde_json::from_str::<ErrorBody>(body) {
        Ok(parsed) => parsed.message,
        Err(_) => body.chars().take(MAX_ERROR_BODY).collect(),
    }
}

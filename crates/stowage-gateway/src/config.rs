use std::fmt;

use serde::Deserialize;

use crate::error::GatewayError;

pub const DEFAULT_LEGACY_HOST: &str = "https://is3.cloudhost.id";
pub const DEFAULT_MIGRATION_HOST: &str = "https://is3.idcloudhost.id";

pub const ENV_BUCKET: &str = "S3_BUCKET";
pub const ENV_REGION: &str = "AWS_REGION";
pub const ENV_ACCESS_KEY: &str = "AWS_ACCESS_KEY";
pub const ENV_SECRET_KEY: &str = "AWS_SECRET_KEY";
pub const ENV_LEGACY_HOST: &str = "STOWAGE_LEGACY_HOST";
pub const ENV_MIGRATION_HOST: &str = "STOWAGE_MIGRATION_HOST";
pub const ENV_ENDPOINT: &str = "STOWAGE_ENDPOINT";

fn default_legacy_host() -> String {
    DEFAULT_LEGACY_HOST.to_string()
}

fn default_migration_host() -> String {
    DEFAULT_MIGRATION_HOST.to_string()
}

/// Static credentials for the remote store.
#[derive(Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Credentials {
    pub access_key: String,
    pub secret_key: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("access_key", &self.access_key)
            .field("secret_key", &"<redacted>")
            .finish()
    }
}

/// Fixed configuration of the remote object store.
///
/// ```toml
/// bucket = "assets"
/// region = "ap-southeast-3"
/// legacy-host = "https://is3.cloudhost.id"
///
/// [credentials]
/// access-key = "..."
/// secret-key = "..."
/// ```
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct StoreConfig {
    pub bucket: String,
    pub region: String,
    /// Host that served links before the migration to the current store.
    #[serde(default = "default_legacy_host")]
    pub legacy_host: String,
    /// Host whose links still need migrating to the current store.
    ///
    /// Checked by [`LinkTranslator::is_legacy_link`] and
    /// [`LinkTranslator::legacy_key`]; it may differ from `legacy_host`.
    ///
    /// [`LinkTranslator::is_legacy_link`]: crate::LinkTranslator::is_legacy_link
    /// [`LinkTranslator::legacy_key`]: crate::LinkTranslator::legacy_key
    #[serde(default = "default_migration_host")]
    pub migration_host: String,
    /// Custom endpoint for S3-compatible stores.
    #[serde(default)]
    pub endpoint: Option<String>,
    #[serde(default)]
    pub force_path_style: bool,
    #[serde(default)]
    pub credentials: Option<Credentials>,
}

impl StoreConfig {
    #[must_use]
    pub fn new(bucket: impl Into<String>, region: impl Into<String>) -> Self {
        Self {
            bucket: bucket.into(),
            region: region.into(),
            legacy_host: default_legacy_host(),
            migration_host: default_migration_host(),
            endpoint: None,
            force_path_style: false,
            credentials: None,
        }
    }

    #[must_use]
    pub fn with_legacy_host(mut self, legacy_host: impl Into<String>) -> Self {
        self.legacy_host = legacy_host.into();
        self
    }

    #[must_use]
    pub fn with_migration_host(mut self, migration_host: impl Into<String>) -> Self {
        self.migration_host = migration_host.into();
        self
    }

    #[must_use]
    pub fn with_credentials(
        mut self,
        access_key: impl Into<String>,
        secret_key: impl Into<String>,
    ) -> Self {
        self.credentials = Some(Credentials {
            access_key: access_key.into(),
            secret_key: secret_key.into(),
        });
        self
    }

    /// # Errors
    ///
    /// Returns [`GatewayError::ConfigParse`] for malformed TOML or unknown
    /// keys.
    pub fn from_toml_str(raw: &str) -> Result<Self, GatewayError> {
        Ok(toml::from_str(raw)?)
    }

    /// Read the configuration from process environment variables.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::MissingSetting`] if the bucket or region is
    /// unset.
    pub fn from_env() -> Result<Self, GatewayError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build the configuration from any name-to-value lookup.
    ///
    /// Credentials are set only when both the access and secret key are
    /// present.
    ///
    /// # Errors
    ///
    /// Same as [`StoreConfig::from_env`].
    pub fn from_lookup<F>(lookup: F) -> Result<Self, GatewayError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |name: &'static str| {
            lookup(name)
                .filter(|value| !value.is_empty())
                .ok_or(GatewayError::MissingSetting { name })
        };

        let mut config = Self::new(required(ENV_BUCKET)?, required(ENV_REGION)?);
        if let Some(host) = lookup(ENV_LEGACY_HOST).filter(|v| !v.is_empty()) {
            config.legacy_host = host;
        }
        if let Some(host) = lookup(ENV_MIGRATION_HOST).filter(|v| !v.is_empty()) {
            config.migration_host = host;
        }
        config.endpoint = lookup(ENV_ENDPOINT).filter(|v| !v.is_empty());
        if let (Some(access_key), Some(secret_key)) = (lookup(ENV_ACCESS_KEY), lookup(ENV_SECRET_KEY))
        {
            config = config.with_credentials(access_key, secret_key);
        }
        Ok(config)
    }
}

use std::env;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use url::Url;

pub const DEFAULT_ENDPOINT_SUFFIX: &str = "blob.core.windows.net";

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{var} is not a valid url: {reason}")]
    InvalidUrl { var: &'static str, reason: String },

    #[error("{var} has unsupported value '{value}'")]
    InvalidValue { var: &'static str, value: String },
}

/// What to do when a blob with the same name already exists.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CollisionPolicy {
    /// Replace the existing blob (the store's own default).
    #[default]
    Overwrite,
    /// Fail the upload with a conflict instead of replacing.
    Reject,
}

impl FromStr for CollisionPolicy {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "overwrite" => Ok(Self::Overwrite),
            "reject" => Ok(Self::Reject),
            _ => Err(()),
        }
    }
}

/// Shared access signature query string. Never printed.
#[derive(Clone, PartialEq, Eq)]
pub struct SasToken(String);

impl SasToken {
    pub fn new(token: impl Into<String>) -> Self {
        let token = token.into();
        Self(token.trim().trim_start_matches('?').to_string())
    }

    pub fn as_query(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for SasToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SasToken(<redacted>)")
    }
}

/// Blob storage account settings.
#[derive(Debug, Clone)]
pub struct StorageConfig {
    pub account_name: Option<String>,
    pub sas_token: Option<SasToken>,
    pub container_name: Option<String>,
    pub endpoint_suffix: String,
    /// Full endpoint replacing `https://{account}.{suffix}`, e.g. a local emulator.
    pub endpoint: Option<Url>,
    pub collision_policy: CollisionPolicy,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            account_name: None,
            sas_token: None,
            container_name: None,
            endpoint_suffix: DEFAULT_ENDPOINT_SUFFIX.to_string(),
            endpoint: None,
            collision_policy: CollisionPolicy::default(),
        }
    }
}

/// Header and button settings for the shell.
#[derive(Debug, Clone)]
pub struct UiSettings {
    pub title: String,
    pub accent_color: Option<String>,
    pub show_share_button: bool,
    pub show_storage_button: bool,
    pub share_url: Option<String>,
}

impl Default for UiSettings {
    fn default() -> Self {
        Self {
            title: "Contoso".to_string(),
            accent_color: None,
            show_share_button: true,
            show_storage_button: true,
            share_url: None,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct AppConfig {
    pub storage: StorageConfig,
    pub ui: UiSettings,
}

impl AppConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration through an arbitrary key lookup.
    ///
    /// Missing storage credentials are not an error here; they surface as
    /// upload failures once a commit is attempted.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let endpoint = match non_empty("STORAGE_ENDPOINT") {
            Some(raw) => Some(Url::parse(raw.trim()).map_err(|e| ConfigError::InvalidUrl {
                var: "STORAGE_ENDPOINT",
                reason: e.to_string(),
            })?),
            None => None,
        };

        let collision_policy = match non_empty("BLOB_COLLISION_POLICY") {
            Some(raw) => raw.parse().map_err(|_| ConfigError::InvalidValue {
                var: "BLOB_COLLISION_POLICY",
                value: raw,
            })?,
            None => CollisionPolicy::default(),
        };

        let storage = StorageConfig {
            account_name: non_empty("STORAGE_ACCOUNT_NAME").map(|v| v.trim().to_string()),
            sas_token: non_empty("SAS_TOKEN").map(SasToken::new),
            container_name: non_empty("CONTAINER_NAME").map(|v| v.trim().to_string()),
            endpoint_suffix: non_empty("STORAGE_ENDPOINT_SUFFIX")
                .map(|v| v.trim().to_string())
                .unwrap_or_else(|| DEFAULT_ENDPOINT_SUFFIX.to_string()),
            endpoint,
            collision_policy,
        };

        let default = UiSettings::default();
        let flag = |key: &str, fallback: bool| {
            non_empty(key)
                .map(|v| v.to_lowercase() != "false" && v != "0")
                .unwrap_or(fallback)
        };

        let ui = UiSettings {
            title: non_empty("UI_TITLE").unwrap_or(default.title),
            accent_color: non_empty("UI_ACCENT_COLOR"),
            show_share_button: flag("SHOW_SHARE_BUTTON", default.show_share_button),
            show_storage_button: flag("SHOW_STORAGE_BUTTON", default.show_storage_button),
            share_url: non_empty("SHARE_URL"),
        };

        Ok(Self { storage, ui })
    }
}

impl StorageConfig {
    /// Base service url without credentials, if the account is known.
    pub fn service_url(&self) -> Option<Url> {
        if let Some(endpoint) = &self.endpoint {
            return Some(endpoint.clone());
        }
        let account = self.account_name.as_deref()?;
        Url::parse(&format!("https://{}.{}", account, self.endpoint_suffix)).ok()
    }

    /// Container url without credentials, used as the default share link.
    pub fn container_url(&self) -> Option<Url> {
        let mut url = self.service_url()?;
        let container = self.container_name.as_deref()?;
        url.path_segments_mut()
            .ok()?
            .pop_if_empty()
            .push(container);
        Some(url)
    }
}

//! `config.yml`: destination blog and OAuth client settings.

use crate::error::ConfigError;
use crate::oauth::Credential;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

pub const DEFAULT_CONFIG_FILE: &str = "config.yml";
/// Used as `author_email` of transferred comments unless configured.
pub const DEFAULT_COMMENT_EMAIL: &str = "comments@example.com";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub consumer_key: String,
    #[serde(default)]
    pub consumer_secret: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub oauth_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub oauth_token_secret: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub oauth_callback: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment_email: Option<String>,
}

impl Config {
    /// Read and validate a configuration file.
    pub fn load(path: &Path) -> Result<Config, ConfigError> {
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Config = serde_yaml::from_str(&text).map_err(|source| ConfigError::Yaml {
            path: path.to_path_buf(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    /// `url`, `consumerKey` and `consumerSecret` must be present.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.url.trim().is_empty() {
            return Err(ConfigError::Missing("url"));
        }
        if self.consumer_key.is_empty() {
            return Err(ConfigError::Missing("consumerKey"));
        }
        if self.consumer_secret.is_empty() {
            return Err(ConfigError::Missing("consumerSecret"));
        }
        Ok(())
    }

    /// The site root without a trailing slash.
    pub fn site(&self) -> &str {
        self.url.trim_end_matches('/')
    }

    /// The configured credential; authenticated only when both token
    /// fields are present.
    pub fn credential(&self) -> Credential {
        let credential = Credential::new(&self.consumer_key, &self.consumer_secret);
        match (&self.oauth_token, &self.oauth_token_secret) {
            (Some(token), Some(secret)) => credential.authenticated(token, secret),
            _ => credential,
        }
    }

    /// A copy holding the token of `credential`.
    pub fn with_credential(&self, credential: &Credential) -> Config {
        Config {
            oauth_token: credential.token().map(String::from),
            oauth_token_secret: credential.token_secret().map(String::from),
            ..self.clone()
        }
    }

    pub fn comment_email(&self) -> &str {
        self.comment_email
            .as_deref()
            .unwrap_or(DEFAULT_COMMENT_EMAIL)
    }

    pub fn to_yaml(&self) -> Result<String, serde_yaml::Error> {
        serde_yaml::to_string(self)
    }
}

//! OPERA Cloud integration credentials.

use serde::Deserialize;
use sha2::{Digest, Sha256};
use std::fmt;

use crate::errors::{Error, Result};

/// Integration credentials for one OPERA Cloud tenant.
///
/// Loaded once per session and never mutated afterwards.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub app_key: String,
    pub client_id: String,
    pub client_secret: String,
    pub username: String,
    pub password: String,
    pub hostname: String,
    pub external_system_id: String,
}

/// Shape of the pasted configuration document.
#[derive(Debug, Deserialize)]
struct ConfigDocument {
    authentication: Option<AuthenticationSection>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AuthenticationSection {
    xapikey: Option<String>,
    client_id: Option<String>,
    client_secret: Option<String>,
    username: Option<String>,
    password: Option<String>,
    hostname: Option<String>,
    external_system_id: Option<String>,
}

fn required(value: Option<String>, key: &str) -> Result<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .ok_or_else(|| Error::config(format!("missing 'authentication.{}'", key)))
}

impl Credentials {
    /// Parses the `{"authentication": {...}}` configuration document.
    ///
    /// Input that does not start with `{` is wrapped in braces first, so a
    /// bare `"authentication": {...}` fragment is accepted.
    pub fn from_config_json(input: &str) -> Result<Self> {
        let trimmed = input.trim();
        let document = if trimmed.starts_with('{') {
            trimmed.to_string()
        } else {
            format!("{{{}}}", trimmed)
        };

        let parsed: ConfigDocument = serde_json::from_str(&document)
            .map_err(|e| Error::config(format!("invalid configuration JSON: {}", e)))?;
        let auth = parsed
            .authentication
            .ok_or_else(|| Error::config("missing 'authentication' section"))?;

        Ok(Self {
            app_key: required(auth.xapikey, "xapikey")?,
            client_id: required(auth.client_id, "clientId")?,
            client_secret: required(auth.client_secret, "clientSecret")?,
            username: required(auth.username, "username")?,
            password: required(auth.password, "password")?,
            hostname: required(auth.hostname, "hostname")?
                .trim_end_matches('/')
                .to_string(),
            external_system_id: required(auth.external_system_id, "externalSystemId")?,
        })
    }

    /// Hex SHA-256 over every field; identifies a credential set in cache keys
    /// without holding the secrets themselves.
    pub fn fingerprint(&self) -> String {
        let mut hasher = Sha256::new();
        for field in [
            &self.app_key,
            &self.client_id,
            &self.client_secret,
            &self.username,
            &self.password,
            &self.hostname,
            &self.external_system_id,
        ] {
            hasher.update(field.as_bytes());
            hasher.update([0u8]);
        }
        hex::encode(hasher.finalize())
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("app_key", &"<redacted>")
            .field("client_id", &self.client_id)
            .field("client_secret", &"<redacted>")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("hostname", &self.hostname)
            .field("external_system_id", &self.external_system_id)
            .finish()
    }
}

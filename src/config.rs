use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;

use serde::Deserialize;

use crate::error::ConfigError;
use crate::validation::{validate_cpanel_url, validate_zone};

/// Keys looked up in a credentials secret.
pub const SECRET_USERNAME_KEY: &str = "username";
pub const SECRET_PASSWORD_KEY: &str = "password";
pub const SECRET_API_TOKEN_KEY: &str = "apiToken";

#[derive(Clone, Default, PartialEq, Eq)]
pub struct Credentials {
    pub username: String,
    pub password: String,
    /// Alternative to the password; takes precedence when non-empty.
    pub api_token: String,
}

impl Credentials {
    pub fn password(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
            api_token: String::new(),
        }
    }

    pub fn api_token(username: impl Into<String>, api_token: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: String::new(),
            api_token: api_token.into(),
        }
    }

    pub fn uses_api_token(&self) -> bool {
        !self.api_token.is_empty()
    }

    /// Build credentials from raw secret values.
    ///
    /// `username` is required, plus at least one of `password` and `apiToken`.
    pub fn from_secret_values(values: &BTreeMap<String, Vec<u8>>) -> Result<Self, ConfigError> {
        let text = |key: &str| {
            values
                .get(key)
                .map(|bytes| String::from_utf8_lossy(bytes).into_owned())
        };

        let username = text(SECRET_USERNAME_KEY).ok_or(ConfigError::MissingUsername)?;
        let password = text(SECRET_PASSWORD_KEY);
        let api_token = text(SECRET_API_TOKEN_KEY);
        if password.is_none() && api_token.is_none() {
            return Err(ConfigError::MissingCredentials);
        }

        Ok(Self {
            username,
            password: password.unwrap_or_default(),
            api_token: api_token.unwrap_or_default(),
        })
    }

    /// Read a mounted secret: one file per key inside `dir`.
    pub fn from_secret_dir(dir: &Path) -> Result<Self, ConfigError> {
        let mut values = BTreeMap::new();
        for key in [SECRET_USERNAME_KEY, SECRET_PASSWORD_KEY, SECRET_API_TOKEN_KEY] {
            let path = dir.join(key);
            match std::fs::read(&path) {
                Ok(bytes) => {
                    values.insert(key.to_string(), trim_trailing_newline(bytes));
                }
                Err(err) if err.kind() == std::io::ErrorKind::NotFound => {}
                Err(source) => {
                    return Err(ConfigError::SecretIo {
                        path: path.display().to_string(),
                        source,
                    });
                }
            }
        }
        Self::from_secret_values(&values)
    }
}

fn trim_trailing_newline(mut bytes: Vec<u8>) -> Vec<u8> {
    while matches!(bytes.last().copied(), Some(b'\n' | b'\r')) {
        bytes.pop();
    }
    bytes
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let redact = |s: &str| if s.is_empty() { "" } else { "<redacted>" };
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &redact(&self.password))
            .field("api_token", &redact(&self.api_token))
            .finish()
    }
}

/// Everything a `CpanelClient` needs; immutable once built.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub base_url: String, // e.g. "https://cpanel.example.com:2083"
    pub zone: String,     // "example.com." as resolved by the issuer
    pub credentials: Credentials,
}

impl ClientConfig {
    pub fn new(
        base_url: impl Into<String>,
        zone: impl Into<String>,
        credentials: Credentials,
    ) -> Result<Self, ConfigError> {
        let base_url = base_url.into();
        let zone = zone.into();
        validate_cpanel_url(&base_url).map_err(|_| ConfigError::InvalidUrl(base_url.clone()))?;
        validate_zone(&zone).map_err(|e| ConfigError::InvalidZone {
            zone: zone.clone(),
            reason: e.to_string(),
        })?;
        Ok(Self {
            base_url,
            zone,
            credentials,
        })
    }

    /// cPanel wants `example.com`, not `example.com.`.
    pub fn zone_root(&self) -> &str {
        self.zone.trim_end_matches('.')
    }

    /// Base URL without a trailing slash.
    pub fn base_url_root(&self) -> &str {
        self.base_url.trim_end_matches('/')
    }

    /// Strip the zone from `_acme-challenge.www.example.com.` to get the
    /// zone-relative name. Names outside the zone pass through unchanged.
    pub fn relative_name<'a>(&self, record_name: &'a str) -> &'a str {
        let zone = self.zone_root();
        record_name
            .trim_end_matches('.')
            .strip_suffix(zone)
            .and_then(|prefix| prefix.strip_suffix('.'))
            .filter(|sub| !sub.is_empty())
            .unwrap_or(record_name)
    }
}

/// Per-challenge solver configuration supplied by the issuer.
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SolverConfig {
    /// URL of the cPanel instance, e.g. https://cpanel.mydomain.com
    #[serde(default)]
    pub cpanel_url: String,
    /// "namespace/secret-name" of the credentials secret.
    #[serde(default)]
    pub secret_ref: String,
}

impl SolverConfig {
    /// Missing configuration decodes to the defaults.
    pub fn from_json(raw: Option<&serde_json::Value>) -> Result<Self, ConfigError> {
        match raw {
            None | Some(serde_json::Value::Null) => Ok(Self::default()),
            Some(value) => Ok(Self::deserialize(value)?),
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.cpanel_url.is_empty() {
            return Err(ConfigError::MissingCpanelUrl);
        }
        validate_cpanel_url(&self.cpanel_url)
            .map_err(|_| ConfigError::InvalidUrl(self.cpanel_url.clone()))
    }

    pub fn secret_ref(&self) -> Result<SecretRef<'_>, ConfigError> {
        let invalid = || ConfigError::InvalidSecretRef(self.secret_ref.clone());
        let (namespace, name) = self.secret_ref.split_once('/').ok_or_else(invalid)?;
        if namespace.is_empty() || name.is_empty() || name.contains('/') {
            return Err(invalid());
        }
        Ok(SecretRef { namespace, name })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SecretRef<'a> {
    pub namespace: &'a str,
    pub name: &'a str,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn secret(pairs: &[(&str, &str)]) -> BTreeMap<String, Vec<u8>> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.as_bytes().to_vec()))
            .collect()
    }

    fn config(zone: &str) -> ClientConfig {
        ClientConfig::new(
            "https://cpanel.test-domain.com",
            zone,
            Credentials::password("user", "password"),
        )
        .unwrap()
    }

    #[test]
    fn credentials_from_full_secret() {
        let creds = Credentials::from_secret_values(&secret(&[
            ("username", "user"),
            ("password", "password"),
            ("apiToken", "apiToken"),
        ]))
        .unwrap();

        assert_eq!(creds.username, "user");
        assert_eq!(creds.password, "password");
        assert_eq!(creds.api_token, "apiToken");
        assert!(creds.uses_api_token());
    }

    #[test]
    fn credentials_need_username() {
        let err = Credentials::from_secret_values(&secret(&[("password", "password")]))
            .unwrap_err();
        assert_eq!(err.to_string(), "username field not present in secret");
    }

    #[test]
    fn credentials_need_password_or_token() {
        let err = Credentials::from_secret_values(&secret(&[("username", "user")])).unwrap_err();
        assert_eq!(
            err.to_string(),
            "password or API token field not present in secret"
        );

        let token_only =
            Credentials::from_secret_values(&secret(&[("username", "u"), ("apiToken", "t")]))
                .unwrap();
        assert_eq!(token_only.password, "");
        assert!(token_only.uses_api_token());
    }

    #[test]
    fn credentials_from_dir() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("username"), "user\n").unwrap();
        std::fs::write(dir.path().join("apiToken"), "tok").unwrap();

        let creds = Credentials::from_secret_dir(dir.path()).unwrap();
        assert_eq!(creds, Credentials::api_token("user", "tok"));
    }

    #[test]
    fn debug_redacts_secrets() {
        let shown = format!("{:?}", Credentials::password("user", "hunter2"));
        assert!(shown.contains("user"));
        assert!(!shown.contains("hunter2"));
    }

    #[test]
    fn relative_names() {
        let cfg = config("test-domain.com.");
        assert_eq!(cfg.zone_root(), "test-domain.com");
        assert_eq!(cfg.relative_name("dummy.test-domain.com."), "dummy");
        assert_eq!(
            cfg.relative_name("_acme-challenge.www.test-domain.com."),
            "_acme-challenge.www"
        );
        assert_eq!(cfg.relative_name("dummy.other.com."), "dummy.other.com.");
        assert_eq!(
            cfg.relative_name("dummytest-domain.com."),
            "dummytest-domain.com."
        );

        let underscored = config("_sub.test-domain.com.");
        assert_eq!(underscored.relative_name("dummy._sub.test-domain.com."), "dummy");

        let no_dot = config("test-domain.com");
        assert_eq!(no_dot.relative_name("dummy.test-domain.com."), "dummy");
    }

    #[test]
    fn client_config_rejects_bad_input() {
        let creds = Credentials::password("u", "p");
        assert!(matches!(
            ClientConfig::new("cpanel.example.com", "example.com.", creds.clone()),
            Err(ConfigError::InvalidUrl(_))
        ));
        assert!(matches!(
            ClientConfig::new("https://cpanel.example.com", "", creds),
            Err(ConfigError::InvalidZone { .. })
        ));
    }

    #[test]
    fn solver_config_decoding() {
        assert_eq!(SolverConfig::from_json(None).unwrap(), SolverConfig::default());

        let raw = serde_json::json!({
            "cpanelUrl": "https://cpanel.example.com",
            "secretRef": "cert-manager/cpanel-credentials"
        });
        let cfg = SolverConfig::from_json(Some(&raw)).unwrap();
        cfg.validate().unwrap();
        assert_eq!(
            cfg.secret_ref().unwrap(),
            SecretRef {
                namespace: "cert-manager",
                name: "cpanel-credentials"
            }
        );

        let bad = serde_json::json!({ "cpanelUrl": 42 });
        assert!(matches!(
            SolverConfig::from_json(Some(&bad)),
            Err(ConfigError::Json(_))
        ));
    }

    #[test]
    fn solver_config_validation() {
        assert!(matches!(
            SolverConfig::default().validate(),
            Err(ConfigError::MissingCpanelUrl)
        ));

        for bad in ["", "just-a-name", "/name", "ns/", "a/b/c"] {
            let cfg = SolverConfig {
                cpanel_url: "https://cpanel.example.com".into(),
                secret_ref: bad.into(),
            };
            assert!(
                matches!(cfg.secret_ref(), Err(ConfigError::InvalidSecretRef(_))),
                "{bad}"
            );
        }
    }
}

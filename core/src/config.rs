//! Connection parameters for a `RestClient`.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Where and how to reach the cluster.
///
/// Deserializable so callers can keep it next to the rest of their
/// configuration. Missing `endpoint` means the base URL itself; missing
/// `verify_ssl` means certificates are verified.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientConfig {
    pub url: String,
    #[serde(default)]
    pub endpoint: String,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
    #[serde(default = "default_verify_ssl")]
    pub verify_ssl: bool,
}

fn default_verify_ssl() -> bool {
    true
}

// password is redacted
impl fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientConfig")
            .field("url", &self.url)
            .field("endpoint", &self.endpoint)
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "***"))
            .field("verify_ssl", &self.verify_ssl)
            .finish()
    }
}

impl ClientConfig {
    pub fn new(url: &str) -> Self {
        Self {
            url: url.to_string(),
            endpoint: String::new(),
            username: None,
            password: None,
            verify_ssl: true,
        }
    }

    pub fn with_endpoint(mut self, endpoint: &str) -> Self {
        self.endpoint = endpoint.to_string();
        self
    }

    pub fn with_credentials(mut self, username: &str, password: &str) -> Self {
        self.username = Some(username.to_string());
        self.password = Some(password.to_string());
        self
    }

    pub fn with_verify_ssl(mut self, verify_ssl: bool) -> Self {
        self.verify_ssl = verify_ssl;
        self
    }

    /// Join `url` and `endpoint` with exactly one slash added when `url`
    /// does not already end in one. The result is not validated.
    pub fn prepare_url(&self) -> String {
        if self.url.ends_with('/') {
            format!("{}{}", self.url, self.endpoint)
        } else {
            format!("{}/{}", self.url, self.endpoint)
        }
    }

    /// Username and password, only when both are set.
    pub fn credentials(&self) -> Option<(&str, &str)> {
        match (&self.username, &self.password) {
            (Some(user), Some(password)) => Some((user.as_str(), password.as_str())),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prepare_url_inserts_slash() {
        let config = ClientConfig::new("http://localhost:9200").with_endpoint("_mapping/index");
        assert_eq!(config.prepare_url(), "http://localhost:9200/_mapping/index");
    }

    #[test]
    fn prepare_url_keeps_existing_slash() {
        let config = ClientConfig::new("http://localhost:9200/").with_endpoint("index/_search");
        assert_eq!(config.prepare_url(), "http://localhost:9200/index/_search");
    }

    #[test]
    fn prepare_url_with_empty_endpoint() {
        assert_eq!(ClientConfig::new("http://localhost:9200").prepare_url(), "http://localhost:9200/");
        assert_eq!(ClientConfig::new("http://localhost:9200/").prepare_url(), "http://localhost:9200/");
    }

    #[test]
    fn prepare_url_does_not_collapse_slashes() {
        let config = ClientConfig::new("http://localhost:9200/").with_endpoint("/index");
        assert_eq!(config.prepare_url(), "http://localhost:9200//index");
    }

    #[test]
    fn credentials_require_both_parts() {
        let mut config = ClientConfig::new("http://localhost:9200");
        assert!(config.credentials().is_none());

        config.username = Some("elastic".to_string());
        assert!(config.credentials().is_none());

        config.username = None;
        config.password = Some("changeme".to_string());
        assert!(config.credentials().is_none());

        let config = config.with_credentials("elastic", "changeme");
        assert_eq!(config.credentials(), Some(("elastic", "changeme")));
    }

    #[test]
    fn debug_hides_password() {
        let config = ClientConfig::new("http://localhost:9200").with_credentials("elastic", "changeme");
        let printed = format!("{config:?}");
        assert!(printed.contains("elastic"));
        assert!(!printed.contains("changeme"));
    }

    #[test]
    fn deserialize_applies_defaults() {
        let config: ClientConfig = serde_json::from_str(r#"{"url":"http://localhost:9200"}"#).unwrap();
        assert_eq!(config, ClientConfig::new("http://localhost:9200"));
        assert!(config.verify_ssl);
    }

    #[test]
    fn deserialize_full_config() {
        let config: ClientConfig = serde_json::from_str(
            r#"{"url":"https://es:9200","endpoint":"logs/_search","username":"u","password":"p","verify_ssl":false}"#,
        )
        .unwrap();
        assert_eq!(config.endpoint, "logs/_search");
        assert_eq!(config.credentials(), Some(("u", "p")));
        assert!(!config.verify_ssl);
    }
}

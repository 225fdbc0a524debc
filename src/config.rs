//! Storage client configuration.
//!
//! The process environment is read once, at the composition root, by
//! [`StorageConfig::from_env`]. Everything below that point receives an
//! explicit [`StorageConfig`].

use serde::{Deserialize, Serialize};

/// Default VOSpace web service host.
pub const DEFAULT_VOSPACE_HOST: &str = "spsrc27.iaa.csic.es";

/// Service endpoint override.
pub const VOSPACE_WEBSERVICE_ENV: &str = "VOSPACE_WEBSERVICE";

/// Local (plain HTTP) service endpoint override.
pub const LOCAL_VOSPACE_WEBSERVICE_ENV: &str = "LOCAL_VOSPACE_WEBSERVICE";

/// Default user agent sent on every session.
pub const DEFAULT_USER_AGENT: &str = concat!("canfar-storage/", env!("CARGO_PKG_VERSION"));

/// Where VOSpace web service requests are sent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "host", rename_all = "snake_case")]
pub enum ServiceEndpoint {
    /// Remote host reached over HTTPS.
    Remote(String),
    /// Local development host reached over plain HTTP.
    Local(String),
}

impl ServiceEndpoint {
    /// Host (or URL) as configured.
    pub fn host(&self) -> &str {
        match self {
            Self::Remote(h) | Self::Local(h) => h,
        }
    }

    /// Base URL for web service calls, without a trailing slash.
    ///
    /// A host that already carries a scheme is used verbatim.
    pub fn base_url(&self) -> String {
        let host = self.host().trim_end_matches('/');
        if host.contains("://") {
            return host.to_string();
        }
        match self {
            Self::Remote(_) => format!("https://{host}"),
            Self::Local(_) => format!("http://{host}"),
        }
    }
}

impl Default for ServiceEndpoint {
    fn default() -> Self {
        Self::Remote(DEFAULT_VOSPACE_HOST.to_string())
    }
}

/// Configuration for [`crate::storage::StorageClient`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageConfig {
    pub service_endpoint: ServiceEndpoint,
    pub user_agent: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            service_endpoint: ServiceEndpoint::default(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

impl StorageConfig {
    /// Build the configuration from the process environment.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the configuration from an arbitrary variable lookup.
    ///
    /// `LOCAL_VOSPACE_WEBSERVICE` takes precedence over `VOSPACE_WEBSERVICE`.
    /// Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let service_endpoint = if let Some(host) = get(LOCAL_VOSPACE_WEBSERVICE_ENV) {
            ServiceEndpoint::Local(host)
        } else if let Some(host) = get(VOSPACE_WEBSERVICE_ENV) {
            ServiceEndpoint::Remote(host)
        } else {
            tracing::debug!(target: "canfar::storage", host = DEFAULT_VOSPACE_HOST, "Using default VOSpace host");
            ServiceEndpoint::default()
        };

        Self {
            service_endpoint,
            ..Self::default()
        }
    }

    pub fn with_service_endpoint(mut self, endpoint: ServiceEndpoint) -> Self {
        self.service_endpoint = endpoint;
        self
    }

    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_when_nothing_set() {
        let config = StorageConfig::from_lookup(lookup(&[]));
        assert_eq!(
            config.service_endpoint,
            ServiceEndpoint::Remote(DEFAULT_VOSPACE_HOST.to_string())
        );
        assert_eq!(config.user_agent, DEFAULT_USER_AGENT);
    }

    #[test]
    fn remote_override() {
        let config = StorageConfig::from_lookup(lookup(&[(
            VOSPACE_WEBSERVICE_ENV,
            "ws-cadc.canfar.net",
        )]));
        assert_eq!(
            config.service_endpoint,
            ServiceEndpoint::Remote("ws-cadc.canfar.net".into())
        );
        assert_eq!(
            config.service_endpoint.base_url(),
            "https://ws-cadc.canfar.net"
        );
    }

    #[test]
    fn local_override_wins() {
        let config = StorageConfig::from_lookup(lookup(&[
            (VOSPACE_WEBSERVICE_ENV, "ws-cadc.canfar.net"),
            (LOCAL_VOSPACE_WEBSERVICE_ENV, "localhost:8080"),
        ]));
        assert_eq!(
            config.service_endpoint,
            ServiceEndpoint::Local("localhost:8080".into())
        );
        assert_eq!(config.service_endpoint.base_url(), "http://localhost:8080");
    }

    #[test]
    fn empty_override_is_ignored() {
        let config = StorageConfig::from_lookup(lookup(&[(VOSPACE_WEBSERVICE_ENV, "  ")]));
        assert_eq!(config.service_endpoint, ServiceEndpoint::default());
    }

    #[test]
    fn base_url_keeps_explicit_scheme() {
        let ep = ServiceEndpoint::Remote("http://127.0.0.1:9000/".into());
        assert_eq!(ep.base_url(), "http://127.0.0.1:9000");
    }

    #[test]
    fn config_serde_shape() {
        let config = StorageConfig::default().with_user_agent("test-agent");
        let json = serde_json::to_value(&config).unwrap();
        assert_eq!(json["service_endpoint"]["kind"], "remote");
        assert_eq!(json["service_endpoint"]["host"], DEFAULT_VOSPACE_HOST);
        let back: StorageConfig = serde_json::from_value(json).unwrap();
        assert_eq!(back, config);
    }
}

//! Authentication context and Bearer adaptation.
//!
//! An [`AuthContextProvider`] reports how the current process authenticates
//! against CANFAR. The storage client reads it once, when its VOSpace client
//! is first built, and installs [`bearer::BearerEndpoints`] when a Bearer
//! token is available.

use chrono::{DateTime, Utc};
use secrecy::{ExposeSecret, SecretString};
use std::path::PathBuf;

pub mod bearer;

pub use bearer::{BearerEndpoints, EndpointRegistry};

/// The active authentication mode.
#[derive(Debug, Clone)]
pub enum AuthContext {
    /// OAuth2 access token, sent as `Authorization: Bearer <token>`.
    Bearer {
        token: SecretString,
        expires_at: Option<DateTime<Utc>>,
    },
    /// X.509 proxy certificate handled by the transport. No token.
    Certificate { cert_path: PathBuf },
    /// No credentials; public operations only.
    Anonymous,
}

impl AuthContext {
    /// Bearer context without a known expiry.
    pub fn bearer(token: impl Into<String>) -> Self {
        Self::Bearer {
            token: SecretString::from(token.into()),
            expires_at: None,
        }
    }

    /// The access token, if this is a non-empty Bearer context.
    pub fn bearer_token(&self) -> Option<&SecretString> {
        match self {
            Self::Bearer { token, .. } if !token.expose_secret().is_empty() => Some(token),
            _ => None,
        }
    }

    /// Whether a Bearer token has passed its expiry.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        match self {
            Self::Bearer {
                expires_at: Some(exp),
                ..
            } => *exp <= now,
            _ => false,
        }
    }

    /// Short mode name for logs.
    pub fn mode(&self) -> &'static str {
        match self {
            Self::Bearer { .. } => "bearer",
            Self::Certificate { .. } => "certificate",
            Self::Anonymous => "anonymous",
        }
    }
}

/// Source of the process-wide authentication context.
pub trait AuthContextProvider: Send + Sync {
    /// Returns the currently active context.
    fn active_context(&self) -> AuthContext;
}

/// A provider that always returns the same context.
///
/// Useful for tests and for callers that manage login themselves.
pub struct StaticContextProvider {
    context: AuthContext,
}

impl StaticContextProvider {
    pub fn new(context: AuthContext) -> Self {
        Self { context }
    }

    pub fn bearer(token: impl Into<String>) -> Self {
        Self::new(AuthContext::bearer(token))
    }

    pub fn anonymous() -> Self {
        Self::new(AuthContext::Anonymous)
    }
}

impl AuthContextProvider for StaticContextProvider {
    fn active_context(&self) -> AuthContext {
        self.context.clone()
    }
}

impl<F> AuthContextProvider for F
where
    F: Fn() -> AuthContext + Send + Sync,
{
    fn active_context(&self) -> AuthContext {
        self()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn bearer_token_only_in_bearer_mode() {
        let ctx = AuthContext::bearer("abc123");
        assert_eq!(ctx.bearer_token().unwrap().expose_secret(), "abc123");
        assert_eq!(ctx.mode(), "bearer");

        let cert = AuthContext::Certificate {
            cert_path: PathBuf::from("/home/user/.ssl/cadcproxy.pem"),
        };
        assert!(cert.bearer_token().is_none());
        assert!(AuthContext::Anonymous.bearer_token().is_none());
    }

    #[test]
    fn empty_token_is_no_token() {
        assert!(AuthContext::bearer("").bearer_token().is_none());
    }

    #[test]
    fn expiry() {
        let now = Utc::now();
        let ctx = AuthContext::Bearer {
            token: SecretString::from("t".to_string()),
            expires_at: Some(now - Duration::minutes(1)),
        };
        assert!(ctx.is_expired_at(now));
        assert!(!AuthContext::bearer("t").is_expired_at(now));
    }

    #[test]
    fn closure_provider() {
        let provider = || AuthContext::Anonymous;
        assert_eq!(provider.active_context().mode(), "anonymous");
    }
}

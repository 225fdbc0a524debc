//! VOSpace URIs and the resource identifiers derived from them.
//!
//! `vos://canfar.itsrc.oact.inaf.it~cavern/home/user` names node `home/user`
//! on service `cavern` at authority `canfar.itsrc.oact.inaf.it`. The
//! `(authority, service)` pair is the [`ResourceId`] that keys endpoints.

use crate::error::StorageError;
use std::fmt;
use std::str::FromStr;

/// Service name used when an authority does not carry one.
pub const DEFAULT_SERVICE: &str = "cavern";

const SCHEME: &str = "vos:";

/// Identifies one VOSpace service, e.g. `ivo://canfar.itsrc.oact.inaf.it/cavern`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ResourceId {
    authority: String,
    service: String,
}

impl ResourceId {
    pub fn new(authority: impl Into<String>, service: impl Into<String>) -> Self {
        Self {
            authority: authority.into(),
            service: service.into(),
        }
    }

    pub fn authority(&self) -> &str {
        &self.authority
    }

    pub fn service(&self) -> &str {
        &self.service
    }
}

impl fmt::Display for ResourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ivo://{}/{}", self.authority, self.service)
    }
}

/// A parsed `vos:` URI.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct VosUri {
    resource_id: ResourceId,
    path: String,
}

impl VosUri {
    /// Parse a fully qualified `vos://authority[~service]/path` URI.
    pub fn parse(uri: &str) -> Result<Self, StorageError> {
        Self::parse_with_default(uri, None)
    }

    /// Parse a URI, resolving the short `vos:path` form against `default`.
    pub fn parse_with_default(
        uri: &str,
        default: Option<&ResourceId>,
    ) -> Result<Self, StorageError> {
        let trimmed = uri.trim();
        let rest = trimmed
            .strip_prefix(SCHEME)
            .ok_or_else(|| StorageError::invalid_uri(uri, "scheme must be 'vos:'"))?;

        let Some(rest) = rest.strip_prefix("//") else {
            let resource_id = default
                .cloned()
                .ok_or_else(|| StorageError::invalid_uri(uri, "no authority and no default"))?;
            return Ok(Self {
                resource_id,
                path: normalize_path(rest),
            });
        };

        let (authority, path) = rest.split_once('/').unwrap_or((rest, ""));
        // Both separators appear in the wild: '~' for CANFAR, '!' for CADC.
        let (host, service) = match authority.split_once(['~', '!']) {
            Some((host, service)) => (host, service),
            None => (authority, DEFAULT_SERVICE),
        };
        if host.is_empty() {
            return Err(StorageError::invalid_uri(uri, "empty authority"));
        }
        if service.is_empty() {
            return Err(StorageError::invalid_uri(uri, "empty service name"));
        }

        Ok(Self {
            resource_id: ResourceId::new(host, service),
            path: normalize_path(path),
        })
    }

    pub fn resource_id(&self) -> &ResourceId {
        &self.resource_id
    }

    /// Node path without leading or trailing slashes; empty for the root.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Path segments, skipping empty ones.
    pub fn segments(&self) -> impl Iterator<Item = &str> {
        self.path.split('/').filter(|s| !s.is_empty())
    }
}

fn normalize_path(path: &str) -> String {
    path.split('/')
        .filter(|s| !s.is_empty() && *s != ".")
        .collect::<Vec<_>>()
        .join("/")
}

impl FromStr for VosUri {
    type Err = StorageError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for VosUri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "vos://{}~{}/{}",
            self.resource_id.authority, self.resource_id.service, self.path
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_canfar_uri() {
        let uri = VosUri::parse("vos://canfar.itsrc.oact.inaf.it~cavern/home/").unwrap();
        assert_eq!(uri.resource_id().authority(), "canfar.itsrc.oact.inaf.it");
        assert_eq!(uri.resource_id().service(), "cavern");
        assert_eq!(uri.path(), "home");
        assert_eq!(
            uri.resource_id().to_string(),
            "ivo://canfar.itsrc.oact.inaf.it/cavern"
        );
    }

    #[test]
    fn parses_bang_separator_and_default_service() {
        let uri = VosUri::parse("vos://cadc.nrc.ca!vault/user/data.fits").unwrap();
        assert_eq!(uri.resource_id(), &ResourceId::new("cadc.nrc.ca", "vault"));
        assert_eq!(uri.segments().collect::<Vec<_>>(), vec!["user", "data.fits"]);

        let uri = VosUri::parse("vos://example.org/a//b/").unwrap();
        assert_eq!(uri.resource_id().service(), DEFAULT_SERVICE);
        assert_eq!(uri.path(), "a/b");
    }

    #[test]
    fn same_service_same_resource_id() {
        let a = VosUri::parse("vos://host~cavern/home/a").unwrap();
        let b = VosUri::parse("vos://host~cavern/projects/b").unwrap();
        assert_eq!(a.resource_id(), b.resource_id());
    }

    #[test]
    fn short_form_needs_default() {
        assert!(matches!(
            VosUri::parse("vos:home/user"),
            Err(StorageError::InvalidUri { .. })
        ));
        let default = ResourceId::new("host", "cavern");
        let uri = VosUri::parse_with_default("vos:home/user", Some(&default)).unwrap();
        assert_eq!(uri.resource_id(), &default);
        assert_eq!(uri.path(), "home/user");
        assert_eq!(uri.to_string(), "vos://host~cavern/home/user");
    }

    #[test]
    fn rejects_bad_uris() {
        for bad in ["http://host/x", "vos:///path", "vos://host~/x", ""] {
            assert!(VosUri::parse(bad).is_err(), "{bad} should not parse");
        }
    }

    #[test]
    fn root_path() {
        let uri: VosUri = "vos://host~cavern".parse().unwrap();
        assert_eq!(uri.path(), "");
        assert_eq!(uri.segments().count(), 0);
    }
}

//! Bearer-only authentication over an [`EndpointResolver`].
//!
//! [`BearerEndpoints`] decorates a resolver. After the inner resolver returns
//! an endpoint, the endpoint's session headers are rewritten once: the
//! delegation token header is dropped and `Authorization: Bearer <token>` is
//! set unless an `Authorization` header is already there. Some VOSpace
//! servers reject requests that carry both headers.
//!
//! Each endpoint moves `unregistered -> adapted` at most once per decorator.
//! Endpoints that cannot expose their session are logged and returned
//! unmodified.

use crate::error::{StorageError, StructuralAccessError};
use crate::utils::http_headers::{apply_bearer_only, bearer_value, format_headers_for_logging};
use crate::vos::client::EndpointResolver;
use crate::vos::endpoint::SessionAccess;
use crate::vos::uri::{ResourceId, VosUri};
use reqwest::header::HeaderValue;
use secrecy::{ExposeSecret, SecretString};
use std::collections::HashSet;

/// Resource ids whose endpoints have been adapted. Insert-only.
#[derive(Debug, Default, Clone)]
pub struct EndpointRegistry {
    adapted: HashSet<ResourceId>,
}

impl EndpointRegistry {
    pub fn contains(&self, id: &ResourceId) -> bool {
        self.adapted.contains(id)
    }

    /// Returns `false` if `id` was already registered.
    pub fn insert(&mut self, id: ResourceId) -> bool {
        self.adapted.insert(id)
    }

    pub fn len(&self) -> usize {
        self.adapted.len()
    }

    pub fn is_empty(&self) -> bool {
        self.adapted.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ResourceId> {
        self.adapted.iter()
    }
}

/// Endpoint resolver that switches every endpoint to Bearer-only auth.
pub struct BearerEndpoints<C> {
    inner: C,
    token: SecretString,
    bearer: HeaderValue,
    registry: EndpointRegistry,
}

impl<C: EndpointResolver> BearerEndpoints<C> {
    /// Wrap `inner`. Fails if the token cannot be used as a header value.
    pub fn new(inner: C, token: SecretString) -> Result<Self, StorageError> {
        let bearer = bearer_value(token.expose_secret())?;
        Ok(Self::with_header(inner, token, bearer))
    }

    /// Wrap `inner` with a prebuilt `Authorization` value for `token`.
    pub(crate) fn with_header(inner: C, token: SecretString, bearer: HeaderValue) -> Self {
        tracing::debug!(target: "canfar::vospace", "Configured VOSpace client to use Bearer authentication");
        Self {
            inner,
            token,
            bearer,
            registry: EndpointRegistry::default(),
        }
    }

    pub fn inner(&self) -> &C {
        &self.inner
    }

    /// Direct access to the wrapped resolver. Endpoints resolved through it
    /// are not adapted.
    pub fn inner_mut(&mut self) -> &mut C {
        &mut self.inner
    }

    pub fn into_inner(self) -> C {
        self.inner
    }

    pub fn registry(&self) -> &EndpointRegistry {
        &self.registry
    }
}

/// Rewrite both header maps, then record the subject token.
///
/// If the subject cannot take the token the header maps are restored, so a
/// failed adaptation leaves the endpoint as it was.
fn adapt<E: SessionAccess + ?Sized>(
    endpoint: &mut E,
    bearer: &HeaderValue,
    token: &SecretString,
) -> Result<(), StructuralAccessError> {
    let headers = endpoint.session_headers()?;
    let original = (headers.persistent.clone(), headers.live.clone());
    apply_bearer_only(headers.persistent, bearer);
    apply_bearer_only(headers.live, bearer);
    tracing::debug!(
        target: "canfar::vospace",
        "Bearer-only session headers: {}",
        format_headers_for_logging(headers.live)
    );

    if let Err(e) = endpoint.set_subject_token(token) {
        if let Ok(headers) = endpoint.session_headers() {
            *headers.persistent = original.0;
            *headers.live = original.1;
        }
        return Err(e);
    }
    Ok(())
}

impl<C: EndpointResolver> EndpointResolver for BearerEndpoints<C> {
    type Endpoint = C::Endpoint;

    fn get_endpoint(&mut self, uri: &VosUri) -> Result<&mut Self::Endpoint, StorageError> {
        let endpoint = self.inner.get_endpoint(uri)?;
        let resource_id = endpoint.resource_id().clone();
        if self.registry.contains(&resource_id) {
            return Ok(endpoint);
        }

        match adapt(endpoint, &self.bearer, &self.token) {
            Ok(()) => {
                tracing::debug!(target: "canfar::vospace", resource_id = %resource_id, "Configured Bearer auth for endpoint");
                self.registry.insert(resource_id);
            }
            Err(e) => {
                tracing::warn!(target: "canfar::vospace", uri = %uri, "Could not set auth for {}: {}", uri, e);
            }
        }
        Ok(endpoint)
    }
}

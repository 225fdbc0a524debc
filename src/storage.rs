//! Storage client for CANFAR Cavern.
//!
//! [`StorageClient`] builds its VOSpace client lazily, on the first call to
//! [`StorageClient::storage_client`], from the authentication context active
//! at that moment. The handle is then reused for the lifetime of the
//! `StorageClient`; later token changes are not picked up.
//!
//! ```rust,ignore
//! use canfar_storage::prelude::*;
//!
//! let mut storage = StorageClient::from_env(StaticContextProvider::bearer(token));
//! let uri = VosUri::parse("vos://canfar.itsrc.oact.inaf.it~cavern/home/")?;
//! let node = storage.storage_client()?.get_node(&uri).await?;
//! ```

use crate::auth::{AuthContextProvider, BearerEndpoints};
use crate::config::StorageConfig;
use crate::error::StorageError;
use crate::utils::http_headers::bearer_value;
use crate::vos::client::{EndpointResolver, VosClient, fetch_node};
use crate::vos::endpoint::Endpoint;
use crate::vos::uri::VosUri;
use secrecy::{ExposeSecret, SecretString};
use std::sync::Arc;

/// Builds the wrapped VOSpace client.
pub trait ClientFactory {
    type Client: EndpointResolver;

    fn build(&self, config: &StorageConfig) -> Result<Self::Client, StorageError>;
}

impl<F, C> ClientFactory for F
where
    F: Fn(&StorageConfig) -> Result<C, StorageError>,
    C: EndpointResolver,
{
    type Client = C;

    fn build(&self, config: &StorageConfig) -> Result<C, StorageError> {
        self(config)
    }
}

/// The VOSpace client handed out by [`StorageClient`].
pub enum StorageHandle<C> {
    /// No Bearer token: resolution goes straight to the wrapped client.
    Plain(C),
    /// Bearer token captured: endpoints are adapted on first resolution.
    Bearer(BearerEndpoints<C>),
}

impl<C: EndpointResolver> StorageHandle<C> {
    /// The wrapped client.
    pub fn client(&self) -> &C {
        match self {
            Self::Plain(c) => c,
            Self::Bearer(b) => b.inner(),
        }
    }

    /// The Bearer decorator, when one is installed.
    pub fn bearer(&self) -> Option<&BearerEndpoints<C>> {
        match self {
            Self::Plain(_) => None,
            Self::Bearer(b) => Some(b),
        }
    }

    pub fn is_bearer(&self) -> bool {
        matches!(self, Self::Bearer(_))
    }
}

impl<C: EndpointResolver> EndpointResolver for StorageHandle<C> {
    type Endpoint = C::Endpoint;

    fn get_endpoint(&mut self, uri: &VosUri) -> Result<&mut C::Endpoint, StorageError> {
        match self {
            Self::Plain(c) => c.get_endpoint(uri),
            Self::Bearer(b) => b.get_endpoint(uri),
        }
    }
}

impl<C: EndpointResolver<Endpoint = Endpoint>> StorageHandle<C> {
    /// Fetch the raw node document for `uri`.
    pub async fn get_node(&mut self, uri: &VosUri) -> Result<String, StorageError> {
        fetch_node(self, uri).await
    }
}

type DefaultFactory = fn(&StorageConfig) -> Result<VosClient, StorageError>;

/// Lazily-built, authenticated access to VOSpace storage.
pub struct StorageClient<F: ClientFactory = DefaultFactory> {
    config: StorageConfig,
    auth: Arc<dyn AuthContextProvider>,
    factory: F,
    handle: Option<StorageHandle<F::Client>>,
}

impl StorageClient {
    /// Storage client over [`VosClient`] with an explicit configuration.
    pub fn new(config: StorageConfig, auth: impl AuthContextProvider + 'static) -> Self {
        Self::with_factory(config, auth, VosClient::from_config as DefaultFactory)
    }

    /// Storage client configured from the process environment.
    pub fn from_env(auth: impl AuthContextProvider + 'static) -> Self {
        Self::new(StorageConfig::from_env(), auth)
    }
}

impl<F: ClientFactory> StorageClient<F> {
    pub fn with_factory(
        config: StorageConfig,
        auth: impl AuthContextProvider + 'static,
        factory: F,
    ) -> Self {
        Self {
            config,
            auth: Arc::new(auth),
            factory,
            handle: None,
        }
    }

    pub fn config(&self) -> &StorageConfig {
        &self.config
    }

    /// Whether the handle has been built yet.
    pub fn is_initialized(&self) -> bool {
        self.handle.is_some()
    }

    /// Whether the handle was built with a Bearer token.
    pub fn token_captured(&self) -> bool {
        self.handle.as_ref().is_some_and(StorageHandle::is_bearer)
    }

    /// The VOSpace client, built on first call.
    pub fn storage_client(&mut self) -> Result<&mut StorageHandle<F::Client>, StorageError> {
        if self.handle.is_none() {
            let handle = self.build_handle()?;
            self.handle = Some(handle);
        }
        self.handle
            .as_mut()
            .ok_or_else(|| StorageError::ConfigurationError("storage client not initialized".into()))
    }

    fn build_handle(&self) -> Result<StorageHandle<F::Client>, StorageError> {
        let context = self.auth.active_context();
        let token: Option<SecretString> = context.bearer_token().cloned();
        if token.is_some() && context.is_expired_at(chrono::Utc::now()) {
            tracing::warn!(target: "canfar::storage", "Bearer token has expired; requests may be rejected");
        }

        // The token is never handed to the client itself, which would
        // engage its delegation token header.
        let client = self.factory.build(&self.config)?;

        match token {
            Some(token) => match bearer_value(token.expose_secret()) {
                Ok(bearer) => {
                    tracing::debug!(target: "canfar::storage", endpoint = %self.config.service_endpoint.base_url(), "Using Bearer authentication");
                    Ok(StorageHandle::Bearer(BearerEndpoints::with_header(client, token, bearer)))
                }
                Err(e) => {
                    tracing::warn!(target: "canfar::storage", "Bearer token cannot be sent as a header, using client authentication unchanged: {}", e);
                    Ok(StorageHandle::Plain(client))
                }
            },
            None => {
                tracing::debug!(target: "canfar::storage", mode = context.mode(), "No Bearer token; using client authentication unchanged");
                Ok(StorageHandle::Plain(client))
            }
        }
    }
}

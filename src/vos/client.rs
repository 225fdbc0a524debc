//! VOSpace client and the endpoint resolution seam.

use crate::config::StorageConfig;
use crate::error::StorageError;
use crate::utils::http_headers::session_defaults;
use crate::vos::endpoint::{Endpoint, SessionAccess};
use crate::vos::uri::{ResourceId, VosUri};
use reqwest::Method;
use secrecy::SecretString;
use std::collections::HashMap;
use std::collections::hash_map::Entry;

/// Resolves a URI to the endpoint used to talk to its service.
///
/// Implementations cache endpoints, so repeated calls for the same service
/// return the same endpoint.
pub trait EndpointResolver {
    type Endpoint: SessionAccess;

    fn get_endpoint(&mut self, uri: &VosUri) -> Result<&mut Self::Endpoint, StorageError>;
}

/// VOSpace client with one cached [`Endpoint`] per service.
#[derive(Debug)]
pub struct VosClient {
    config: StorageConfig,
    native_token: Option<SecretString>,
    default_resource: Option<ResourceId>,
    endpoints: HashMap<ResourceId, Endpoint>,
}

impl VosClient {
    /// Create a client. A `token` enables native delegation-token auth on
    /// every endpoint the client creates.
    pub fn new(config: StorageConfig, token: Option<SecretString>) -> Self {
        Self {
            config,
            native_token: token,
            default_resource: None,
            endpoints: HashMap::new(),
        }
    }

    /// Factory used by [`crate::storage::StorageClient`]; never passes a token.
    pub fn from_config(config: &StorageConfig) -> Result<Self, StorageError> {
        Ok(Self::new(config.clone(), None))
    }

    /// Resource used for short `vos:path` URIs.
    pub fn with_default_resource(mut self, resource: ResourceId) -> Self {
        self.default_resource = Some(resource);
        self
    }

    pub fn config(&self) -> &StorageConfig {
        &self.config
    }

    /// Parse a URI, accepting the short form when a default resource is set.
    pub fn parse_uri(&self, uri: &str) -> Result<VosUri, StorageError> {
        VosUri::parse_with_default(uri, self.default_resource.as_ref())
    }

    /// Endpoints created so far.
    pub fn endpoint_count(&self) -> usize {
        self.endpoints.len()
    }
}

impl EndpointResolver for VosClient {
    type Endpoint = Endpoint;

    fn get_endpoint(&mut self, uri: &VosUri) -> Result<&mut Endpoint, StorageError> {
        match self.endpoints.entry(uri.resource_id().clone()) {
            Entry::Occupied(entry) => Ok(entry.into_mut()),
            Entry::Vacant(entry) => {
                let defaults = session_defaults(&self.config.user_agent)?;
                let base_url = self.config.service_endpoint.base_url();
                let mut endpoint = Endpoint::new(entry.key().clone(), base_url, defaults);
                if let Some(token) = &self.native_token {
                    endpoint.set_auth(token)?;
                }
                tracing::debug!(target: "canfar::vospace", resource_id = %entry.key(), "created endpoint");
                Ok(entry.insert(endpoint))
            }
        }
    }
}

/// Fetch the raw node document for `uri` through `resolver`.
pub async fn fetch_node<R>(resolver: &mut R, uri: &VosUri) -> Result<String, StorageError>
where
    R: EndpointResolver<Endpoint = Endpoint> + ?Sized,
{
    let request = resolver.get_endpoint(uri)?.request(Method::GET, uri)?;
    let response = request.send().await?;
    let status = response.status();
    let body = response.text().await?;
    if status.is_client_error() || status.is_server_error() {
        return Err(StorageError::api_error(status.as_u16(), body));
    }
    Ok(body)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ServiceEndpoint;
    use crate::utils::http_headers::DELEGATION_TOKEN_HEADER;
    use reqwest::header::AUTHORIZATION;

    fn config() -> StorageConfig {
        StorageConfig::default()
            .with_service_endpoint(ServiceEndpoint::Remote("vos.example.org".into()))
    }

    #[test]
    fn endpoints_are_cached_per_service() {
        let mut client = VosClient::new(config(), None);
        let a = VosUri::parse("vos://host~cavern/home/a").unwrap();
        let b = VosUri::parse("vos://host~cavern/home/b").unwrap();
        let c = VosUri::parse("vos://host~vault/x").unwrap();

        let first = client.get_endpoint(&a).unwrap() as *const Endpoint;
        let second = client.get_endpoint(&b).unwrap() as *const Endpoint;
        assert_eq!(first, second);
        client.get_endpoint(&c).unwrap();
        assert_eq!(client.endpoint_count(), 2);
    }

    #[test]
    fn endpoint_base_url_follows_config() {
        let mut client = VosClient::new(config(), None);
        let uri = VosUri::parse("vos://host~cavern/home").unwrap();
        let ep = client.get_endpoint(&uri).unwrap();
        assert_eq!(ep.nodes_url(&uri), "https://vos.example.org/cavern/nodes/home");
    }

    #[test]
    fn native_token_uses_delegation_header() {
        let token = SecretString::from("xyz".to_string());
        let mut client = VosClient::new(config(), Some(token));
        let uri = VosUri::parse("vos://host~cavern/home").unwrap();
        let headers = client.get_endpoint(&uri).unwrap().session_headers().unwrap();
        assert_eq!(headers.live.get(DELEGATION_TOKEN_HEADER).unwrap(), "xyz");
        assert!(headers.live.get(AUTHORIZATION).is_none());
    }

    #[test]
    fn from_config_never_sets_native_auth() {
        let mut client = VosClient::from_config(&config()).unwrap();
        let uri = VosUri::parse("vos://host~cavern/home").unwrap();
        let ep = client.get_endpoint(&uri).unwrap();
        assert!(!ep.conn.subject.is_authenticated());
        let headers = ep.session_headers().unwrap();
        assert!(headers.persistent.get(DELEGATION_TOKEN_HEADER).is_none());
    }

    #[test]
    fn short_uri_uses_default_resource() {
        let client = VosClient::new(config(), None)
            .with_default_resource(ResourceId::new("host", "cavern"));
        let uri = client.parse_uri("vos:home/user").unwrap();
        assert_eq!(uri.resource_id().authority(), "host");
    }
}

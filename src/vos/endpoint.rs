//! Per-service endpoints and their HTTP sessions.
//!
//! An [`Endpoint`] owns a [`Connection`], which pairs the caller's [`Subject`]
//! with a [`WsClient`]. The web service client keeps persistent default
//! headers and opens its live [`Session`] on first use by copying them.

use crate::error::{StorageError, StructuralAccessError};
use crate::utils::http_headers::{delegation_token_header, delegation_value};
use crate::vos::uri::{ResourceId, VosUri};
use reqwest::header::HeaderMap;
use reqwest::{Method, RequestBuilder};
use secrecy::{ExposeSecret, SecretString};

/// Mutable view of an endpoint's session header maps.
pub struct SessionHeaders<'a> {
    /// Defaults copied into every session the endpoint opens.
    pub persistent: &'a mut HeaderMap,
    /// Headers of the live session.
    pub live: &'a mut HeaderMap,
}

/// Narrow capability the Bearer adaptation needs from an endpoint.
pub trait SessionAccess {
    /// Identifier of the service this endpoint talks to.
    fn resource_id(&self) -> &ResourceId;

    /// Header maps of the current session, opening it if needed.
    fn session_headers(&mut self) -> Result<SessionHeaders<'_>, StructuralAccessError>;

    /// Record the token on the caller identity used for capability lookups.
    fn set_subject_token(&mut self, _token: &SecretString) -> Result<(), StructuralAccessError> {
        Ok(())
    }
}

/// The identity requests are made as.
#[derive(Debug, Clone, Default)]
pub struct Subject {
    token: Option<SecretString>,
}

impl Subject {
    pub fn token(&self) -> Option<&SecretString> {
        self.token.as_ref()
    }

    pub fn set_token(&mut self, token: SecretString) {
        self.token = Some(token);
    }

    /// Whether capability lookups may pick token-protected URLs.
    pub fn is_authenticated(&self) -> bool {
        self.token.is_some()
    }
}

/// A live HTTP session.
#[derive(Debug)]
pub struct Session {
    http: reqwest::Client,
    headers: HeaderMap,
}

impl Session {
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn headers_mut(&mut self) -> &mut HeaderMap {
        &mut self.headers
    }

    /// Build a request carrying this session's headers.
    pub fn request(&self, method: Method, url: &str) -> RequestBuilder {
        self.http.request(method, url).headers(self.headers.clone())
    }
}

/// Web service client bound to one service base URL.
#[derive(Debug)]
pub struct WsClient {
    base_url: String,
    default_headers: HeaderMap,
    session: Option<Session>,
}

impl WsClient {
    pub fn new(base_url: impl Into<String>, default_headers: HeaderMap) -> Self {
        Self {
            base_url: base_url.into(),
            default_headers,
            session: None,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn default_headers(&self) -> &HeaderMap {
        &self.default_headers
    }

    pub fn default_headers_mut(&mut self) -> &mut HeaderMap {
        &mut self.default_headers
    }

    /// The live session, if one has been opened.
    pub fn current_session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    /// The live session, opened from the default headers on first call.
    pub fn session(&mut self) -> Result<&mut Session, StructuralAccessError> {
        if self.session.is_none() {
            let http = reqwest::Client::builder()
                .build()
                .map_err(|e| StructuralAccessError::SessionUnavailable(e.to_string()))?;
            tracing::trace!(target: "canfar::vospace", base_url = %self.base_url, "opened session");
            self.session = Some(Session {
                http,
                headers: self.default_headers.clone(),
            });
        }
        self.session
            .as_mut()
            .ok_or_else(|| StructuralAccessError::SessionUnavailable("session not open".into()))
    }

    /// Both header maps at once.
    pub fn headers_mut(&mut self) -> Result<SessionHeaders<'_>, StructuralAccessError> {
        self.session()?;
        let live = match self.session.as_mut() {
            Some(session) => &mut session.headers,
            None => {
                return Err(StructuralAccessError::SessionUnavailable(
                    "session not open".into(),
                ));
            }
        };
        Ok(SessionHeaders {
            persistent: &mut self.default_headers,
            live,
        })
    }
}

/// Connection state of an endpoint.
#[derive(Debug)]
pub struct Connection {
    pub subject: Subject,
    pub ws_client: WsClient,
}

/// Network endpoint for one VOSpace service.
#[derive(Debug)]
pub struct Endpoint {
    resource_id: ResourceId,
    pub conn: Connection,
}

impl Endpoint {
    pub fn new(resource_id: ResourceId, base_url: impl Into<String>, defaults: HeaderMap) -> Self {
        Self {
            resource_id,
            conn: Connection {
                subject: Subject::default(),
                ws_client: WsClient::new(base_url, defaults),
            },
        }
    }

    /// Native auth: attach the token as a delegation header.
    ///
    /// Every session opened afterwards carries `X-CADC-DelegationToken`.
    pub fn set_auth(&mut self, token: &SecretString) -> Result<(), StorageError> {
        let value = delegation_value(token.expose_secret())?;
        self.conn
            .ws_client
            .default_headers_mut()
            .insert(delegation_token_header(), value.clone());
        if let Some(session) = self.conn.ws_client.session.as_mut() {
            session.headers.insert(delegation_token_header(), value);
        }
        self.conn.subject.set_token(token.clone());
        Ok(())
    }

    /// `{base}/{service}/nodes/{path}` for a node on this endpoint.
    pub fn nodes_url(&self, uri: &VosUri) -> String {
        let mut url = format!(
            "{}/{}/nodes",
            self.conn.ws_client.base_url(),
            self.resource_id.service()
        );
        for segment in uri.segments() {
            url.push('/');
            url.push_str(&urlencoding::encode(segment));
        }
        url
    }

    /// Request against a node, carrying the live session headers.
    pub fn request(&mut self, method: Method, uri: &VosUri) -> Result<RequestBuilder, StorageError> {
        let url = self.nodes_url(uri);
        let session = self.conn.ws_client.session()?;
        Ok(session.request(method, &url))
    }
}

impl SessionAccess for Endpoint {
    fn resource_id(&self) -> &ResourceId {
        &self.resource_id
    }

    fn session_headers(&mut self) -> Result<SessionHeaders<'_>, StructuralAccessError> {
        self.conn.ws_client.headers_mut()
    }

    fn set_subject_token(&mut self, token: &SecretString) -> Result<(), StructuralAccessError> {
        self.conn.subject.set_token(token.clone());
        Ok(())
    }
}

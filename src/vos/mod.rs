//! VOSpace client layer: URIs, endpoints and endpoint resolution.

pub mod client;
pub mod endpoint;
pub mod uri;

pub use client::{EndpointResolver, VosClient, fetch_node};
pub use endpoint::{Connection, Endpoint, Session, SessionAccess, SessionHeaders, Subject, WsClient};
pub use uri::{DEFAULT_SERVICE, ResourceId, VosUri};

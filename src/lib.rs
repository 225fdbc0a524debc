//! # canfar-storage
//!
//! Bearer-authenticated access to CANFAR Cavern VOSpace storage.
//!
//! The VOSpace client natively authenticates with an `X-CADC-DelegationToken`
//! header, which some VOSpace servers do not accept. [`StorageClient`] builds
//! the client without a token and, when the active authentication context
//! holds an OAuth2 access token, wraps it in [`auth::BearerEndpoints`] so every
//! endpoint session sends `Authorization: Bearer <token>` instead.
//!
//! ```rust,ignore
//! use canfar_storage::prelude::*;
//!
//! let mut storage = StorageClient::new(
//!     StorageConfig::from_env(),
//!     StaticContextProvider::bearer(access_token),
//! );
//! let uri = VosUri::parse("vos://canfar.itsrc.oact.inaf.it~cavern/home/")?;
//! let listing = storage.storage_client()?.get_node(&uri).await?;
//! ```

pub mod auth;
pub mod config;
pub mod error;
pub mod observability;
pub mod storage;
pub mod utils;
pub mod vos;

pub use config::{ServiceEndpoint, StorageConfig};
pub use error::{StorageError, StructuralAccessError};
pub use storage::{ClientFactory, StorageClient, StorageHandle};

pub mod prelude {
    pub use crate::auth::{
        AuthContext, AuthContextProvider, BearerEndpoints, EndpointRegistry,
        StaticContextProvider,
    };
    pub use crate::config::{ServiceEndpoint, StorageConfig};
    pub use crate::error::{StorageError, StructuralAccessError};
    pub use crate::storage::{ClientFactory, StorageClient, StorageHandle};
    pub use crate::vos::{
        Endpoint, EndpointResolver, ResourceId, SessionAccess, SessionHeaders, VosClient, VosUri,
    };
}

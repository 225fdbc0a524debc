//! Utility modules for canfar-storage

pub mod http_headers;

pub use http_headers::*;

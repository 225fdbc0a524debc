//! HTTP Headers Utility
//!
//! Header names and helpers shared by the VOSpace client and the Bearer
//! adaptation layer.

use crate::error::StorageError;
use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderName, HeaderValue, USER_AGENT};
use std::collections::HashMap;

/// Legacy delegation token header used by the VOSpace client's native auth.
pub const DELEGATION_TOKEN_HEADER: &str = "x-cadc-delegationtoken";

/// `HeaderName` for [`DELEGATION_TOKEN_HEADER`].
pub fn delegation_token_header() -> HeaderName {
    HeaderName::from_static(DELEGATION_TOKEN_HEADER)
}

/// Build an `Authorization: Bearer <token>` value, marked sensitive.
pub fn bearer_value(token: &str) -> Result<HeaderValue, StorageError> {
    let mut value = HeaderValue::from_str(&format!("Bearer {token}")).map_err(|e| {
        StorageError::ConfigurationError(format!("Invalid bearer token format: {e}"))
    })?;
    value.set_sensitive(true);
    Ok(value)
}

/// Build the delegation token value, marked sensitive.
pub fn delegation_value(token: &str) -> Result<HeaderValue, StorageError> {
    let mut value = HeaderValue::from_str(token).map_err(|e| {
        StorageError::ConfigurationError(format!("Invalid delegation token format: {e}"))
    })?;
    value.set_sensitive(true);
    Ok(value)
}

/// Default headers for a fresh VOSpace session.
pub fn session_defaults(user_agent: &str) -> Result<HeaderMap, StorageError> {
    let mut headers = HeaderMap::new();
    headers.insert(
        USER_AGENT,
        HeaderValue::from_str(user_agent)
            .map_err(|e| StorageError::ConfigurationError(format!("Invalid user agent: {e}")))?,
    );
    Ok(headers)
}

/// Rewrite a header map to Bearer-only auth.
///
/// Drops the delegation header and sets `Authorization` only when absent.
/// Returns `true` if `Authorization` was inserted.
pub fn apply_bearer_only(headers: &mut HeaderMap, bearer: &HeaderValue) -> bool {
    headers.remove(DELEGATION_TOKEN_HEADER);
    if headers.contains_key(AUTHORIZATION) {
        return false;
    }
    headers.insert(AUTHORIZATION, bearer.clone());
    true
}

/// Mask a credential for log output.
pub fn mask_sensitive_value(value: &str) -> String {
    if let Some(token) = value.strip_prefix("Bearer ") {
        if token.chars().count() > 8 {
            return format!("Bearer {}", head_and_tail(token, 4, 4));
        }
        return "Bearer ***".to_string();
    }
    if value.chars().count() > 16 {
        head_and_tail(value, 6, 4)
    } else {
        "***".to_string()
    }
}

fn head_and_tail(value: &str, head: usize, tail: usize) -> String {
    let start: String = value.chars().take(head).collect();
    let skip = value.chars().count().saturating_sub(tail);
    let end: String = value.chars().skip(skip).collect();
    format!("{start}...{end}")
}

/// Render headers as JSON for debug logs, masking credentials.
pub fn format_headers_for_logging(headers: &HeaderMap) -> String {
    let map: HashMap<&str, String> = headers
        .iter()
        .map(|(k, v)| {
            let value = v.to_str().unwrap_or("<invalid>");
            let name = k.as_str();
            let masked = if v.is_sensitive()
                || name.contains("authorization")
                || name.contains("token")
            {
                mask_sensitive_value(value)
            } else {
                value.to_string()
            };
            (name, masked)
        })
        .collect();
    serde_json::to_string(&map).unwrap_or_else(|_| format!("{map:?}"))
}

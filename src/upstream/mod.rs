//! Client for the provisioning API.
//!
//! One resource module per endpoint family; every loader returns typed
//! projections and every failure — transport, TLS, timeout, or a
//! non-"OKAY" envelope — is an [`UpstreamError`] carrying a message fit
//! for an operator's screen. Nothing here retries or caches.

pub mod client;
pub mod instances;
pub mod os;
pub mod products;
pub mod regions;
pub mod ssh_keys;

pub use client::{Upstream, UpstreamError};

use serde_json::{Map, Value};

/// Read a string field, accepting numbers (ids arrive both ways).
pub(crate) fn field_str(obj: &Map<String, Value>, keys: &[&str]) -> Option<String> {
    for key in keys {
        match obj.get(*key) {
            Some(Value::String(s)) if !s.trim().is_empty() => return Some(s.trim().to_string()),
            Some(Value::Number(n)) => return Some(n.to_string()),
            _ => {}
        }
    }
    None
}

/// Read an integer field, accepting numeric strings.
pub(crate) fn field_i64(obj: &Map<String, Value>, keys: &[&str]) -> Option<i64> {
    for key in keys {
        match obj.get(*key) {
            Some(Value::Number(n)) => {
                if let Some(i) = n.as_i64() {
                    return Some(i);
                }
                if let Some(f) = n.as_f64() {
                    return Some(f as i64);
                }
            }
            Some(Value::String(s)) => {
                if let Ok(i) = s.trim().parse::<i64>() {
                    return Some(i);
                }
            }
            _ => {}
        }
    }
    None
}

pub(crate) fn field_bool(obj: &Map<String, Value>, key: &str, default: bool) -> bool {
    obj.get(key).and_then(Value::as_bool).unwrap_or(default)
}

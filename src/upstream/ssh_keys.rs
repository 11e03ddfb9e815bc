use serde_json::{json, Value};

use crate::models::SshKey;

use super::{field_i64, field_str, Upstream, UpstreamError};

/// Fetch the registered SSH keys, optionally scoped to the configured
/// customer id.
pub async fn list(upstream: &Upstream) -> Result<Vec<SshKey>, UpstreamError> {
    let mut params = Vec::new();
    if let Some(cid) = upstream.customer_id() {
        params.push(("customerId".to_string(), cid.to_string()));
    }
    let data = upstream.get("/v1/ssh-keys", &params).await?;

    // Older API revisions wrapped the list in an object.
    let arr = data
        .as_array()
        .or_else(|| data.get("sshKeys").and_then(Value::as_array))
        .or_else(|| data.get("keys").and_then(Value::as_array))
        .ok_or(UpstreamError::Malformed)?;
    Ok(arr.iter().filter_map(parse_key).collect())
}

pub async fn create(
    upstream: &Upstream,
    name: &str,
    public_key: &str,
) -> Result<Value, UpstreamError> {
    let mut body = json!({"name": name, "publicKey": public_key});
    if let Some(cid) = upstream.customer_id() {
        body["customerId"] = Value::String(cid.to_string());
    }
    upstream.post("/v1/ssh-keys", body).await
}

pub async fn delete(upstream: &Upstream, id: i64) -> Result<Value, UpstreamError> {
    upstream.delete(&format!("/v1/ssh-keys/{id}")).await
}

pub fn find(keys: &[SshKey], id: i64) -> Option<&SshKey> {
    keys.iter().find(|k| k.id == id)
}

fn parse_key(value: &Value) -> Option<SshKey> {
    let obj = value.as_object()?;
    let id = field_i64(obj, &["id"])?;
    Some(SshKey {
        id,
        name: field_str(obj, &["name"]).unwrap_or_else(|| format!("key-{id}")),
        fingerprint: field_str(obj, &["fingerprint", "fingerPrint"]),
        created_at: field_str(obj, &["createdAt", "created_at"]),
    })
}

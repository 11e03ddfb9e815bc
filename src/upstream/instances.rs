use serde_json::{json, Value};

use crate::models::Instance;

use super::{field_i64, field_str, Upstream, UpstreamError};

/// One-shot power/lifecycle operations proxied to the API.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InstanceAction {
    PowerOn,
    PowerOff,
    Reset,
}

impl InstanceAction {
    pub fn path_segment(&self) -> &'static str {
        match self {
            InstanceAction::PowerOn => "poweron",
            InstanceAction::PowerOff => "poweroff",
            InstanceAction::Reset => "reset",
        }
    }

    pub fn past_tense(&self) -> &'static str {
        match self {
            InstanceAction::PowerOn => "powered on",
            InstanceAction::PowerOff => "powered off",
            InstanceAction::Reset => "reset",
        }
    }
}

pub async fn list(upstream: &Upstream) -> Result<Vec<Instance>, UpstreamError> {
    let data = upstream.get("/v1/instances", &[]).await?;
    let arr = data
        .as_array()
        .or_else(|| data.get("instances").and_then(Value::as_array))
        .ok_or(UpstreamError::Malformed)?;
    Ok(arr.iter().filter_map(parse_instance).collect())
}

pub async fn get(upstream: &Upstream, id: &str) -> Result<Instance, UpstreamError> {
    let data = upstream.get(&format!("/v1/instances/{id}"), &[]).await?;
    parse_instance(&data).ok_or(UpstreamError::Malformed)
}

/// Submit the creation payload assembled by the wizard's review step.
pub async fn create(upstream: &Upstream, payload: Value) -> Result<Value, UpstreamError> {
    upstream.post("/v1/instances", payload).await
}

pub async fn action(
    upstream: &Upstream,
    id: &str,
    action: InstanceAction,
) -> Result<Value, UpstreamError> {
    upstream
        .post(
            &format!("/v1/instances/{id}/{}", action.path_segment()),
            json!({}),
        )
        .await
}

pub async fn delete(upstream: &Upstream, id: &str) -> Result<Value, UpstreamError> {
    upstream.delete(&format!("/v1/instances/{id}")).await
}

/// Ask the provider to roll a new root password. Returns it when the
/// response carries one.
pub async fn change_password(
    upstream: &Upstream,
    id: &str,
) -> Result<Option<String>, UpstreamError> {
    let data = upstream
        .post(&format!("/v1/instances/{id}/change-pass"), json!({}))
        .await?;
    Ok(data
        .get("password")
        .and_then(Value::as_str)
        .map(str::to_string))
}

pub async fn change_os(upstream: &Upstream, id: &str, os_id: &str) -> Result<Value, UpstreamError> {
    upstream
        .post(&format!("/v1/instances/{id}/change-os"), json!({"osId": os_id}))
        .await
}

/// Resize onto a fixed product.
pub async fn resize_to_product(
    upstream: &Upstream,
    id: &str,
    product_id: &str,
) -> Result<Value, UpstreamError> {
    upstream
        .post(
            &format!("/v1/instances/{id}/resize"),
            json!({"productId": product_id}),
        )
        .await
}

/// Resize to custom resources within a region.
pub async fn resize_to_custom(
    upstream: &Upstream,
    id: &str,
    region_id: &str,
    extra_resource: Value,
) -> Result<Value, UpstreamError> {
    upstream
        .post(
            &format!("/v1/instances/{id}/resize"),
            json!({"regionId": region_id, "extraResource": extra_resource}),
        )
        .await
}

pub async fn subscription_refund(upstream: &Upstream, id: &str) -> Result<Value, UpstreamError> {
    upstream
        .post(&format!("/v1/instances/{id}/subscription-refund"), json!({}))
        .await
}

fn parse_instance(value: &Value) -> Option<Instance> {
    let obj = value.as_object()?;
    let id = field_str(obj, &["id"])?;

    // `region` is a plain id in current responses, an object in older ones.
    let region = match obj.get("region") {
        Some(Value::String(s)) => s.trim().to_string(),
        Some(Value::Object(r)) => field_str(r, &["name", "id"]).unwrap_or_default(),
        _ => String::new(),
    };

    let os_name = obj
        .get("os")
        .and_then(Value::as_object)
        .and_then(|os| field_str(os, &["name"]))
        .or_else(|| field_str(obj, &["osName"]));

    Some(Instance {
        id,
        hostname: field_str(obj, &["hostname", "name"]).unwrap_or_default(),
        region,
        status: field_str(obj, &["status"]).unwrap_or_default(),
        main_ip: field_str(obj, &["mainIp", "main_ip", "ip"]),
        main_ipv6: field_str(obj, &["mainIpv6", "main_ipv6", "ipv6"]),
        cpu: field_i64(obj, &["vcpuCount", "cpuCount", "cpu"]),
        ram_mb: field_i64(obj, &["ram", "ramInMb"]),
        disk_gb: field_i64(obj, &["disk", "diskInGB", "storage"]),
        os_name,
        product_id: field_str(obj, &["productId"]),
        created_at: field_str(obj, &["createdAt", "created_at"]),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_current_response_shape() {
        let inst = parse_instance(&json!({
            "id": "i-100",
            "hostname": "web-1",
            "region": "ams1",
            "status": "running",
            "vcpuCount": 2,
            "ram": 4096,
            "disk": 80,
            "mainIp": "203.0.113.9",
            "os": {"id": "u22", "name": "Ubuntu 22.04"}
        }))
        .unwrap();
        assert_eq!(inst.hostname, "web-1");
        assert_eq!(inst.cpu, Some(2));
        assert_eq!(inst.ram_mb, Some(4096));
        assert_eq!(inst.os_name.as_deref(), Some("Ubuntu 22.04"));
    }

    #[test]
    fn parses_region_object_variant() {
        let inst = parse_instance(&json!({
            "id": 7,
            "name": "db-1",
            "region": {"id": "nyc1", "name": "New York"}
        }))
        .unwrap();
        assert_eq!(inst.id, "7");
        assert_eq!(inst.hostname, "db-1");
        assert_eq!(inst.region, "New York");
    }

    #[test]
    fn action_paths_are_stable() {
        assert_eq!(InstanceAction::PowerOn.path_segment(), "poweron");
        assert_eq!(InstanceAction::PowerOff.path_segment(), "poweroff");
        assert_eq!(InstanceAction::Reset.path_segment(), "reset");
    }
}

use std::collections::HashMap;

use serde_json::Value;

use crate::models::Region;

use super::{field_bool, field_i64, field_str, Upstream, UpstreamError};

/// Fetch every region the provider reports. Records without an id are
/// skipped; missing flags default to visible-and-active, matching how
/// the provider treats absent fields.
pub async fn list(upstream: &Upstream) -> Result<Vec<Region>, UpstreamError> {
    let data = upstream.get("/v1/regions", &[]).await?;
    let arr = data.as_array().ok_or(UpstreamError::Malformed)?;
    Ok(arr.iter().filter_map(parse_region).collect())
}

/// Regions an operator may provision into: active and not hidden.
pub async fn selectable(upstream: &Upstream) -> Result<Vec<Region>, UpstreamError> {
    let mut regions = list(upstream).await?;
    regions.retain(Region::is_selectable);
    Ok(regions)
}

pub fn by_id(regions: &[Region]) -> HashMap<String, Region> {
    regions.iter().map(|r| (r.id.clone(), r.clone())).collect()
}

pub fn find<'a>(regions: &'a [Region], id: &str) -> Option<&'a Region> {
    regions.iter().find(|r| r.id == id)
}

fn parse_region(value: &Value) -> Option<Region> {
    let obj = value.as_object()?;
    let id = field_str(obj, &["id"])?;
    let name = field_str(obj, &["name"]).unwrap_or_else(|| id.clone());

    // Custom-plan minimums live under the region's config object.
    let (ram_threshold_gb, disk_threshold_gb) = obj
        .get("config")
        .and_then(Value::as_object)
        .map(|cfg| {
            (
                field_i64(cfg, &["ramThresholdInGB"]).unwrap_or(0),
                field_i64(cfg, &["diskThresholdInGB"]).unwrap_or(0),
            )
        })
        .unwrap_or((0, 0));

    Some(Region {
        id,
        name,
        country: field_str(obj, &["country"]),
        city: field_str(obj, &["city"]),
        is_active: field_bool(obj, "isActive", true),
        is_hidden: field_bool(obj, "isHidden", false),
        ram_threshold_gb,
        disk_threshold_gb,
    })
}

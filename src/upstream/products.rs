use serde_json::Value;

use crate::models::Product;

use super::{field_str, Upstream, UpstreamError};

/// Fetch the fixed plans offered in one region.
pub async fn list(upstream: &Upstream, region_id: &str) -> Result<Vec<Product>, UpstreamError> {
    let params = vec![("regionId".to_string(), region_id.to_string())];
    let data = upstream.get("/v1/products", &params).await?;
    let arr = data.as_array().ok_or(UpstreamError::Malformed)?;
    Ok(arr
        .iter()
        .filter_map(|v| parse_product(v, region_id))
        .collect())
}

pub fn find<'a>(products: &'a [Product], id: &str) -> Option<&'a Product> {
    products.iter().find(|p| p.id == id)
}

fn parse_product(value: &Value, requested_region: &str) -> Option<Product> {
    let obj = value.as_object()?;
    let id = field_str(obj, &["id"])?;
    let name = field_str(obj, &["name", "displayName"]).unwrap_or_else(|| id.clone());

    // The spec object has moved between `plan.specification` and a
    // top-level key across provider API revisions.
    let specification = obj
        .get("plan")
        .and_then(|p| p.get("specification"))
        .or_else(|| obj.get("specification"))
        .or_else(|| obj.get("spec"))
        .cloned()
        .unwrap_or(Value::Null);

    let price_items = obj
        .get("priceItems")
        .or_else(|| obj.get("prices"))
        .and_then(Value::as_array)
        .cloned()
        .unwrap_or_default();

    let tags = match obj.get("tags") {
        Some(Value::String(s)) => s
            .split(',')
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .collect(),
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(Value::as_str)
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .collect(),
        _ => Vec::new(),
    };

    Some(Product {
        id,
        name,
        description: field_str(obj, &["description"]).unwrap_or_default(),
        instance_class: field_str(obj, &["class", "instanceClass"]).unwrap_or_default(),
        region_id: field_str(obj, &["regionId"]).unwrap_or_else(|| requested_region.to_string()),
        tags,
        specification,
        price_items,
    })
}

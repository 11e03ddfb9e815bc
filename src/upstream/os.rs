use serde_json::Value;

use crate::models::OsImage;

use super::{field_bool, field_i64, field_str, Upstream, UpstreamError};

/// Fetch operating systems available for instance creation.
///
/// `min_ram_mb` forwards the plan's RAM floor so the provider filters
/// out images the chosen plan cannot boot; `only_actives` limits the
/// list to images currently offered.
pub async fn list(
    upstream: &Upstream,
    min_ram_mb: Option<i64>,
    only_actives: bool,
) -> Result<Vec<OsImage>, UpstreamError> {
    let mut params = vec![("action".to_string(), "CREATE".to_string())];
    if let Some(mb) = min_ram_mb {
        params.push(("minRam".to_string(), mb.to_string()));
    }
    if only_actives {
        params.push(("onlyActives".to_string(), "true".to_string()));
    }
    let data = upstream.get("/v1/os", &params).await?;

    // The list nests under data.os; some revisions return it bare.
    let arr = data
        .get("os")
        .and_then(Value::as_array)
        .or_else(|| data.as_array())
        .ok_or(UpstreamError::Malformed)?;
    Ok(arr.iter().filter_map(parse_os).collect())
}

/// The image to pre-select: the provider's default, else the first.
pub fn default_choice(images: &[OsImage]) -> Option<&OsImage> {
    images.iter().find(|os| os.is_default).or_else(|| images.first())
}

pub fn find<'a>(images: &'a [OsImage], id: &str) -> Option<&'a OsImage> {
    images.iter().find(|os| os.id == id)
}

fn parse_os(value: &Value) -> Option<OsImage> {
    let obj = value.as_object()?;
    let id = field_str(obj, &["id"])?;
    Some(OsImage {
        name: field_str(obj, &["name"]).unwrap_or_else(|| id.clone()),
        id,
        family: field_str(obj, &["family"]).unwrap_or_default(),
        is_default: field_bool(obj, "isDefault", false),
        is_active: field_bool(obj, "isActive", true),
        min_ram_mb: field_i64(obj, &["minRam", "minRamInMb"]),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn default_choice_prefers_provider_default() {
        let images = vec![
            parse_os(&json!({"id": "u22", "name": "Ubuntu 22.04"})).unwrap(),
            parse_os(&json!({"id": "u24", "name": "Ubuntu 24.04", "isDefault": true})).unwrap(),
        ];
        assert_eq!(default_choice(&images).map(|o| o.id.as_str()), Some("u24"));
    }

    #[test]
    fn default_choice_falls_back_to_first() {
        let images = vec![
            parse_os(&json!({"id": "d12", "name": "Debian 12"})).unwrap(),
            parse_os(&json!({"id": "d11", "name": "Debian 11"})).unwrap(),
        ];
        assert_eq!(default_choice(&images).map(|o| o.id.as_str()), Some("d12"));
        assert!(default_choice(&[]).is_none());
    }

    #[test]
    fn min_ram_accepts_numeric_strings() {
        let os = parse_os(&json!({"id": "w22", "minRam": "2048"})).unwrap();
        assert_eq!(os.min_ram_mb, Some(2048));
    }
}

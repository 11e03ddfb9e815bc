//! Submission validators for the wizard steps.
//!
//! Each validator reads the operator's *raw* input (not the already
//! normalized decoded state) so it can reject values the codec would
//! quietly default away, and returns one [`FieldError`] per violated
//! rule. Catalog context — active regions, the region's products, the
//! OS list, the key catalog — is fetched by the handler and passed in,
//! keeping these functions pure and testable.

use std::fmt;

use crate::models::{OsImage, Product, Region, SshKey};

use super::codec::{self, QueryMap};
use super::state::{Plan, WizardState, MAX_FLOATING_IPS, MAX_HOSTNAMES};

/// One violated rule, tied to the field the operator must fix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    pub field: &'static str,
    pub message: String,
}

impl FieldError {
    fn new(field: &'static str, message: impl Into<String>) -> Self {
        FieldError {
            field,
            message: message.into(),
        }
    }
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

/// Hostnames allow DNS-label characters only. The codec splits lists
/// on commas, so a comma could never survive a round trip anyway.
pub fn valid_hostname(hostname: &str) -> bool {
    !hostname.is_empty()
        && hostname
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '.' || c == '-')
}

/// Validate the start step: hostnames, region, address flags, floating
/// IPs. On success the merged state is returned; carried fields from
/// later steps (plan overlay, OS, keys) ride along untouched.
pub fn validate_start(
    query: &QueryMap,
    active_regions: &[Region],
) -> Result<WizardState, Vec<FieldError>> {
    let state = codec::decode(query);
    let mut errors = Vec::new();

    if state.hostnames.is_empty() {
        errors.push(FieldError::new("hostnames", "Enter at least one hostname."));
    } else if state.hostnames.len() > MAX_HOSTNAMES {
        errors.push(FieldError::new(
            "hostnames",
            format!("At most {MAX_HOSTNAMES} hostnames per request."),
        ));
    }
    for hostname in &state.hostnames {
        if !valid_hostname(hostname) {
            errors.push(FieldError::new(
                "hostnames",
                format!("Hostname '{hostname}' may only contain letters, digits, dots, and hyphens."),
            ));
        }
    }

    if state.region.is_empty() {
        errors.push(FieldError::new("region", "Choose a region."));
    } else if !active_regions.iter().any(|r| r.id == state.region) {
        errors.push(FieldError::new(
            "region",
            format!("Region '{}' is not available.", state.region),
        ));
    }

    // The codec clamps this field; the validator rejects out-of-range
    // rather than silently shrinking an explicit request.
    if let Some(raw) = query.first("floating_ip_count") {
        let raw = raw.trim();
        if !raw.is_empty() {
            match raw.parse::<i64>() {
                Ok(n) if (0..=MAX_FLOATING_IPS).contains(&n) => {}
                _ => errors.push(FieldError::new(
                    "floating_ip_count",
                    format!("Floating IP count must be between 0 and {MAX_FLOATING_IPS}."),
                )),
            }
        }
    }

    if errors.is_empty() {
        Ok(state)
    } else {
        Err(errors)
    }
}

/// Fixed branch: the product must exist in the region's current
/// catalog, which also defends against stale ids left in a rewritten
/// URL after a region change.
pub fn validate_fixed_plan(
    query: &QueryMap,
    products: &[Product],
) -> Result<Plan, Vec<FieldError>> {
    let mut errors = Vec::new();

    let product_id = query
        .first("product_id")
        .map(str::trim)
        .unwrap_or_default()
        .to_string();
    if product_id.is_empty() {
        errors.push(FieldError::new("product_id", "Choose a plan."));
    } else if !products.iter().any(|p| p.id == product_id) {
        errors.push(FieldError::new(
            "product_id",
            "The selected plan is not offered in this region.",
        ));
    }

    let extra_disk_gb = non_negative_or_error(
        query,
        "extra_disk_gb",
        "Extra disk must be zero or a whole number of GB.",
        &mut errors,
    );
    let extra_bandwidth_tb = non_negative_or_error(
        query,
        "extra_bandwidth_tb",
        "Extra bandwidth must be zero or a whole number of TB.",
        &mut errors,
    );

    if errors.is_empty() {
        Ok(Plan::Fixed {
            product_id,
            extra_disk_gb,
            extra_bandwidth_tb,
        })
    } else {
        Err(errors)
    }
}

/// Custom branch: minimums come from the region's config thresholds,
/// floored at 1.
pub fn validate_custom_plan(query: &QueryMap, region: &Region) -> Result<Plan, Vec<FieldError>> {
    let mut errors = Vec::new();

    let cpu = at_least_or_error(query, "cpu", 1, "CPU count must be at least 1.", &mut errors);

    let min_ram = region.min_ram_gb();
    let ram_gb = at_least_or_error(
        query,
        "ram_gb",
        min_ram,
        format!("RAM must be at least {min_ram} GB in {}.", region.name),
        &mut errors,
    );

    let min_disk = region.min_disk_gb();
    let disk_gb = at_least_or_error(
        query,
        "disk_gb",
        min_disk,
        format!("Disk must be at least {min_disk} GB in {}.", region.name),
        &mut errors,
    );

    let bandwidth_tb = match query.first("bandwidth_tb").map(str::trim) {
        None | Some("") => None,
        Some(raw) => match raw.parse::<i64>() {
            Ok(n) if n >= 1 => Some(n),
            _ => {
                errors.push(FieldError::new(
                    "bandwidth_tb",
                    "Bandwidth, when set, must be at least 1 TB.",
                ));
                None
            }
        },
    };

    if errors.is_empty() {
        Ok(Plan::Custom {
            cpu,
            ram_gb,
            disk_gb,
            bandwidth_tb,
        })
    } else {
        Err(errors)
    }
}

/// OS step: the choice must come from the list actually offered for
/// this plan's RAM floor.
pub fn validate_os_choice(
    query: &QueryMap,
    images: &[OsImage],
) -> Result<String, Vec<FieldError>> {
    let os_id = query
        .first("os_id")
        .map(str::trim)
        .unwrap_or_default()
        .to_string();
    if os_id.is_empty() {
        return Err(vec![FieldError::new(
            "os_id",
            "Choose an operating system.",
        )]);
    }
    if !images.iter().any(|os| os.id == os_id) {
        return Err(vec![FieldError::new(
            "os_id",
            "The selected operating system is not available for this plan.",
        )]);
    }
    Ok(os_id)
}

/// Re-check a key selection against the current catalog. Any unknown
/// id discards the whole selection — fail closed, never partial.
/// Returns the surviving ids and whether a discard happened.
pub fn checked_key_selection(requested: &[i64], catalog: &[SshKey]) -> (Vec<i64>, bool) {
    let all_known = requested
        .iter()
        .all(|id| catalog.iter().any(|key| key.id == *id));
    if all_known {
        (requested.to_vec(), false)
    } else {
        (Vec::new(), !requested.is_empty())
    }
}

fn non_negative_or_error(
    query: &QueryMap,
    field: &'static str,
    message: &str,
    errors: &mut Vec<FieldError>,
) -> i64 {
    match query.first(field).map(str::trim) {
        None | Some("") => 0,
        Some(raw) => match raw.parse::<i64>() {
            Ok(n) if n >= 0 => n,
            _ => {
                errors.push(FieldError::new(field, message.to_string()));
                0
            }
        },
    }
}

fn at_least_or_error(
    query: &QueryMap,
    field: &'static str,
    min: i64,
    message: impl Into<String>,
    errors: &mut Vec<FieldError>,
) -> i64 {
    let parsed = query
        .first(field)
        .map(str::trim)
        .filter(|raw| !raw.is_empty())
        .and_then(|raw| raw.parse::<i64>().ok());
    match parsed {
        Some(n) if n >= min => n,
        _ => {
            errors.push(FieldError::new(field, message));
            0
        }
    }
}

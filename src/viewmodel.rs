//! Display structures derived from raw catalog records.
//!
//! Upstream product payloads drift across provider versions: the same
//! quantity shows up under different field names, numbers arrive as
//! strings, and some specs are missing entirely. Everything here is
//! pure — handlers fetch, this module shapes.

use std::collections::HashMap;

use serde_json::Value;

use crate::models::{Product, Region};
use crate::wizard::Plan;

/// Field-name variants tried in priority order for each quantity.
const CPU_KEYS: &[&str] = &["cpu", "cpuCount", "vcpu", "vcpuCount"];
const RAM_GB_KEYS: &[&str] = &["ram", "ramInGB"];
const RAM_MB_KEY: &str = "ramInMb";
const DISK_KEYS: &[&str] = &["storage", "disk", "diskInGB"];
const BANDWIDTH_KEYS: &[&str] = &["bandwidth", "bandwidthInTB", "traffic"];
const GPU_KEYS: &[&str] = &["gpu", "gpuCount"];
const HOURLY_KEYS: &[&str] = &["hourlyPrice", "hourly"];
const MONTHLY_KEYS: &[&str] = &["monthlyPrice", "monthly"];

/// One label/value line on a plan card.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpecRow {
    pub label: &'static str,
    pub value: String,
}

/// A product shaped for the plan-selection and review screens.
#[derive(Debug, Clone)]
pub struct PlanCard {
    pub id: String,
    pub name: String,
    pub description: String,
    pub location: String,
    pub rows: Vec<SpecRow>,
    pub hourly_price: Option<String>,
    pub monthly_price: Option<String>,
    pub high_frequency: bool,
    pub ram_gb: Option<f64>,
}

impl PlanCard {
    pub fn build(product: &Product, regions: &HashMap<String, Region>) -> PlanCard {
        let spec = &product.specification;
        let ram_gb = ram_gb_from(spec);

        let mut rows = Vec::new();
        if let Some(cpu) = quantity(spec, CPU_KEYS) {
            rows.push(SpecRow {
                label: "CPU",
                value: format!("{} vCPU", format_quantity(cpu)),
            });
        }
        if let Some(ram) = ram_gb {
            rows.push(SpecRow {
                label: "RAM",
                value: format!("{} GB", format_quantity(ram)),
            });
        }
        if let Some(disk) = quantity(spec, DISK_KEYS) {
            rows.push(SpecRow {
                label: "Storage",
                value: format!("{} GB", format_quantity(disk)),
            });
        }
        if let Some(bw) = quantity(spec, BANDWIDTH_KEYS) {
            rows.push(SpecRow {
                label: "Bandwidth",
                value: format!("{} TB", format_quantity(bw)),
            });
        }
        if let Some(gpu) = quantity(spec, GPU_KEYS) {
            rows.push(SpecRow {
                label: "GPU",
                value: format_quantity(gpu),
            });
        }

        let first_price = product.price_items.first();
        let hourly_price = first_price
            .and_then(|item| price_text(item, HOURLY_KEYS))
            .map(|p| format!("${p}/hr"));
        let monthly_price = first_price
            .and_then(|item| price_text(item, MONTHLY_KEYS))
            .map(|p| format!("${p}/mo"));

        PlanCard {
            id: product.id.clone(),
            name: product.name.clone(),
            description: product.description.clone(),
            location: regions
                .get(&product.region_id)
                .map(Region::location)
                .unwrap_or_else(|| product.region_id.clone()),
            rows,
            hourly_price,
            monthly_price,
            high_frequency: is_high_frequency(product),
            ram_gb,
        }
    }
}

/// Spec rows for a custom plan, matching the fixed-card layout so the
/// review screen renders both branches the same way.
pub fn custom_plan_rows(cpu: i64, ram_gb: i64, disk_gb: i64, bandwidth_tb: Option<i64>) -> Vec<SpecRow> {
    let mut rows = vec![
        SpecRow {
            label: "CPU",
            value: format!("{cpu} vCPU"),
        },
        SpecRow {
            label: "RAM",
            value: format!("{ram_gb} GB"),
        },
        SpecRow {
            label: "Storage",
            value: format!("{disk_gb} GB"),
        },
    ];
    if let Some(bw) = bandwidth_tb {
        rows.push(SpecRow {
            label: "Bandwidth",
            value: format!("{bw} TB"),
        });
    }
    rows
}

/// RAM floor in MB for the OS filter: the chosen fixed product's spec,
/// or the custom RAM input, whichever branch is active.
pub fn ram_mb_for_os_filter(plan: &Plan, products: &[Product]) -> Option<i64> {
    match plan {
        Plan::Fixed { product_id, .. } => products
            .iter()
            .find(|p| &p.id == product_id)
            .and_then(|p| ram_gb_from(&p.specification))
            .map(|gb| (gb * 1024.0).round() as i64),
        Plan::Custom { ram_gb, .. } => Some(ram_gb * 1024),
    }
}

/// Read a numeric spec field, trying each known name in order.
/// Numbers-as-strings are common in older catalog payloads.
pub fn quantity(spec: &Value, keys: &[&str]) -> Option<f64> {
    let obj = spec.as_object()?;
    for key in keys {
        if let Some(value) = obj.get(*key) {
            if let Some(n) = numeric(value) {
                return Some(n);
            }
        }
    }
    None
}

/// RAM with the MB fallback: `ramInMb` is the only variant that needs
/// a unit conversion.
fn ram_gb_from(spec: &Value) -> Option<f64> {
    quantity(spec, RAM_GB_KEYS).or_else(|| {
        spec.as_object()
            .and_then(|obj| obj.get(RAM_MB_KEY))
            .and_then(numeric)
            .map(|mb| mb / 1024.0)
    })
}

fn numeric(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
}

/// Integral values render bare; anything else gets one decimal place
/// with a trailing zero trimmed.
pub fn format_quantity(value: f64) -> String {
    let rendered = format!("{value:.1}");
    match rendered.strip_suffix(".0") {
        Some(integral) => integral.to_string(),
        None => rendered,
    }
}

fn price_text(item: &Value, keys: &[&str]) -> Option<String> {
    for key in keys {
        match item.get(*key) {
            Some(Value::Number(n)) => return Some(n.to_string()),
            Some(Value::String(s)) if !s.trim().is_empty() => {
                return Some(s.trim().to_string());
            }
            _ => {}
        }
    }
    None
}

/// Providers label their premium tier inconsistently; check tags, then
/// the product name, then the instance class.
fn is_high_frequency(product: &Product) -> bool {
    let matches = |text: &str| {
        let folded: String = text
            .chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .collect::<String>()
            .to_ascii_lowercase();
        folded.contains("highfrequency")
    };
    product.tags.iter().any(|tag| matches(tag))
        || matches(&product.name)
        || matches(&product.instance_class)
}

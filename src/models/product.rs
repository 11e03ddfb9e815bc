use serde_json::Value;

/// A fixed plan offered in a region.
///
/// `specification` and `price_items` stay as raw JSON: the provider has
/// shipped several spellings of the spec fields over time
/// (`ram`/`ramInGB`/`ramInMb`, ...), and all tolerant extraction lives
/// in the view-model builder rather than here.
#[derive(Debug, Clone)]
pub struct Product {
    pub id: String,
    pub name: String,
    pub description: String,
    pub instance_class: String,
    pub region_id: String,
    pub tags: Vec<String>,
    pub specification: Value,
    pub price_items: Vec<Value>,
}

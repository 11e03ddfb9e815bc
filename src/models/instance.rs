/// A provisioned instance as shown on the list and detail screens.
/// Optional fields are simply absent from some provider responses.
#[derive(Debug, Clone, Default)]
pub struct Instance {
    pub id: String,
    pub hostname: String,
    pub region: String,
    pub status: String,
    pub main_ip: Option<String>,
    pub main_ipv6: Option<String>,
    pub cpu: Option<i64>,
    pub ram_mb: Option<i64>,
    pub disk_gb: Option<i64>,
    pub os_name: Option<String>,
    pub product_id: Option<String>,
    pub created_at: Option<String>,
}

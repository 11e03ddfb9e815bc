use askama::Template;

use super::Globals;

#[derive(Template)]
#[template(path = "instance_detail.html")]
pub struct InstanceDetailTemplate {
    pub globals: Globals,
    pub id: String,
    pub hostname: String,
    pub region: String,
    pub status: String,
    pub status_class: &'static str,
    pub main_ip: String,
    pub main_ipv6: String,
    pub cpu: String,
    pub ram: String,
    pub disk: String,
    pub os_name: String,
    pub created_at: String,
    /// Delete, resize, OS and password changes, refund. Admins only
    /// get the power controls.
    pub owner_tools: bool,
}

use askama::Template;

use super::Globals;

pub struct InstanceRow {
    pub id: String,
    pub hostname: String,
    pub region: String,
    pub status: String,
    pub status_class: &'static str,
    pub main_ip: String,
    pub os_name: String,
}

#[derive(Template)]
#[template(path = "instances.html")]
pub struct InstancesTemplate {
    pub globals: Globals,
    pub instances: Vec<InstanceRow>,
    pub has_instances: bool,
    pub can_create: bool,
}

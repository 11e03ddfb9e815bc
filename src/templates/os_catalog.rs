use askama::Template;

use super::Globals;

pub struct OsRow {
    pub id: String,
    pub name: String,
    pub family: String,
    pub min_ram: String,
    pub active: bool,
    pub is_default: bool,
}

#[derive(Template)]
#[template(path = "os_catalog.html")]
pub struct OsCatalogTemplate {
    pub globals: Globals,
    pub images: Vec<OsRow>,
    pub has_images: bool,
}

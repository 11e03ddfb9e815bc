use askama::Template;

use super::Globals;

pub struct RegionRow {
    pub id: String,
    pub name: String,
    pub location: String,
    pub status: String,
    pub min_ram_gb: i64,
    pub min_disk_gb: i64,
}

#[derive(Template)]
#[template(path = "regions.html")]
pub struct RegionsTemplate {
    pub globals: Globals,
    pub regions: Vec<RegionRow>,
    pub has_regions: bool,
}

use askama::Template;

use super::{Globals, PlanChoice, RegionChoice};

#[derive(Template)]
#[template(path = "products.html")]
pub struct ProductsTemplate {
    pub globals: Globals,
    pub regions: Vec<RegionChoice>,
    pub cards: Vec<PlanChoice>,
    pub has_cards: bool,
}

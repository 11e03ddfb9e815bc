use askama::Template;

use super::{CustomForm, Globals, PlanChoice};

#[derive(Template)]
#[template(path = "instance_resize.html")]
pub struct ResizeTemplate {
    pub globals: Globals,
    pub instance_id: String,
    pub hostname: String,
    pub cards: Vec<PlanChoice>,
    pub has_cards: bool,
    pub custom: CustomForm,
}

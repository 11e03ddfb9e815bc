use askama::Template;

use super::{CustomForm, Globals, HiddenField, PlanChoice, StepLink};

#[derive(Template)]
#[template(path = "create_plan.html")]
pub struct WizardPlanTemplate {
    pub globals: Globals,
    pub steps: Vec<StepLink>,
    pub back_url: String,
    pub region_label: String,
    pub is_custom: bool,
    pub cards: Vec<PlanChoice>,
    pub has_cards: bool,
    pub extra_disk_gb: String,
    pub extra_bandwidth_tb: String,
    pub custom: CustomForm,
    pub min_ram_gb: i64,
    pub min_disk_gb: i64,
    pub hidden: Vec<HiddenField>,
}

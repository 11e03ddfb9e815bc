use askama::Template;

use super::{Globals, HiddenField, RegionChoice, StepLink};

/// Raw input echo for the start step, so rejected submissions come
/// back with what the operator typed.
pub struct StartForm {
    pub hostnames_text: String,
    pub instance_class: String,
    pub plan_type: String,
    pub assign_ipv4: bool,
    pub assign_ipv6: bool,
    pub floating_ip_count: String,
}

#[derive(Template)]
#[template(path = "create_start.html")]
pub struct WizardStartTemplate {
    pub globals: Globals,
    pub steps: Vec<StepLink>,
    pub regions: Vec<RegionChoice>,
    pub has_regions: bool,
    pub form: StartForm,
    pub hidden: Vec<HiddenField>,
}

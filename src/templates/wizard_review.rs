use askama::Template;

use crate::viewmodel::SpecRow;

use super::{Globals, HiddenField, StepLink};

/// Everything the review page shows, re-resolved from the URL state
/// and the live catalogs on every GET.
pub struct ReviewSummary {
    pub hostnames: Vec<String>,
    pub region: String,
    pub instance_class: String,
    pub plan_name: String,
    pub rows: Vec<SpecRow>,
    pub hourly: String,
    pub monthly: String,
    pub os_label: String,
    pub key_names: Vec<String>,
    pub has_keys: bool,
    pub assign_ipv4: bool,
    pub assign_ipv6: bool,
    pub floating_ip_count: i64,
}

#[derive(Template)]
#[template(path = "create_review.html")]
pub struct WizardReviewTemplate {
    pub globals: Globals,
    pub steps: Vec<StepLink>,
    pub back_url: String,
    pub summary: ReviewSummary,
    pub hidden: Vec<HiddenField>,
}

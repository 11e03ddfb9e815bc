use askama::Template;

use super::{Globals, HiddenField, StepLink};

pub struct KeyChoice {
    pub id: i64,
    pub name: String,
    pub fingerprint: String,
    pub selected: bool,
}

#[derive(Template)]
#[template(path = "create_keys.html")]
pub struct WizardKeysTemplate {
    pub globals: Globals,
    pub steps: Vec<StepLink>,
    pub back_url: String,
    pub keys: Vec<KeyChoice>,
    pub has_keys: bool,
    pub hidden: Vec<HiddenField>,
}

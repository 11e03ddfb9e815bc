use askama::Template;

use super::{Globals, HiddenField, OsChoice, StepLink};

#[derive(Template)]
#[template(path = "create_os.html")]
pub struct WizardOsTemplate {
    pub globals: Globals,
    pub steps: Vec<StepLink>,
    pub back_url: String,
    pub images: Vec<OsChoice>,
    pub has_images: bool,
    pub hidden: Vec<HiddenField>,
}

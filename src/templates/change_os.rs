use askama::Template;

use super::{Globals, OsChoice};

#[derive(Template)]
#[template(path = "instance_change_os.html")]
pub struct ChangeOsTemplate {
    pub globals: Globals,
    pub instance_id: String,
    pub hostname: String,
    pub images: Vec<OsChoice>,
    pub has_images: bool,
}

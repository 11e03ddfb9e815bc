use askama::Template;

use super::Globals;

#[derive(Template)]
#[template(path = "instance_change_pass.html")]
pub struct ChangePassTemplate {
    pub globals: Globals,
    pub instance_id: String,
    pub hostname: String,
    /// Set after a successful change; shown exactly once.
    pub new_password: String,
    pub has_password: bool,
}

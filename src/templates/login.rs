use askama::Template;

use super::Globals;

#[derive(Template)]
#[template(path = "login.html")]
pub struct LoginTemplate {
    pub globals: Globals,
    pub error: Option<String>,
}

use askama::Template;

use super::Globals;

/// Generic confirmation page for destructive one-shot actions.
#[derive(Template)]
#[template(path = "confirm.html")]
pub struct ConfirmTemplate {
    pub globals: Globals,
    pub title: String,
    pub message: String,
    pub confirm_url: String,
    pub cancel_url: String,
    pub button: String,
}

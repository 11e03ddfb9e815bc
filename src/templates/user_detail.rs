use askama::Template;

use super::Globals;

/// One instance checkbox on the access form.
pub struct AccessRow {
    pub id: String,
    pub hostname: String,
    pub status: String,
    pub assigned: bool,
}

#[derive(Template)]
#[template(path = "user_detail.html")]
pub struct UserDetailTemplate {
    pub globals: Globals,
    pub username: String,
    pub role: String,
    pub is_admin: bool,
    /// Role and deletion controls are disabled for the acting account.
    pub is_self: bool,
    pub access_rows: Vec<AccessRow>,
    pub has_access_rows: bool,
}

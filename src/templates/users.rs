use askama::Template;

use super::Globals;

pub struct UserRow {
    pub username: String,
    pub role: String,
    pub assigned_count: usize,
    pub is_self: bool,
}

#[derive(Template)]
#[template(path = "users.html")]
pub struct UsersTemplate {
    pub globals: Globals,
    pub users: Vec<UserRow>,
}

use askama::Template;

use super::Globals;

pub struct KeyRow {
    pub id: i64,
    pub name: String,
    pub fingerprint: String,
    pub created_at: String,
}

#[derive(Template)]
#[template(path = "ssh_keys.html")]
pub struct SshKeysTemplate {
    pub globals: Globals,
    pub keys: Vec<KeyRow>,
    pub has_keys: bool,
}

//! Role checks for every wizard and CRUD endpoint.
//!
//! Each check either passes the resolved [`CurrentUser`] through or
//! yields a redirect toward the nearest permitted screen, with a flash
//! explaining why. Handlers use them as `let user = match ... { Ok(u)
//! => u, Err(r) => return r.into_response() }`.

use axum::response::Redirect;
use axum_extra::extract::cookie::CookieJar;

use crate::models::{CurrentUser, SharedState};

use super::session::{push_flash, username_for};

/// Resolve the acting user from the session cookie and the user store.
/// A session whose account has been deleted resolves to nobody.
pub fn current_user(state: &SharedState, jar: &CookieJar) -> Option<CurrentUser> {
    let username = username_for(state, jar)?;
    let record = state.store.get(&username)?;
    Some(CurrentUser {
        username,
        role: record.role,
    })
}

pub fn require_authenticated(
    state: &SharedState,
    jar: &CookieJar,
) -> Result<CurrentUser, Redirect> {
    current_user(state, jar).ok_or_else(|| Redirect::to("/login"))
}

/// Owner-only screens: provisioning wizard, user management, SSH keys.
pub fn require_owner(state: &SharedState, jar: &CookieJar) -> Result<CurrentUser, Redirect> {
    let user = require_authenticated(state, jar)?;
    if user.is_owner() {
        Ok(user)
    } else {
        push_flash(state, jar, "Owner access is required for that page.");
        Err(Redirect::to("/instances"))
    }
}

/// Owners see every instance; admins only the ids on their allow-list
/// (compared as strings, exactly as stored).
pub fn may_access_instance(state: &SharedState, user: &CurrentUser, instance_id: &str) -> bool {
    if user.is_owner() {
        return true;
    }
    state
        .store
        .get(&user.username)
        .map(|record| record.assigned_instances.iter().any(|id| id == instance_id))
        .unwrap_or(false)
}

pub fn require_instance_access(
    state: &SharedState,
    jar: &CookieJar,
    instance_id: &str,
) -> Result<CurrentUser, Redirect> {
    let user = require_authenticated(state, jar)?;
    if may_access_instance(state, &user, instance_id) {
        Ok(user)
    } else {
        push_flash(
            state,
            jar,
            format!("You do not have access to instance {instance_id}."),
        );
        Err(Redirect::to("/instances"))
    }
}

/// Landing page for the current session: the instance list when logged
/// in, the login form otherwise.
pub fn landing_for(state: &SharedState, jar: &CookieJar) -> Redirect {
    match current_user(state, jar) {
        Some(_) => Redirect::to("/instances"),
        None => Redirect::to("/login"),
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use tempfile::TempDir;

    use crate::auth::password::hash_password;
    use crate::auth::session::{start_session, take_flashes};
    use crate::config::Config;
    use crate::models::Role;
    use crate::store::UserStore;

    use super::*;

    fn state_in(dir: &TempDir) -> SharedState {
        let config = Config {
            host: "127.0.0.1".to_string(),
            port: 0,
            api_base_url: "http://localhost:9".to_string(),
            api_token: String::new(),
            public_base_url: String::new(),
            users_file: dir.path().join("users.json"),
            customer_id: None,
            upstream_timeout: Duration::from_secs(1),
        };
        let store = UserStore::open(&config.users_file).unwrap();
        SharedState::new(&config, store)
    }

    fn add_admin(state: &SharedState, username: &str, assigned: &[&str]) {
        state
            .store
            .create(username, hash_password("pw", 1_000), Role::Admin)
            .unwrap();
        state
            .store
            .set_assigned_instances(username, assigned.iter().map(|s| s.to_string()).collect())
            .unwrap();
    }

    #[test]
    fn owners_see_every_instance_admins_only_their_list() {
        let dir = TempDir::new().unwrap();
        let state = state_in(&dir);
        add_admin(&state, "ada", &["42"]);

        let owner = CurrentUser {
            username: "owner".to_string(),
            role: Role::Owner,
        };
        assert!(may_access_instance(&state, &owner, "42"));
        assert!(may_access_instance(&state, &owner, "43"));

        let admin = CurrentUser {
            username: "ada".to_string(),
            role: Role::Admin,
        };
        assert!(may_access_instance(&state, &admin, "42"));
        assert!(!may_access_instance(&state, &admin, "43"));
    }

    #[test]
    fn refused_instance_access_flashes_and_redirects() {
        let dir = TempDir::new().unwrap();
        let state = state_in(&dir);
        add_admin(&state, "ada", &["42"]);
        let jar = CookieJar::new().add(start_session(&state, "ada"));

        let user = require_instance_access(&state, &jar, "42").unwrap();
        assert_eq!(user.username, "ada");

        assert!(require_instance_access(&state, &jar, "43").is_err());
        assert_eq!(
            take_flashes(&state, &jar),
            vec!["You do not have access to instance 43.".to_string()]
        );
    }

    #[test]
    fn sessions_for_deleted_accounts_resolve_to_nobody() {
        let dir = TempDir::new().unwrap();
        let state = state_in(&dir);
        add_admin(&state, "ada", &[]);
        let jar = CookieJar::new().add(start_session(&state, "ada"));
        assert!(current_user(&state, &jar).is_some());

        state.store.delete("owner", "ada").unwrap();
        assert!(current_user(&state, &jar).is_none());
        assert!(require_authenticated(&state, &jar).is_err());
    }
}

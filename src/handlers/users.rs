//! Local account administration: the user list, per-user detail with
//! the instance allow-list, role changes, password resets, deletion.
//! All of it owner-only; the store itself enforces the last-owner and
//! self-change rules.

use axum::body::Bytes;
use axum::extract::{Form, Path, State};
use axum::response::{IntoResponse, Response};
use axum_extra::extract::cookie::CookieJar;
use serde::Deserialize;

use crate::auth::gate;
use crate::auth::password::hash_password;
use crate::config::DEFAULT_PBKDF2_ITERATIONS;
use crate::models::{Role, SharedState};
use crate::store::normalize_username;
use crate::templates::{AccessRow, UserDetailTemplate, UserRow, UsersTemplate};
use crate::upstream::instances;

use super::helpers::{flash_redirect, flash_upstream, form_map, globals, render};

pub async fn list_get(State(state): State<SharedState>, jar: CookieJar) -> Response {
    let acting = match gate::require_owner(&state, &jar) {
        Ok(user) => user,
        Err(redirect) => return redirect.into_response(),
    };
    let rows: Vec<UserRow> = state
        .store
        .all()
        .into_iter()
        .map(|(username, record)| UserRow {
            is_self: username == acting.username,
            role: record.role.as_str().to_string(),
            assigned_count: record.assigned_instances.len(),
            username,
        })
        .collect();

    let globals = globals(&state, &jar);
    render(UsersTemplate {
        globals,
        users: rows,
    })
}

#[derive(Deserialize)]
pub struct NewUserForm {
    pub username: String,
    pub password: String,
    pub role: String,
}

pub async fn create_post(
    State(state): State<SharedState>,
    jar: CookieJar,
    Form(form): Form<NewUserForm>,
) -> Response {
    if let Err(redirect) = gate::require_owner(&state, &jar) {
        return redirect.into_response();
    }
    let Some(role) = Role::parse(&form.role) else {
        return flash_redirect(&state, &jar, "Role must be 'owner' or 'admin'.", "/users")
            .into_response();
    };
    if form.password.is_empty() {
        return flash_redirect(&state, &jar, "Password must not be empty.", "/users")
            .into_response();
    }
    let hash = hash_password(&form.password, DEFAULT_PBKDF2_ITERATIONS);
    match state.store.create(&form.username, hash, role) {
        Ok(()) => {
            let username = normalize_username(&form.username);
            tracing::info!(%username, role = role.as_str(), "user created");
            flash_redirect(&state, &jar, format!("User '{username}' created."), "/users")
                .into_response()
        }
        Err(error) => flash_redirect(&state, &jar, error.to_string(), "/users").into_response(),
    }
}

pub async fn detail_get(
    State(state): State<SharedState>,
    jar: CookieJar,
    Path(username): Path<String>,
) -> Response {
    let acting = match gate::require_owner(&state, &jar) {
        Ok(user) => user,
        Err(redirect) => return redirect.into_response(),
    };
    let username = normalize_username(&username);
    let Some(record) = state.store.get(&username) else {
        return flash_redirect(
            &state,
            &jar,
            format!("User '{username}' does not exist."),
            "/users",
        )
        .into_response();
    };

    // The allow-list editor only applies to admins; owners see
    // everything regardless.
    let access_rows: Vec<AccessRow> = if record.role.is_owner() {
        Vec::new()
    } else {
        match instances::list(&state.upstream).await {
            Ok(list) => list
                .iter()
                .map(|instance| AccessRow {
                    id: instance.id.clone(),
                    hostname: instance.hostname.clone(),
                    status: instance.status.clone(),
                    assigned: record.assigned_instances.contains(&instance.id),
                })
                .collect(),
            Err(error) => {
                flash_upstream(&state, &jar, &error);
                Vec::new()
            }
        }
    };

    let globals = globals(&state, &jar);
    render(UserDetailTemplate {
        globals,
        is_self: username == acting.username,
        username,
        role: record.role.as_str().to_string(),
        is_admin: !record.role.is_owner(),
        has_access_rows: !access_rows.is_empty(),
        access_rows,
    })
}

#[derive(Deserialize)]
pub struct RoleForm {
    pub role: String,
}

pub async fn role_post(
    State(state): State<SharedState>,
    jar: CookieJar,
    Path(username): Path<String>,
    Form(form): Form<RoleForm>,
) -> Response {
    let acting = match gate::require_owner(&state, &jar) {
        Ok(user) => user,
        Err(redirect) => return redirect.into_response(),
    };
    let username = normalize_username(&username);
    let detail_url = format!("/users/{username}");
    let Some(role) = Role::parse(&form.role) else {
        return flash_redirect(&state, &jar, "Role must be 'owner' or 'admin'.", &detail_url)
            .into_response();
    };
    match state.store.set_role(&acting.username, &username, role) {
        Ok(()) => {
            tracing::info!(%username, role = role.as_str(), "role changed");
            flash_redirect(
                &state,
                &jar,
                format!("'{username}' is now an {}.", role.as_str()),
                &detail_url,
            )
            .into_response()
        }
        Err(error) => flash_redirect(&state, &jar, error.to_string(), &detail_url).into_response(),
    }
}

#[derive(Deserialize)]
pub struct PasswordForm {
    pub password: String,
}

pub async fn reset_password_post(
    State(state): State<SharedState>,
    jar: CookieJar,
    Path(username): Path<String>,
    Form(form): Form<PasswordForm>,
) -> Response {
    if let Err(redirect) = gate::require_owner(&state, &jar) {
        return redirect.into_response();
    }
    let username = normalize_username(&username);
    let detail_url = format!("/users/{username}");
    if form.password.is_empty() {
        return flash_redirect(&state, &jar, "Password must not be empty.", &detail_url)
            .into_response();
    }
    let hash = hash_password(&form.password, DEFAULT_PBKDF2_ITERATIONS);
    match state.store.set_password_hash(&username, hash) {
        Ok(()) => flash_redirect(
            &state,
            &jar,
            format!("Password reset for '{username}'."),
            &detail_url,
        )
        .into_response(),
        Err(error) => flash_redirect(&state, &jar, error.to_string(), &detail_url).into_response(),
    }
}

pub async fn delete_post(
    State(state): State<SharedState>,
    jar: CookieJar,
    Path(username): Path<String>,
) -> Response {
    let acting = match gate::require_owner(&state, &jar) {
        Ok(user) => user,
        Err(redirect) => return redirect.into_response(),
    };
    let username = normalize_username(&username);
    match state.store.delete(&acting.username, &username) {
        Ok(()) => {
            tracing::info!(%username, "user deleted");
            flash_redirect(&state, &jar, format!("User '{username}' deleted."), "/users")
                .into_response()
        }
        Err(error) => flash_redirect(
            &state,
            &jar,
            error.to_string(),
            &format!("/users/{username}"),
        )
        .into_response(),
    }
}

pub async fn access_post(
    State(state): State<SharedState>,
    jar: CookieJar,
    Path(username): Path<String>,
    body: Bytes,
) -> Response {
    if let Err(redirect) = gate::require_owner(&state, &jar) {
        return redirect.into_response();
    }
    let username = normalize_username(&username);
    let detail_url = format!("/users/{username}");
    let form = form_map(&body);
    let instance_ids: Vec<String> = form
        .all("instance_ids")
        .into_iter()
        .map(str::to_string)
        .collect();
    match state.store.set_assigned_instances(&username, instance_ids) {
        Ok(()) => {
            flash_redirect(&state, &jar, "Instance access updated.", &detail_url).into_response()
        }
        Err(error) => flash_redirect(&state, &jar, error.to_string(), &detail_url).into_response(),
    }
}

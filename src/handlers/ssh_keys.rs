//! SSH key management, proxied straight to the provider's account
//! catalog.

use axum::extract::{Form, Path, State};
use axum::response::{IntoResponse, Redirect, Response};
use axum_extra::extract::cookie::CookieJar;
use serde::Deserialize;

use crate::auth::gate;
use crate::models::SharedState;
use crate::templates::{KeyRow, SshKeysTemplate};
use crate::upstream::ssh_keys;

use super::helpers::{flash_redirect, flash_upstream, globals, render};

pub async fn list_get(State(state): State<SharedState>, jar: CookieJar) -> Response {
    if let Err(redirect) = gate::require_owner(&state, &jar) {
        return redirect.into_response();
    }
    let keys = match ssh_keys::list(&state.upstream).await {
        Ok(list) => list,
        Err(error) => {
            flash_upstream(&state, &jar, &error);
            Vec::new()
        }
    };
    let rows: Vec<KeyRow> = keys
        .iter()
        .map(|key| KeyRow {
            id: key.id,
            name: key.name.clone(),
            fingerprint: key.fingerprint.clone().unwrap_or_default(),
            created_at: key.created_at.clone().unwrap_or_else(|| "—".to_string()),
        })
        .collect();

    let globals = globals(&state, &jar);
    render(SshKeysTemplate {
        globals,
        has_keys: !rows.is_empty(),
        keys: rows,
    })
}

#[derive(Deserialize)]
pub struct NewKeyForm {
    pub name: String,
    pub public_key: String,
}

pub async fn create_post(
    State(state): State<SharedState>,
    jar: CookieJar,
    Form(form): Form<NewKeyForm>,
) -> Response {
    if let Err(redirect) = gate::require_owner(&state, &jar) {
        return redirect.into_response();
    }
    let name = form.name.trim();
    let public_key = form.public_key.trim();
    if name.is_empty() || public_key.is_empty() {
        return flash_redirect(
            &state,
            &jar,
            "Both a name and the public key material are required.",
            "/ssh-keys",
        )
        .into_response();
    }
    match ssh_keys::create(&state.upstream, name, public_key).await {
        Ok(_) => flash_redirect(&state, &jar, format!("SSH key '{name}' added."), "/ssh-keys")
            .into_response(),
        Err(error) => {
            flash_upstream(&state, &jar, &error);
            Redirect::to("/ssh-keys").into_response()
        }
    }
}

pub async fn delete_post(
    State(state): State<SharedState>,
    jar: CookieJar,
    Path(id): Path<i64>,
) -> Response {
    if let Err(redirect) = gate::require_owner(&state, &jar) {
        return redirect.into_response();
    }
    match ssh_keys::delete(&state.upstream, id).await {
        Ok(_) => flash_redirect(&state, &jar, "SSH key removed.", "/ssh-keys").into_response(),
        Err(error) => {
            flash_upstream(&state, &jar, &error);
            Redirect::to("/ssh-keys").into_response()
        }
    }
}

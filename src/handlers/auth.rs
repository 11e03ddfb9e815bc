use axum::extract::{Form, State};
use axum::response::{IntoResponse, Redirect, Response};
use axum_extra::extract::cookie::CookieJar;
use serde::Deserialize;

use crate::auth::gate;
use crate::auth::password::verify_password;
use crate::auth::session::{end_session, start_session};
use crate::models::SharedState;
use crate::store::normalize_username;
use crate::templates::LoginTemplate;

use super::helpers::{globals, render};

#[derive(Deserialize)]
pub struct LoginForm {
    pub username: String,
    pub password: String,
}

pub async fn root_get(State(state): State<SharedState>, jar: CookieJar) -> Redirect {
    gate::landing_for(&state, &jar)
}

pub async fn login_get(State(state): State<SharedState>, jar: CookieJar) -> Response {
    if gate::current_user(&state, &jar).is_some() {
        return Redirect::to("/instances").into_response();
    }
    render(LoginTemplate {
        globals: globals(&state, &jar),
        error: None,
    })
}

pub async fn login_post(
    State(state): State<SharedState>,
    jar: CookieJar,
    Form(form): Form<LoginForm>,
) -> Response {
    let username = normalize_username(&form.username);
    let verified = state
        .store
        .get(&username)
        .map(|record| verify_password(&record.password, &form.password))
        .unwrap_or(false);
    if verified {
        tracing::info!(%username, "login");
        let cookie = start_session(&state, &username);
        return (jar.add(cookie), Redirect::to("/instances")).into_response();
    }
    tracing::warn!(%username, "rejected login attempt");
    render(LoginTemplate {
        globals: globals(&state, &jar),
        error: Some("Invalid username or password.".to_string()),
    })
}

pub async fn logout_post(State(state): State<SharedState>, jar: CookieJar) -> Response {
    let expired = end_session(&state, &jar);
    (jar.add(expired), Redirect::to("/login")).into_response()
}

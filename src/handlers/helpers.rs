//! Small shared pieces used by every page handler: building the common
//! template chrome, rendering, and the flash-then-redirect failure shape.

use askama::Template;
use axum::body::Bytes;
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Redirect, Response};
use axum_extra::extract::cookie::CookieJar;

use crate::auth::gate;
use crate::auth::session::{push_flash, take_flashes};
use crate::models::SharedState;
use crate::templates::Globals;
use crate::upstream::UpstreamError;
use crate::wizard::validate::FieldError;
use crate::wizard::QueryMap;

/// Parse a raw query string, absent meaning empty.
pub fn query_map(raw: Option<String>) -> QueryMap {
    QueryMap::parse(raw.as_deref().unwrap_or(""))
}

/// Parse a urlencoded form body. Non-UTF-8 bodies decode as empty,
/// which the per-field checks then reject.
pub fn form_map(body: &Bytes) -> QueryMap {
    QueryMap::parse(std::str::from_utf8(body).unwrap_or(""))
}

/// Build the shared page chrome. This drains the session's flash queue,
/// so every handler must finish pushing flashes before calling it.
pub fn globals(state: &SharedState, jar: &CookieJar) -> Globals {
    let user = gate::current_user(state, jar);
    let flash_messages = take_flashes(state, jar);
    Globals {
        username: user
            .as_ref()
            .map(|u| u.username.clone())
            .unwrap_or_default(),
        logged_in: user.is_some(),
        is_owner: user.as_ref().map(|u| u.is_owner()).unwrap_or(false),
        api_host: state.api_host.clone(),
        has_flash: !flash_messages.is_empty(),
        flash_messages,
    }
}

pub fn render<T: Template>(template: T) -> Response {
    match template.render() {
        Ok(html) => Html(html).into_response(),
        Err(error) => {
            tracing::error!(%error, "template rendering failed");
            (StatusCode::INTERNAL_SERVER_ERROR, "template error").into_response()
        }
    }
}

/// Queue one message and bounce to `target`.
pub fn flash_redirect(
    state: &SharedState,
    jar: &CookieJar,
    message: impl Into<String>,
    target: &str,
) -> Redirect {
    push_flash(state, jar, message.into());
    Redirect::to(target)
}

/// Queue one flash per failed field check.
pub fn flash_field_errors(state: &SharedState, jar: &CookieJar, errors: &[FieldError]) {
    for error in errors {
        push_flash(state, jar, error.message.clone());
    }
}

/// Queue the human-readable side of an upstream failure.
pub fn flash_upstream(state: &SharedState, jar: &CookieJar, error: &UpstreamError) {
    tracing::warn!(%error, "upstream call failed");
    push_flash(state, jar, error.detail());
}

use axum::extract::{Request, State};
use axum::middleware::Next;
use axum::response::{IntoResponse, Redirect, Response};
use axum_extra::extract::cookie::CookieJar;

use crate::auth::gate;
use crate::models::SharedState;

/// Sends anonymous requests to the login form before they reach any
/// protected handler. Fine-grained role checks stay in the handlers.
pub async fn require_login(
    State(state): State<SharedState>,
    jar: CookieJar,
    request: Request,
    next: Next,
) -> Response {
    if gate::current_user(&state, &jar).is_some() {
        next.run(request).await
    } else {
        Redirect::to("/login").into_response()
    }
}

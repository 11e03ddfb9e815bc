use axum_extra::extract::cookie::{Cookie, CookieJar};

use crate::models::SharedState;

use super::password::random_session_id;

pub const SESSION_COOKIE: &str = "session_id";
const SESSION_DAYS: i64 = 7;

pub fn session_id(jar: &CookieJar) -> Option<String> {
    jar.get(SESSION_COOKIE).map(|c| c.value().to_string())
}

/// The username bound to the request's session cookie, if any.
pub fn username_for(state: &SharedState, jar: &CookieJar) -> Option<String> {
    let sid = session_id(jar)?;
    let sessions = state.sessions.lock().unwrap();
    sessions.get(&sid).cloned()
}

/// Create a session for `username` and return the cookie to set.
pub fn start_session(state: &SharedState, username: &str) -> Cookie<'static> {
    let sid = random_session_id();
    state
        .sessions
        .lock()
        .unwrap()
        .insert(sid.clone(), username.to_string());

    let mut cookie = Cookie::new(SESSION_COOKIE, sid);
    cookie.set_path("/");
    cookie.set_http_only(true);
    cookie.set_max_age(time::Duration::days(SESSION_DAYS));
    cookie
}

/// Drop the request's session (and its pending flashes) and return an
/// expired cookie that clears the browser's copy.
pub fn end_session(state: &SharedState, jar: &CookieJar) -> Cookie<'static> {
    if let Some(sid) = session_id(jar) {
        state.sessions.lock().unwrap().remove(&sid);
        state.flashes.lock().unwrap().remove(&sid);
    }
    let mut cookie = Cookie::new(SESSION_COOKIE, "");
    cookie.set_path("/");
    cookie.set_http_only(true);
    cookie.set_max_age(time::Duration::ZERO);
    cookie
}

/// Queue a message for the session's next rendered page. Messages for
/// requests without a session are dropped.
pub fn push_flash(state: &SharedState, jar: &CookieJar, message: impl Into<String>) {
    if let Some(sid) = session_id(jar) {
        state
            .flashes
            .lock()
            .unwrap()
            .entry(sid)
            .or_default()
            .push(message.into());
    }
}

/// Drain and return the session's pending messages.
pub fn take_flashes(state: &SharedState, jar: &CookieJar) -> Vec<String> {
    match session_id(jar) {
        Some(sid) => state
            .flashes
            .lock()
            .unwrap()
            .remove(&sid)
            .unwrap_or_default(),
        None => Vec::new(),
    }
}

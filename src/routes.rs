//! The console's URL surface. Everything except the login page and the
//! stylesheet sits behind the session check; role checks stay in the
//! handlers.

use axum::http::header::CONTENT_TYPE;
use axum::middleware::from_fn_with_state;
use axum::routing::{get, post};
use axum::Router;
use tower_http::trace::TraceLayer;

use crate::handlers::{auth, catalog, instances, middleware, ssh_keys, users, wizard};
use crate::models::SharedState;

/// Assemble the application router. `stylesheet` is embedded CSS,
/// served from memory so the binary stays self-contained.
pub fn build_router(state: SharedState, stylesheet: String) -> Router {
    let protected = Router::new()
        .route("/instances", get(instances::list_get))
        .route("/instances/:id", get(instances::detail_get))
        .route(
            "/instances/:id/confirm/:action",
            get(instances::confirm_get),
        )
        .route("/instances/:id/poweron", post(instances::poweron_post))
        .route("/instances/:id/poweroff", post(instances::poweroff_post))
        .route("/instances/:id/reset", post(instances::reset_post))
        .route("/instances/:id/delete", post(instances::delete_post))
        .route("/instances/:id/refund", post(instances::refund_post))
        .route(
            "/instances/:id/change-pass",
            get(instances::change_pass_get).post(instances::change_pass_post),
        )
        .route(
            "/instances/:id/change-os",
            get(instances::change_os_get).post(instances::change_os_post),
        )
        .route(
            "/instances/:id/resize",
            get(instances::resize_get).post(instances::resize_post),
        )
        .route(
            "/create/start",
            get(wizard::start_get).post(wizard::start_post),
        )
        .route("/create/plan", get(wizard::plan_get).post(wizard::plan_post))
        .route("/create/os", get(wizard::os_get).post(wizard::os_post))
        .route(
            "/create/ssh-keys",
            get(wizard::keys_get).post(wizard::keys_post),
        )
        .route(
            "/create/review",
            get(wizard::review_get).post(wizard::review_post),
        )
        .route("/regions", get(catalog::regions_get))
        .route("/products", get(catalog::products_get))
        .route("/os", get(catalog::os_get))
        .route(
            "/ssh-keys",
            get(ssh_keys::list_get).post(ssh_keys::create_post),
        )
        .route("/ssh-keys/:id/delete", post(ssh_keys::delete_post))
        .route("/users", get(users::list_get).post(users::create_post))
        .route("/users/:username", get(users::detail_get))
        .route("/users/:username/role", post(users::role_post))
        .route(
            "/users/:username/reset-password",
            post(users::reset_password_post),
        )
        .route("/users/:username/delete", post(users::delete_post))
        .route("/users/:username/access", post(users::access_post))
        .route_layer(from_fn_with_state(
            state.clone(),
            middleware::require_login,
        ));

    Router::new()
        .route("/", get(auth::root_get))
        .route("/login", get(auth::login_get).post(auth::login_post))
        .route("/logout", post(auth::logout_post))
        .route(
            "/static/styles.css",
            get(move || async move { ([(CONTENT_TYPE, "text/css")], stylesheet) }),
        )
        .merge(protected)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

use super::state::ApiState;
use super::{health, objects};
use axum::Router;
use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post, put};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

/// Liveness probe routes.
pub fn system_router<S>() -> Router<S>
where
    S: Send + Sync + Clone + 'static,
{
    Router::<S>::new().route("/health", get(health::health_handler))
}

/// Object routes: multipart upload, raw PUT, and static GET/HEAD of stored objects.
///
/// GET and HEAD on `/{bucket}/{*key}` are served from the storage root by `ServeDir`,
/// which maps the request path onto `<root>/<bucket>/<key>`.
pub fn object_router(state: &ApiState) -> Router<ApiState> {
    let objects = ServeDir::new(state.storage.root());

    Router::new()
        .route("/{bucket}", post(objects::upload_handler))
        .route("/{bucket}/{*key}", put(objects::put_handler).fallback_service(objects))
}

/// The complete application: system and object routes, body limits and request tracing.
///
/// Request bodies are unlimited unless `server.body_limit` is configured.
pub fn api_router(state: ApiState) -> Router {
    health::start_clock();

    let router = Router::new().merge(system_router()).merge(object_router(&state));

    let router = match state.config.server.body_limit {
        Some(limit) => {
            router.layer(DefaultBodyLimit::max(limit)).layer(RequestBodyLimitLayer::new(limit))
        },
        None => router.layer(DefaultBodyLimit::disable()),
    };

    router.layer(TraceLayer::new_for_http()).with_state(state)
}

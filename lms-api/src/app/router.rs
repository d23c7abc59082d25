use axum::http::{header, HeaderValue, Method};
use axum::middleware::from_fn_with_state;
use axum::routing::{get, post};
use axum::Router;
use lms_core::ThrottleRule;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;

use super::handlers::{
    create_comment, get_course, handler_404, health, list_comments, list_contents, list_courses,
    list_members, throttle_status,
};
use super::middleware::{client_id_middleware, throttle_middleware, Throttled};
use super::state::AppState;

/// 根据配置的来源列表构建 CorsLayer
fn build_cors_layer(cors_origins: Vec<String>) -> CorsLayer {
    let base = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION, header::ACCEPT])
        .expose_headers([header::RETRY_AFTER]);

    if cors_origins.is_empty() {
        tracing::warn!(
            "LMS_CORS_ORIGINS not configured, allowing all origins. \
             Set LMS_CORS_ORIGINS in production."
        );
        base.allow_origin(AllowOrigin::any())
    } else {
        let origins: Vec<HeaderValue> = cors_origins
            .into_iter()
            .filter_map(|o| o.parse().ok())
            .collect();
        base.allow_origin(origins).allow_credentials(true)
    }
}

/// Wrap every route of `routes` in a throttle stage for `rule`.
fn throttled(state: &AppState, rule: ThrottleRule, routes: Router<AppState>) -> Router<AppState> {
    routes.route_layer(from_fn_with_state(
        Throttled::new(state.throttle.clone(), rule),
        throttle_middleware,
    ))
}

/// Build the router with routes and middleware wired.
pub fn app_router(state: AppState, cors_origins: Vec<String>) -> Router {
    let rules = state.rules;

    let public_routes = Router::new().route("/health", get(health));

    let course_routes = throttled(
        &state,
        rules.courses_list,
        Router::new().route("/api/v1/courses", get(list_courses)),
    )
    .merge(throttled(
        &state,
        rules.relaxed,
        Router::new().route("/api/v1/courses/:id", get(get_course)),
    ));

    let member_routes = throttled(
        &state,
        rules.members_list,
        Router::new().route("/api/v1/members", get(list_members)),
    );

    let content_routes = throttled(
        &state,
        rules.contents_list,
        Router::new().route("/api/v1/contents", get(list_contents)),
    );

    // 同一路径，读写使用不同的规则
    let comment_routes = throttled(
        &state,
        rules.comments_list,
        Router::new().route("/api/v1/comments", get(list_comments)),
    )
    .merge(throttled(
        &state,
        rules.strict,
        Router::new().route("/api/v1/comments", post(create_comment)),
    ));

    let throttle_routes = throttled(
        &state,
        rules.moderate,
        Router::new().route("/api/v1/throttle/status", get(throttle_status)),
    );

    Router::new()
        .merge(public_routes)
        .merge(course_routes)
        .merge(member_routes)
        .merge(content_routes)
        .merge(comment_routes)
        .merge(throttle_routes)
        .fallback(handler_404)
        .layer(from_fn_with_state(state.clone(), client_id_middleware))
        .layer(build_cors_layer(cors_origins))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

use axum::extract::State;
use axum::http::{StatusCode, Uri};
use axum::Json;
use serde_json::json;

use crate::app::middleware::ClientId;
use crate::app::AppState;

pub async fn health(State(state): State<AppState>) -> Json<serde_json::Value> {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "tracked_clients": state.throttle.tracked_clients(),
    }))
}

/// 处理 404 错误，记录可疑请求
pub async fn handler_404(
    uri: Uri,
    ClientId(client): ClientId,
) -> (StatusCode, Json<serde_json::Value>) {
    tracing::warn!(path = %uri.path(), client = %client, "404 request");

    (
        StatusCode::NOT_FOUND,
        Json(json!({
            "code": "NotFound",
            "message": "the requested resource does not exist"
        })),
    )
}

use axum::extract::State;
use axum::Json;
use lms_core::ClientStats;
use tracing::instrument;

use crate::app::middleware::ClientId;
use crate::app::AppState;

/// GET /api/v1/throttle/status - 当前请求方的限流统计
#[instrument(skip_all)]
pub async fn throttle_status(
    State(state): State<AppState>,
    ClientId(client): ClientId,
) -> Json<ClientStats> {
    Json(state.throttle.stats(&client))
}

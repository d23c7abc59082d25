use std::future::Future;
use std::net::SocketAddr;
use std::pin::Pin;
use std::sync::Arc;

use axum::body::Body;
use axum::extract::{ConnectInfo, FromRequestParts, State};
use axum::http::request::Parts;
use axum::http::Request;
use axum::middleware::Next;
use axum::response::Response;
use lms_core::{Decision, RequestThrottle, ThrottleRule};

use super::error::ApiError;
use super::state::AppState;

/// Placeholder for clients whose address cannot be determined.
pub const UNKNOWN_CLIENT: &str = "unknown";

/// 请求方标识（通常为 IP），由 [`client_id_middleware`] 写入扩展
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientId(pub String);

impl<S: Send + Sync> FromRequestParts<S> for ClientId {
	type Rejection = ApiError;

	fn from_request_parts<'a, 'b, 'c>(
		parts: &'a mut Parts,
		_state: &'b S,
	) -> Pin<Box<dyn Future<Output = Result<Self, Self::Rejection>> + Send + 'c>>
	where
		'a: 'c,
		'b: 'c,
	{
		Box::pin(async move {
			Ok(parts
				.extensions
				.get::<ClientId>()
				.cloned()
				.unwrap_or_else(|| ClientId(UNKNOWN_CLIENT.to_string())))
		})
	}
}

/// 从请求中提取客户端 IP
/// 信任代理头时：X-Real-IP > X-Forwarded-For（第一个） > Socket Address
fn extract_client_ip(request: &Request<Body>, trust_proxy_headers: bool) -> String {
	if trust_proxy_headers {
		if let Some(real_ip) = request
			.headers()
			.get("X-Real-IP")
			.and_then(|v| v.to_str().ok())
			.map(str::trim)
			.filter(|v| !v.is_empty())
		{
			return real_ip.to_string();
		}

		// 最左边是真实客户端
		if let Some(first_ip) = request
			.headers()
			.get("X-Forwarded-For")
			.and_then(|v| v.to_str().ok())
			.and_then(|v| v.split(',').next())
			.map(str::trim)
			.filter(|v| !v.is_empty())
		{
			return first_ip.to_string();
		}
	}

	request
		.extensions()
		.get::<ConnectInfo<SocketAddr>>()
		.map(|ci| ci.0.ip().to_string())
		.unwrap_or_else(|| UNKNOWN_CLIENT.to_string())
}

/// Resolve the caller once per request so every throttle stage keys on the same id.
pub async fn client_id_middleware(
	State(state): State<AppState>,
	mut request: Request<Body>,
	next: Next,
) -> Response {
	let client = extract_client_ip(&request, state.trust_proxy_headers);
	request.extensions_mut().insert(ClientId(client));
	next.run(request).await
}

/// Middleware state: which throttle, under which rule.
#[derive(Clone)]
pub struct Throttled {
	throttle: Arc<RequestThrottle>,
	rule: ThrottleRule,
}

impl Throttled {
	pub fn new(throttle: Arc<RequestThrottle>, rule: ThrottleRule) -> Self {
		Self { throttle, rule }
	}
}

/// Admit the request under the stage's rule or answer 429 without calling the handler.
pub async fn throttle_middleware(
	State(guard): State<Throttled>,
	request: Request<Body>,
	next: Next,
) -> Result<Response, ApiError> {
	let client = request
		.extensions()
		.get::<ClientId>()
		.map(|c| c.0.clone())
		.unwrap_or_else(|| UNKNOWN_CLIENT.to_string());

	match guard.throttle.evaluate(&client, &guard.rule) {
		Decision::Admit { .. } => Ok(next.run(request).await),
		Decision::Reject(rejection) => {
			tracing::warn!(
				client = %client,
				rule = guard.rule.name(),
				path = %request.uri().path(),
				retry_after_ms = rejection.retry_after.as_millis() as u64,
				"request throttled"
			);
			Err(ApiError::rate_limited(&rejection))
		}
	}
}

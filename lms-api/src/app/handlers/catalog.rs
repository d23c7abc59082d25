//! 课程目录 API：课程、成员、内容、评论

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use lms_core::{
    Comment, CommentFilter, ContentFilter, Course, CourseContent, CourseFilter, CourseMember,
    MemberFilter, NewComment, Page, PageRequest,
};
use tracing::instrument;

use crate::app::extract::{ApiJson, ApiPath, ApiQuery};
use crate::app::{ApiError, AppState};

/// GET /api/v1/courses
#[instrument(skip_all)]
pub async fn list_courses(
    State(state): State<AppState>,
    ApiQuery(filter): ApiQuery<CourseFilter>,
    ApiQuery(page): ApiQuery<PageRequest>,
) -> Json<Page<Course>> {
    Json(state.catalog.list_courses(&filter, &page))
}

/// GET /api/v1/courses/:id
#[instrument(skip_all)]
pub async fn get_course(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<u64>,
) -> Result<Json<Course>, ApiError> {
    Ok(Json(state.catalog.get_course(id)?))
}

/// GET /api/v1/members
#[instrument(skip_all)]
pub async fn list_members(
    State(state): State<AppState>,
    ApiQuery(filter): ApiQuery<MemberFilter>,
    ApiQuery(page): ApiQuery<PageRequest>,
) -> Json<Page<CourseMember>> {
    Json(state.catalog.list_members(&filter, &page))
}

/// GET /api/v1/contents
#[instrument(skip_all)]
pub async fn list_contents(
    State(state): State<AppState>,
    ApiQuery(filter): ApiQuery<ContentFilter>,
    ApiQuery(page): ApiQuery<PageRequest>,
) -> Json<Page<CourseContent>> {
    Json(state.catalog.list_contents(&filter, &page))
}

/// GET /api/v1/comments
#[instrument(skip_all)]
pub async fn list_comments(
    State(state): State<AppState>,
    ApiQuery(filter): ApiQuery<CommentFilter>,
    ApiQuery(page): ApiQuery<PageRequest>,
) -> Json<Page<Comment>> {
    Json(state.catalog.list_comments(&filter, &page))
}

/// POST /api/v1/comments
#[instrument(skip_all)]
pub async fn create_comment(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<NewComment>,
) -> Result<(StatusCode, Json<Comment>), ApiError> {
    let comment = state.catalog.create_comment(payload)?;
    Ok((StatusCode::CREATED, Json(comment)))
}

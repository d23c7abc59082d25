//! 课程目录数据模型

use serde::{Deserialize, Serialize};
use serde_with::skip_serializing_none;

/// A course offered in the catalog.
#[skip_serializing_none]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Course {
    pub id: u64,
    pub code: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub price: i64,
    #[serde(default = "default_credits")]
    pub credits: u32,
    pub teacher_id: Option<u64>,
}

fn default_credits() -> u32 {
    3
}

/// A piece of learning material attached to a course.
#[skip_serializing_none]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CourseContent {
    pub id: u64,
    pub course_id: u64,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub video_url: Option<String>,
    pub file_attachment: Option<String>,
}

/// A member's comment on a course content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comment {
    pub id: u64,
    pub content_id: u64,
    pub member_id: u64,
    pub comment: String,
}

/// A user's enrolment in a course, as instructor or student.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CourseMember {
    pub id: u64,
    pub course_id: u64,
    pub user_id: u64,
    pub roles: String,
}

/// Payload for creating a comment; the id is assigned by the catalog.
#[derive(Debug, Clone, Deserialize)]
pub struct NewComment {
    pub content_id: u64,
    pub member_id: u64,
    pub comment: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CourseFilter {
    /// Case-insensitive match on name, description or code.
    pub search: Option<String>,
    pub min_price: Option<i64>,
    pub max_price: Option<i64>,
    pub teacher_id: Option<u64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ContentFilter {
    pub course_id: Option<u64>,
    /// Case-insensitive match on name or description.
    pub search: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CommentFilter {
    pub content_id: Option<u64>,
    pub member_id: Option<u64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct MemberFilter {
    /// Case-insensitive match on the member's roles.
    pub roles: Option<String>,
    pub user_id: Option<u64>,
}

/// Page-number pagination input. Pages start at 1.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct PageRequest {
    pub page: Option<usize>,
    pub page_size: Option<usize>,
}

impl PageRequest {
    pub const DEFAULT_PAGE_SIZE: usize = 10;
    pub const MAX_PAGE_SIZE: usize = 100;

    pub fn new(page: usize, page_size: usize) -> Self {
        Self {
            page: Some(page),
            page_size: Some(page_size),
        }
    }

    /// Zero-based offset and clamped page size.
    fn bounds(&self) -> (usize, usize) {
        let size = self
            .page_size
            .unwrap_or(Self::DEFAULT_PAGE_SIZE)
            .clamp(1, Self::MAX_PAGE_SIZE);
        let page = self.page.unwrap_or(1).max(1);
        ((page - 1).saturating_mul(size), size)
    }

    /// Slice `items` into the requested page; `count` is the unpaged total.
    pub fn apply<T>(&self, items: Vec<T>) -> Page<T> {
        let (offset, size) = self.bounds();
        let count = items.len();
        let items = items.into_iter().skip(offset).take(size).collect();
        Page { items, count }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub count: usize,
}

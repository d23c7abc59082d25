//! In-memory course catalog: courses, their members and contents, and member comments.

mod demo;
mod models;

pub use models::{
    Comment, CommentFilter, ContentFilter, Course, CourseContent, CourseFilter, CourseMember,
    MemberFilter, NewComment, Page, PageRequest,
};

use crate::error::{LmsError, Result};
use serde::Deserialize;
use std::path::Path;
use std::sync::RwLock;
use tracing::{info, instrument};

/// On-disk catalog layout.
#[derive(Debug, Default, Deserialize)]
struct CatalogFile {
    #[serde(default)]
    courses: Vec<Course>,
    #[serde(default)]
    members: Vec<CourseMember>,
    #[serde(default)]
    contents: Vec<CourseContent>,
    #[serde(default)]
    comments: Vec<Comment>,
}

/// Courses, members and contents are fixed after load; comments accept new entries.
#[derive(Debug)]
pub struct Catalog {
    courses: Vec<Course>,
    members: Vec<CourseMember>,
    contents: Vec<CourseContent>,
    comments: RwLock<Vec<Comment>>,
}

impl Catalog {
    /// Built-in demo data.
    pub fn demo() -> Self {
        Self {
            courses: demo::courses(),
            members: demo::members(),
            contents: demo::contents(),
            comments: RwLock::new(demo::comments()),
        }
    }

    /// Load a catalog from a JSON file with `courses`, `members`, `contents` and
    /// `comments` arrays.
    #[instrument]
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        let file: CatalogFile = serde_json::from_str(&raw)?;
        let catalog = Self::from_parts(file.courses, file.members, file.contents, file.comments)?;
        info!(
            courses = catalog.courses.len(),
            members = catalog.members.len(),
            contents = catalog.contents.len(),
            "catalog loaded"
        );
        Ok(catalog)
    }

    /// Assemble a catalog, checking ids are unique and references resolve.
    pub fn from_parts(
        mut courses: Vec<Course>,
        mut members: Vec<CourseMember>,
        mut contents: Vec<CourseContent>,
        mut comments: Vec<Comment>,
    ) -> Result<Self> {
        courses.sort_by_key(|c| c.id);
        members.sort_by_key(|m| m.id);
        contents.sort_by_key(|c| c.id);
        comments.sort_by_key(|c| c.id);

        ensure_unique("course", courses.iter().map(|c| c.id))?;
        ensure_unique("member", members.iter().map(|m| m.id))?;
        ensure_unique("content", contents.iter().map(|c| c.id))?;
        ensure_unique("comment", comments.iter().map(|c| c.id))?;

        for member in &members {
            if courses.binary_search_by_key(&member.course_id, |c| c.id).is_err() {
                return Err(LmsError::InvalidInput(format!(
                    "member {} references unknown course {}",
                    member.id, member.course_id
                )));
            }
        }
        for content in &contents {
            if courses.binary_search_by_key(&content.course_id, |c| c.id).is_err() {
                return Err(LmsError::InvalidInput(format!(
                    "content {} references unknown course {}",
                    content.id, content.course_id
                )));
            }
        }
        for comment in &comments {
            if contents.binary_search_by_key(&comment.content_id, |c| c.id).is_err() {
                return Err(LmsError::InvalidInput(format!(
                    "comment {} references unknown content {}",
                    comment.id, comment.content_id
                )));
            }
        }

        Ok(Self {
            courses,
            members,
            contents,
            comments: RwLock::new(comments),
        })
    }

    pub fn list_courses(&self, filter: &CourseFilter, page: &PageRequest) -> Page<Course> {
        let search = normalized(filter.search.as_deref());
        let matches = self
            .courses
            .iter()
            .filter(|c| {
                search.as_deref().map_or(true, |s| {
                    contains_ci(&c.name, s) || contains_ci(&c.description, s) || contains_ci(&c.code, s)
                })
            })
            .filter(|c| filter.min_price.map_or(true, |min| c.price >= min))
            .filter(|c| filter.max_price.map_or(true, |max| c.price <= max))
            .filter(|c| filter.teacher_id.map_or(true, |t| c.teacher_id == Some(t)))
            .cloned()
            .collect();
        page.apply(matches)
    }

    pub fn get_course(&self, id: u64) -> Result<Course> {
        self.courses
            .binary_search_by_key(&id, |c| c.id)
            .map(|idx| self.courses[idx].clone())
            .map_err(|_| LmsError::NotFound(format!("course {id}")))
    }

    pub fn list_members(&self, filter: &MemberFilter, page: &PageRequest) -> Page<CourseMember> {
        let roles = normalized(filter.roles.as_deref());
        let matches = self
            .members
            .iter()
            .filter(|m| roles.as_deref().map_or(true, |r| contains_ci(&m.roles, r)))
            .filter(|m| filter.user_id.map_or(true, |id| m.user_id == id))
            .cloned()
            .collect();
        page.apply(matches)
    }

    pub fn list_contents(&self, filter: &ContentFilter, page: &PageRequest) -> Page<CourseContent> {
        let search = normalized(filter.search.as_deref());
        let matches = self
            .contents
            .iter()
            .filter(|c| filter.course_id.map_or(true, |id| c.course_id == id))
            .filter(|c| {
                search
                    .as_deref()
                    .map_or(true, |s| contains_ci(&c.name, s) || contains_ci(&c.description, s))
            })
            .cloned()
            .collect();
        page.apply(matches)
    }

    pub fn list_comments(&self, filter: &CommentFilter, page: &PageRequest) -> Page<Comment> {
        let comments = self.comments.read().unwrap_or_else(|e| e.into_inner());
        let matches = comments
            .iter()
            .filter(|c| filter.content_id.map_or(true, |id| c.content_id == id))
            .filter(|c| filter.member_id.map_or(true, |id| c.member_id == id))
            .cloned()
            .collect();
        page.apply(matches)
    }

    /// Append a comment to an existing content.
    #[instrument(skip(self, new), fields(content_id = new.content_id, member_id = new.member_id))]
    pub fn create_comment(&self, new: NewComment) -> Result<Comment> {
        let text = new.comment.trim();
        if text.is_empty() {
            return Err(LmsError::InvalidInput("comment must not be empty".into()));
        }
        if self
            .contents
            .binary_search_by_key(&new.content_id, |c| c.id)
            .is_err()
        {
            return Err(LmsError::NotFound(format!("content {}", new.content_id)));
        }

        let mut comments = self.comments.write().unwrap_or_else(|e| e.into_inner());
        let id = match comments.last() {
            Some(last) => last
                .id
                .checked_add(1)
                .ok_or_else(|| LmsError::InvalidInput("comment ids exhausted".into()))?,
            None => 1,
        };
        let comment = Comment {
            id,
            content_id: new.content_id,
            member_id: new.member_id,
            comment: text.to_string(),
        };
        comments.push(comment.clone());
        info!(comment_id = id, "comment created");
        Ok(comment)
    }
}

fn ensure_unique(kind: &str, ids: impl Iterator<Item = u64>) -> Result<()> {
    let mut previous = None;
    for id in ids {
        if previous == Some(id) {
            return Err(LmsError::InvalidInput(format!("duplicate {kind} id {id}")));
        }
        previous = Some(id);
    }
    Ok(())
}

fn normalized(search: Option<&str>) -> Option<String> {
    search
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_lowercase)
}

/// `needle` must already be lowercase.
fn contains_ci(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(needle)
}

//! Core library for the LMS API: per-client request throttling and the in-memory course catalog.

pub mod catalog;
mod error;
pub mod throttle;

pub use catalog::{
    Catalog, Comment, CommentFilter, ContentFilter, Course, CourseContent, CourseFilter,
    CourseMember, MemberFilter, NewComment, Page, PageRequest,
};
pub use error::{LmsError, Result};
pub use throttle::{
    spawn_sweeper, ClientStats, Decision, Rejection, RequestThrottle, RuleStats, SweepReport,
    ThrottleRule,
};

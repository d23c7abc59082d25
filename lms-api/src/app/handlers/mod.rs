mod catalog;
mod health;
mod throttle;

pub use catalog::{
    create_comment, get_course, list_comments, list_contents, list_courses, list_members,
};
pub use health::{handler_404, health};
pub use throttle::throttle_status;

//! Demo catalog used when no catalog file is configured.

use super::models::{Comment, Course, CourseContent, CourseMember};

const COURSES: &[(&str, &str, &str, i64, u32, u64)] = &[
    (
        "CS101",
        "Pemrograman Web",
        "Mempelajari dasar-dasar pemrograman web menggunakan HTML, CSS, JavaScript, dan framework modern",
        250_000,
        3,
        2,
    ),
    (
        "CS201",
        "Basis Data",
        "Konsep database relational, SQL, normalisasi, dan manajemen database menggunakan PostgreSQL",
        200_000,
        3,
        2,
    ),
    (
        "CS301",
        "Algoritma dan Struktur Data",
        "Mempelajari algoritma fundamental, kompleksitas, sorting, searching, dan struktur data",
        300_000,
        4,
        3,
    ),
    (
        "CS401",
        "Pemrograman Mobile",
        "Pengembangan aplikasi mobile untuk Android dan iOS menggunakan React Native",
        350_000,
        3,
        3,
    ),
];

const CONTENTS: &[(u64, &str, &str)] = &[
    (1, "Pertemuan 1 - HTML & CSS Basics", "Pengenalan HTML tags, CSS selectors, box model, dan responsive design"),
    (1, "Pertemuan 2 - JavaScript Fundamentals", "Variables, data types, functions, dan DOM manipulation"),
    (2, "Pertemuan 1 - SQL Basics", "SELECT, INSERT, UPDATE, DELETE queries"),
    (2, "Pertemuan 2 - Database Design", "ER Diagram, normalisasi, dan relasi antar tabel"),
    (3, "Pertemuan 1 - Pengenalan Algoritma", "Konsep algoritma, kompleksitas waktu O(n)"),
    (3, "Pertemuan 2 - Sorting Algorithms", "Bubble sort, insertion sort, merge sort, quick sort"),
    (4, "Pertemuan 1 - React Native Setup", "Development environment, components, dan props"),
    (4, "Pertemuan 2 - State Management", "useState, useEffect, dan Context API"),
];

const COMMENTS: &[(u64, u64, &str)] = &[
    (1, 4, "Materinya jelas, terima kasih!"),
    (1, 5, "Apakah ada contoh flexbox?"),
    (3, 4, "Latihan JOIN-nya membantu sekali."),
    (5, 6, "Bisa dijelaskan lagi notasi Big-O?"),
];

/// `(course_id, user_id, roles)`: each course's instructor, then its students.
const MEMBERS: &[(u64, u64, &str)] = &[
    (1, 2, "instructor"),
    (1, 4, "student"),
    (1, 5, "student"),
    (2, 2, "instructor"),
    (2, 4, "student"),
    (3, 3, "instructor"),
    (3, 5, "student"),
    (3, 6, "student"),
    (4, 3, "instructor"),
    (4, 6, "student"),
];

pub(super) fn courses() -> Vec<Course> {
    COURSES
        .iter()
        .zip(1..)
        .map(
            |(&(code, name, description, price, credits, teacher_id), id)| Course {
                id,
                code: code.into(),
                name: name.into(),
                description: description.into(),
                price,
                credits,
                teacher_id: Some(teacher_id),
            },
        )
        .collect()
}

pub(super) fn contents() -> Vec<CourseContent> {
    CONTENTS
        .iter()
        .zip(1..)
        .map(|(&(course_id, name, description), id)| CourseContent {
            id,
            course_id,
            name: name.into(),
            description: description.into(),
            video_url: None,
            file_attachment: None,
        })
        .collect()
}

pub(super) fn comments() -> Vec<Comment> {
    COMMENTS
        .iter()
        .zip(1..)
        .map(|(&(content_id, member_id, comment), id)| Comment {
            id,
            content_id,
            member_id,
            comment: comment.into(),
        })
        .collect()
}

pub(super) fn members() -> Vec<CourseMember> {
    MEMBERS
        .iter()
        .zip(1..)
        .map(|(&(course_id, user_id, roles), id)| CourseMember {
            id,
            course_id,
            user_id,
            roles: roles.into(),
        })
        .collect()
}

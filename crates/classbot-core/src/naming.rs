use crate::error::{ClassbotError, Result};
use crate::types::ManagedClass;
use regex::Regex;
use std::cmp::Ordering;
use std::sync::OnceLock;

// ---------------------------------------------------------------------------
// Patterns
// ---------------------------------------------------------------------------

static CHANNEL_RE: OnceLock<Regex> = OnceLock::new();
static ROLE_RE: OnceLock<Regex> = OnceLock::new();
static DEPARTMENT_RE: OnceLock<Regex> = OnceLock::new();
static COURSE_ID_RE: OnceLock<Regex> = OnceLock::new();

fn channel_re() -> &'static Regex {
    CHANNEL_RE.get_or_init(|| Regex::new(r"^([a-z]+)-(\d+)$").unwrap())
}

fn role_re() -> &'static Regex {
    ROLE_RE.get_or_init(|| Regex::new(r"^([A-Z]+) (\d+)$").unwrap())
}

fn department_re() -> &'static Regex {
    DEPARTMENT_RE.get_or_init(|| Regex::new(r"^[a-zA-Z]+$").unwrap())
}

fn course_id_re() -> &'static Regex {
    COURSE_ID_RE.get_or_init(|| Regex::new(r"^\d+$").unwrap())
}

// ---------------------------------------------------------------------------
// Canonical names
// ---------------------------------------------------------------------------

/// `cs-101`
pub fn channel_name(class: &ManagedClass) -> String {
    format!(
        "{}-{}",
        class.department.to_lowercase(),
        class.course_id.to_lowercase()
    )
}

/// `CS 101`
pub fn role_name(class: &ManagedClass) -> String {
    format!(
        "{} {}",
        class.department.to_uppercase(),
        class.course_id.to_uppercase()
    )
}

/// How a class is shown to users in chat. Currently the role name.
pub fn display(class: &ManagedClass) -> String {
    role_name(class)
}

/// Code-block language used when listing classes; it highlights the
/// department and the course id differently.
pub const DISPLAY_LANGUAGE: &str = "haskell";

// ---------------------------------------------------------------------------
// Matching
// ---------------------------------------------------------------------------

pub fn is_class_channel(name: &str) -> bool {
    channel_re().is_match(name)
}

pub fn is_class_role(name: &str) -> bool {
    role_re().is_match(name)
}

/// Inverse of [`channel_name`]. The result keeps the channel's lowercase
/// spelling; the record's casing is lost in the channel name.
pub fn parse_channel_name(name: &str) -> Result<ManagedClass> {
    let caps = channel_re()
        .captures(name)
        .ok_or_else(|| ClassbotError::NotAClassChannel(name.to_string()))?;
    Ok(ManagedClass::from_parts(&caps[1], &caps[2]))
}

pub fn is_valid_department(department: &str) -> bool {
    department_re().is_match(department)
}

pub fn is_valid_course_id(course_id: &str) -> bool {
    course_id_re().is_match(course_id)
}

// ---------------------------------------------------------------------------
// Ordering
// ---------------------------------------------------------------------------

/// Locale-style string order: case-insensitive first, then lowercase before
/// uppercase at the first differing letter. Returns `Equal` only for
/// identical strings.
pub fn locale_cmp(a: &str, b: &str) -> Ordering {
    a.to_lowercase()
        .cmp(&b.to_lowercase())
        .then_with(|| {
            a.chars()
                .zip(b.chars())
                .map(|(x, y)| case_rank(x).cmp(&case_rank(y)))
                .find(|o| o.is_ne())
                .unwrap_or(Ordering::Equal)
        })
        .then_with(|| a.cmp(b))
}

fn case_rank(c: char) -> u8 {
    u8::from(c.is_uppercase())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

use crate::error::{ClassbotError, Result};
use crate::naming;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

// ---------------------------------------------------------------------------
// ManagedClass
// ---------------------------------------------------------------------------

/// A tracked (department, course id) pair with a canonical channel and role.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ManagedClass {
    pub department: String,
    pub course_id: String,
}

impl ManagedClass {
    /// Build a class from user input, rejecting anything that is not
    /// letters-then-digits.
    pub fn new(department: impl Into<String>, course_id: impl Into<String>) -> Result<Self> {
        let department = department.into();
        let course_id = course_id.into();
        if !naming::is_valid_department(&department) {
            return Err(ClassbotError::InvalidDepartment(department));
        }
        if !naming::is_valid_course_id(&course_id) {
            return Err(ClassbotError::InvalidCourseId(course_id));
        }
        Ok(Self {
            department,
            course_id,
        })
    }

    /// Build a class without validation. Used for records read back from the
    /// data file, which are trusted as stored.
    pub fn from_parts(department: impl Into<String>, course_id: impl Into<String>) -> Self {
        Self {
            department: department.into(),
            course_id: course_id.into(),
        }
    }

    pub fn channel_name(&self) -> String {
        naming::channel_name(self)
    }

    pub fn role_name(&self) -> String {
        naming::role_name(self)
    }
}

impl fmt::Display for ManagedClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&naming::display(self))
    }
}

/// Department first, then course id, both in locale order. Course ids compare
/// as strings, so "101" sorts before "9".
impl Ord for ManagedClass {
    fn cmp(&self, other: &Self) -> Ordering {
        naming::locale_cmp(&self.department, &other.department)
            .then_with(|| naming::locale_cmp(&self.course_id, &other.course_id))
    }
}

impl PartialOrd for ManagedClass {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

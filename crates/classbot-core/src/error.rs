use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClassbotError {
    #[error("invalid stored class data: {0}")]
    InvalidStore(String),

    #[error("bad department '{0}': only letters are allowed")]
    InvalidDepartment(String),

    #[error("bad course id '{0}': only numbers are allowed")]
    InvalidCourseId(String),

    #[error("channel name {0} does not look like a class")]
    NotAClassChannel(String),

    #[error("config not found: {0}")]
    ConfigNotFound(String),

    #[error("role not found: {0}")]
    RoleNotFound(String),

    #[error("platform call failed: {0}")]
    Platform(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl ClassbotError {
    /// Errors caused by bad input or missing entities. These are reported to
    /// the invoking user; everything else goes to the top-level handler.
    pub fn is_user_facing(&self) -> bool {
        matches!(
            self,
            ClassbotError::InvalidDepartment(_)
                | ClassbotError::InvalidCourseId(_)
                | ClassbotError::NotAClassChannel(_)
                | ClassbotError::RoleNotFound(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, ClassbotError>;

use crate::domain::model::EnrollmentStatus;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum EnrollError {
    #[error("API request failed: {0}")]
    ApiError(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    /// Carries the auth backend's message verbatim.
    #[error("{message}")]
    AuthError { message: String },

    #[error("Backend returned {status}: {message}")]
    BackendError { status: u16, message: String },

    #[error("Not signed in")]
    NotAuthenticated,

    #[error("Course not found: {course_id}")]
    CourseNotFound { course_id: String },

    #[error("Already {status} in course {course_id}")]
    AlreadyEnrolled {
        course_id: String,
        status: EnrollmentStatus,
    },

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Configuration validation failed for '{field}': {message}")]
    ConfigValidationError { field: String, message: String },

    #[error("Invalid value '{value}' for '{field}': {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Missing required configuration: {field}")]
    MissingConfigError { field: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Authentication,
    Network,
    Backend,
    Workflow,
    Configuration,
}

impl EnrollError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            EnrollError::AuthError { .. } | EnrollError::NotAuthenticated => {
                ErrorCategory::Authentication
            }
            EnrollError::ApiError(_) | EnrollError::IoError(_) => ErrorCategory::Network,
            EnrollError::BackendError { .. } | EnrollError::SerializationError(_) => {
                ErrorCategory::Backend
            }
            EnrollError::CourseNotFound { .. } | EnrollError::AlreadyEnrolled { .. } => {
                ErrorCategory::Workflow
            }
            EnrollError::ConfigError { .. }
            | EnrollError::ConfigValidationError { .. }
            | EnrollError::InvalidConfigValueError { .. }
            | EnrollError::MissingConfigError { .. } => ErrorCategory::Configuration,
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self {
            EnrollError::AuthError { message } => message.clone(),
            EnrollError::NotAuthenticated => "Sign in to enroll in courses".to_string(),
            EnrollError::CourseNotFound { course_id } => {
                format!("No course matches '{}'", course_id)
            }
            EnrollError::AlreadyEnrolled { status, .. } => {
                format!("You are already {} in this course", status)
            }
            EnrollError::ApiError(_) | EnrollError::IoError(_) => {
                "Could not reach the enrollment service".to_string()
            }
            EnrollError::BackendError { .. } | EnrollError::SerializationError(_) => {
                "The enrollment service rejected the request".to_string()
            }
            _ => format!("Invalid configuration: {}", self),
        }
    }
}

pub type Result<T> = std::result::Result<T, EnrollError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_auth_error_is_shown_verbatim() {
        let err = EnrollError::AuthError {
            message: "Invalid login credentials".to_string(),
        };
        assert_eq!(err.to_string(), "Invalid login credentials");
        assert_eq!(err.user_friendly_message(), "Invalid login credentials");
        assert_eq!(err.category(), ErrorCategory::Authentication);
    }

    #[test]
    fn test_categories() {
        let missing = EnrollError::MissingConfigError {
            field: "backend.url".to_string(),
        };
        assert_eq!(missing.category(), ErrorCategory::Configuration);

        let already = EnrollError::AlreadyEnrolled {
            course_id: "c1".to_string(),
            status: EnrollmentStatus::Waitlisted,
        };
        assert_eq!(already.category(), ErrorCategory::Workflow);
        assert_eq!(already.to_string(), "Already waitlisted in course c1");
    }
}

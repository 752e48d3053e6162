pub mod engine;
pub mod enrollment;
pub mod search;
pub mod state;
pub mod views;

pub use crate::domain::model::{Course, Enrollment, EnrollmentStatus, NewEnrollment, Session};
pub use crate::domain::ports::{AuthService, ConfigProvider, CourseRepository};
pub use crate::utils::error::Result;

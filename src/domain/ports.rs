use crate::domain::events::SessionSubscription;
use crate::domain::model::{Course, Enrollment, NewEnrollment, Session};
use crate::utils::error::Result;
use async_trait::async_trait;

pub trait ConfigProvider: Send + Sync {
    fn backend_url(&self) -> &str;
    fn anon_key(&self) -> &str;
}

#[async_trait]
pub trait AuthService: Send + Sync {
    /// `Ok(None)` when the account was created but needs e-mail confirmation.
    async fn sign_up(&self, email: &str, password: &str) -> Result<Option<Session>>;
    async fn sign_in(&self, email: &str, password: &str) -> Result<Session>;
    async fn sign_out(&self) -> Result<()>;
    async fn get_session(&self) -> Result<Option<Session>>;
    async fn refresh_session(&self) -> Result<Session>;
    fn subscribe(&self) -> SessionSubscription;
}

#[async_trait]
pub trait CourseRepository: Send + Sync {
    /// All courses, newest first.
    async fn fetch_courses(&self) -> Result<Vec<Course>>;
    /// The student's enrollments, each with its course embedded.
    async fn fetch_enrollments(&self, student_id: &str) -> Result<Vec<Enrollment>>;
    async fn insert_enrollment(&self, enrollment: &NewEnrollment) -> Result<()>;
    async fn update_available_seats(&self, course_id: &str, available_seats: i32) -> Result<()>;
}

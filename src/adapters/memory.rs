use crate::domain::events::{AuthEvent, SessionNotifier, SessionSubscription};
use crate::domain::model::{Course, Enrollment, NewEnrollment, Session};
use crate::domain::ports::{AuthService, CourseRepository};
use crate::utils::error::{EnrollError, Result};
use async_trait::async_trait;
use chrono::Utc;
use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tokio::sync::Mutex;

const MIN_PASSWORD_LENGTH: usize = 6;

/// Calls that can be made to fail, for exercising error paths.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Failure {
    FetchCourses,
    FetchEnrollments,
    InsertEnrollment,
    UpdateSeats,
    SignOut,
}

#[derive(Debug, Clone)]
struct Account {
    user_id: String,
    password: String,
}

#[derive(Debug, Default)]
struct MemoryInner {
    accounts: HashMap<String, Account>,
    courses: Vec<Course>,
    enrollments: Vec<Enrollment>,
    session: Option<Session>,
    failures: HashSet<Failure>,
    require_confirmation: bool,
    next_id: u64,
}

impl MemoryInner {
    fn next_id(&mut self, prefix: &str) -> String {
        self.next_id += 1;
        format!("{}-{}", prefix, self.next_id)
    }

    fn fail_if(&self, failure: Failure) -> Result<()> {
        if self.failures.contains(&failure) {
            return Err(EnrollError::BackendError {
                status: 503,
                message: format!("injected failure: {:?}", failure),
            });
        }
        Ok(())
    }
}

/// In-process auth and data backend with the same observable behaviour as the
/// hosted one: no seat bookkeeping of its own, no transactions.
#[derive(Debug, Clone, Default)]
pub struct InMemoryBackend {
    inner: Arc<Mutex<MemoryInner>>,
    notifier: SessionNotifier,
}

impl InMemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_courses(courses: Vec<Course>) -> Self {
        Self {
            inner: Arc::new(Mutex::new(MemoryInner {
                courses,
                ..MemoryInner::default()
            })),
            notifier: SessionNotifier::new(),
        }
    }

    pub async fn add_account(&self, email: &str, password: &str) -> String {
        let mut inner = self.inner.lock().await;
        let user_id = inner.next_id("user");
        inner.accounts.insert(
            email.to_string(),
            Account {
                user_id: user_id.clone(),
                password: password.to_string(),
            },
        );
        user_id
    }

    pub async fn set_failure(&self, failure: Failure, enabled: bool) {
        let mut inner = self.inner.lock().await;
        if enabled {
            inner.failures.insert(failure);
        } else {
            inner.failures.remove(&failure);
        }
    }

    pub async fn require_confirmation(&self, required: bool) {
        self.inner.lock().await.require_confirmation = required;
    }

    pub async fn courses(&self) -> Vec<Course> {
        self.inner.lock().await.courses.clone()
    }

    pub async fn enrollments(&self) -> Vec<Enrollment> {
        self.inner.lock().await.enrollments.clone()
    }

    /// Ends the session from outside the client, like an admin revoking it.
    pub async fn revoke_session(&self) {
        self.inner.lock().await.session = None;
        self.notifier.publish(AuthEvent::signed_out());
    }
}

fn newest_first(a: &Course, b: &Course) -> Ordering {
    // Descending order puts rows without a timestamp first.
    match (&a.created_at, &b.created_at) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Less,
        (Some(_), None) => Ordering::Greater,
        (Some(x), Some(y)) => y.cmp(x),
    }
}

fn is_valid_email(email: &str) -> bool {
    match email.split_once('@') {
        Some((local, domain)) => !local.is_empty() && domain.contains('.') && !domain.starts_with('.'),
        None => false,
    }
}

#[async_trait]
impl AuthService for InMemoryBackend {
    async fn sign_up(&self, email: &str, password: &str) -> Result<Option<Session>> {
        let mut inner = self.inner.lock().await;
        if !is_valid_email(email) {
            return Err(EnrollError::AuthError {
                message: "Unable to validate email address: invalid format".to_string(),
            });
        }
        if password.len() < MIN_PASSWORD_LENGTH {
            return Err(EnrollError::AuthError {
                message: format!("Password should be at least {} characters.", MIN_PASSWORD_LENGTH),
            });
        }
        if inner.accounts.contains_key(email) {
            return Err(EnrollError::AuthError {
                message: "User already registered".to_string(),
            });
        }

        let user_id = inner.next_id("user");
        inner.accounts.insert(
            email.to_string(),
            Account {
                user_id: user_id.clone(),
                password: password.to_string(),
            },
        );
        if inner.require_confirmation {
            return Ok(None);
        }

        let session = Session::new(user_id, email);
        inner.session = Some(session.clone());
        drop(inner);
        self.notifier.publish(AuthEvent::signed_in(session.clone()));
        Ok(Some(session))
    }

    async fn sign_in(&self, email: &str, password: &str) -> Result<Session> {
        let mut inner = self.inner.lock().await;
        let account = inner
            .accounts
            .get(email)
            .filter(|account| account.password == password)
            .cloned()
            .ok_or_else(|| EnrollError::AuthError {
                message: "Invalid login credentials".to_string(),
            })?;

        let session = Session::new(account.user_id, email);
        inner.session = Some(session.clone());
        drop(inner);
        self.notifier.publish(AuthEvent::signed_in(session.clone()));
        Ok(session)
    }

    async fn sign_out(&self) -> Result<()> {
        let mut inner = self.inner.lock().await;
        inner.fail_if(Failure::SignOut)?;
        inner.session = None;
        drop(inner);
        self.notifier.publish(AuthEvent::signed_out());
        Ok(())
    }

    async fn get_session(&self) -> Result<Option<Session>> {
        Ok(self.inner.lock().await.session.clone())
    }

    async fn refresh_session(&self) -> Result<Session> {
        let session = self
            .inner
            .lock()
            .await
            .session
            .clone()
            .ok_or_else(|| EnrollError::AuthError {
                message: "Auth session missing!".to_string(),
            })?;
        self.notifier.publish(AuthEvent::token_refreshed(session.clone()));
        Ok(session)
    }

    fn subscribe(&self) -> SessionSubscription {
        self.notifier.subscribe()
    }
}

#[async_trait]
impl CourseRepository for InMemoryBackend {
    async fn fetch_courses(&self) -> Result<Vec<Course>> {
        let inner = self.inner.lock().await;
        inner.fail_if(Failure::FetchCourses)?;
        let mut courses = inner.courses.clone();
        courses.sort_by(newest_first);
        Ok(courses)
    }

    async fn fetch_enrollments(&self, student_id: &str) -> Result<Vec<Enrollment>> {
        let inner = self.inner.lock().await;
        inner.fail_if(Failure::FetchEnrollments)?;
        let enrollments = inner
            .enrollments
            .iter()
            .filter(|e| e.student_id == student_id)
            .map(|e| Enrollment {
                course: inner.courses.iter().find(|c| c.id == e.course_id).cloned(),
                ..e.clone()
            })
            .collect();
        Ok(enrollments)
    }

    async fn insert_enrollment(&self, enrollment: &NewEnrollment) -> Result<()> {
        let mut inner = self.inner.lock().await;
        inner.fail_if(Failure::InsertEnrollment)?;
        if !inner.courses.iter().any(|c| c.id == enrollment.course_id) {
            return Err(EnrollError::BackendError {
                status: 409,
                message: "insert or update on table \"enrollments\" violates foreign key constraint"
                    .to_string(),
            });
        }

        let id = inner.next_id("enrollment");
        inner.enrollments.push(Enrollment {
            id,
            student_id: enrollment.student_id.clone(),
            course_id: enrollment.course_id.clone(),
            status: enrollment.status,
            created_at: Some(Utc::now()),
            grade: None,
            course: None,
        });
        Ok(())
    }

    async fn update_available_seats(&self, course_id: &str, available_seats: i32) -> Result<()> {
        let mut inner = self.inner.lock().await;
        inner.fail_if(Failure::UpdateSeats)?;
        // Filtering on an unknown id updates zero rows, which is not an error.
        if let Some(course) = inner.courses.iter_mut().find(|c| c.id == course_id) {
            course.available_seats = available_seats;
        }
        Ok(())
    }
}

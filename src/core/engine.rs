use crate::core::enrollment::EnrollmentPlan;
use crate::core::state::{ActionState, AppState, Tab};
use crate::domain::events::{AuthEvent, SessionSubscription, SubscriptionPoll};
use crate::domain::model::{EnrollmentStatus, Session};
use crate::domain::ports::{AuthService, CourseRepository};
use crate::utils::error::{EnrollError, Result};

/// Owns the application state and runs every user action against the backends.
///
/// Actions take `&mut self` and run to completion, so the caches are only ever
/// touched by one action at a time.
pub struct EnrollEngine<A: AuthService, R: CourseRepository> {
    auth: A,
    repository: R,
    state: AppState,
    subscription: Option<SessionSubscription>,
}

impl<A: AuthService, R: CourseRepository> EnrollEngine<A, R> {
    pub fn new(auth: A, repository: R) -> Self {
        Self {
            auth,
            repository,
            state: AppState::new(),
            subscription: None,
        }
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    pub fn is_subscribed(&self) -> bool {
        self.subscription.is_some()
    }

    /// Subscribes to session changes, resolves the current session and loads
    /// the catalogue.
    pub async fn start(&mut self) {
        tracing::info!("🚀 Starting enrollment client");
        if self.subscription.is_none() {
            self.subscription = Some(self.auth.subscribe());
        }

        match self.auth.get_session().await {
            Ok(session) => self.apply_session(session).await,
            Err(e) => tracing::error!(
                "❌ Error resolving session: {} (Category: {:?})",
                e,
                e.category()
            ),
        }
        self.state.loading = false;

        self.refresh_courses().await;
    }

    /// Drops the session subscription.
    pub fn shutdown(&mut self) {
        if let Some(subscription) = self.subscription.take() {
            subscription.unsubscribe();
            tracing::info!("👋 Session subscription closed");
        }
    }

    pub fn set_search_query(&mut self, query: impl Into<String>) {
        self.state.search_query = query.into();
    }

    /// Returns false when the tab is not available to the current visitor.
    pub fn set_active_tab(&mut self, tab: Tab) -> bool {
        if tab == Tab::MyCourses && !self.state.is_signed_in() {
            return false;
        }
        self.state.active_tab = tab;
        true
    }

    pub fn open_auth_prompt(&mut self) {
        self.state.auth_prompt_open = true;
    }

    pub fn close_auth_prompt(&mut self) {
        self.state.auth_prompt_open = false;
    }

    pub async fn sign_up(&mut self, email: &str, password: &str) -> Result<()> {
        self.state.auth_error = None;
        match self.auth.sign_up(email, password).await {
            Ok(session) => {
                if session.is_none() {
                    tracing::info!("📧 Account created for {}, awaiting confirmation", email);
                }
                self.state.auth_prompt_open = false;
                if let Some(session) = session {
                    self.apply_session(Some(session)).await;
                }
                Ok(())
            }
            Err(e) => Err(self.record_auth_error(e)),
        }
    }

    pub async fn sign_in(&mut self, email: &str, password: &str) -> Result<()> {
        self.state.auth_error = None;
        match self.auth.sign_in(email, password).await {
            Ok(session) => {
                self.state.auth_prompt_open = false;
                self.apply_session(Some(session)).await;
                Ok(())
            }
            Err(e) => Err(self.record_auth_error(e)),
        }
    }

    fn record_auth_error(&mut self, error: EnrollError) -> EnrollError {
        tracing::warn!(
            "🔒 Authentication failed: {} (Category: {:?})",
            error,
            error.category()
        );
        self.state.auth_error = Some(error.user_friendly_message());
        error
    }

    /// Always ends with an anonymous state, even when the backend call fails.
    pub async fn sign_out(&mut self) {
        if let Err(e) = self.auth.sign_out().await {
            tracing::warn!("⚠️ Sign-out request failed, clearing local session anyway: {}", e);
        }
        self.apply_session(None).await;
        self.state.active_tab = Tab::Courses;
    }

    pub async fn refresh_token(&mut self) -> Result<()> {
        let session = self.auth.refresh_session().await?;
        self.apply_session(Some(session)).await;
        Ok(())
    }

    /// Fetch failures are logged and leave the previous list in place.
    pub async fn refresh_courses(&mut self) {
        match self.repository.fetch_courses().await {
            Ok(courses) => {
                tracing::debug!("📚 Loaded {} courses", courses.len());
                self.state.courses = courses;
            }
            Err(e) => tracing::error!(
                "❌ Error fetching courses: {} (Category: {:?})",
                e,
                e.category()
            ),
        }
    }

    pub async fn refresh_enrollments(&mut self) {
        let Some(student_id) = self.state.session.as_ref().map(|s| s.user_id.clone()) else {
            return;
        };
        match self.repository.fetch_enrollments(&student_id).await {
            Ok(enrollments) => {
                tracing::debug!("📋 Loaded {} enrollments", enrollments.len());
                self.state.enrollments = enrollments;
            }
            Err(e) => tracing::error!(
                "❌ Error fetching enrollments: {} (Category: {:?})",
                e,
                e.category()
            ),
        }
    }

    /// Enrolls the signed-in student, or waitlists them when the cached course
    /// has no seats left.
    ///
    /// The seat update is a separate call made after the insert. It is neither
    /// retried nor rolled back: if it fails the enrollment stands and the seat
    /// count goes stale. See [`EnrollmentPlan`].
    pub async fn enroll(&mut self, course_id: &str) -> Result<EnrollmentStatus> {
        let session = self.state.session.clone().ok_or(EnrollError::NotAuthenticated)?;
        if let Some(existing) = self.state.find_enrollment(course_id) {
            return Err(EnrollError::AlreadyEnrolled {
                course_id: course_id.to_string(),
                status: existing.status,
            });
        }

        let Some(course) = self.state.find_course(course_id).cloned() else {
            return Err(EnrollError::CourseNotFound {
                course_id: course_id.to_string(),
            });
        };

        self.state.set_action_state(course_id, ActionState::Pending);

        let plan = EnrollmentPlan::for_course(&session, &course);
        tracing::info!(
            "📝 {} requesting {} in {} ({} seats cached)",
            session.email,
            plan.status(),
            course.code,
            course.available_seats
        );

        if let Err(e) = self.repository.insert_enrollment(&plan.row).await {
            tracing::error!(
                "❌ Error enrolling in {}: {} (Category: {:?})",
                course.code,
                e,
                e.category()
            );
            self.state.set_action_state(course_id, ActionState::Error);
            return Err(e);
        }

        if let Some(seats) = plan.seats_after {
            if let Err(e) = self.repository.update_available_seats(course_id, seats).await {
                tracing::warn!(
                    "⚠️ Enrollment in {} recorded but seat count not updated: {}",
                    course.code,
                    e
                );
            }
        }

        self.refresh_enrollments().await;
        self.refresh_courses().await;
        self.state.set_action_state(course_id, ActionState::Success);

        tracing::info!("✅ {} in {}", plan.status(), course.code);
        Ok(plan.status())
    }

    /// Applies every session change queued since the last call. Returns how many
    /// notifications were handled.
    pub async fn process_session_changes(&mut self) -> usize {
        let mut handled = 0;
        loop {
            let poll = match self.subscription.as_mut() {
                Some(subscription) => subscription.poll(),
                None => return handled,
            };
            match poll {
                SubscriptionPoll::Event(event) => {
                    self.apply_event(event).await;
                    handled += 1;
                }
                SubscriptionPoll::Missed(count) => {
                    tracing::warn!("⚠️ Missed {} session notifications, resynchronizing", count);
                    handled += 1 + self.discard_queued_changes();
                    match self.auth.get_session().await {
                        Ok(session) => self.apply_session(session).await,
                        Err(e) => tracing::error!(
                        "❌ Error resolving session: {} (Category: {:?})",
                        e,
                        e.category()
                    ),
                    }
                }
                SubscriptionPoll::Empty => return handled,
                SubscriptionPoll::Closed => {
                    tracing::warn!("⚠️ Session notifications closed by the auth service");
                    self.subscription = None;
                    return handled;
                }
            }
        }
    }

    /// Drops the notifications still queued after a lag; the session read that
    /// follows supersedes them.
    fn discard_queued_changes(&mut self) -> usize {
        let mut discarded = 0;
        while let Some(subscription) = self.subscription.as_mut() {
            match subscription.poll() {
                SubscriptionPoll::Event(_) | SubscriptionPoll::Missed(_) => discarded += 1,
                SubscriptionPoll::Empty | SubscriptionPoll::Closed => break,
            }
        }
        discarded
    }

    async fn apply_event(&mut self, event: AuthEvent) {
        tracing::debug!("🔔 Session change: {:?}", event.change);
        self.apply_session(event.session).await;
    }

    async fn apply_session(&mut self, session: Option<Session>) {
        match session {
            None => {
                if self.state.is_signed_in() {
                    tracing::info!("👋 Signed out");
                }
                self.state.clear_user_data();
            }
            Some(session) => {
                let user_changed = self
                    .state
                    .session
                    .as_ref()
                    .map(|current| current.user_id != session.user_id)
                    .unwrap_or(true);
                if user_changed {
                    tracing::info!("🔑 Signed in as {}", session.email);
                    self.state.enrollments.clear();
                    self.state.enrollment_status.clear();
                }
                self.state.session = Some(session);
                if user_changed {
                    self.refresh_enrollments().await;
                }
            }
        }
    }
}

impl<A: AuthService, R: CourseRepository> Drop for EnrollEngine<A, R> {
    fn drop(&mut self) {
        self.shutdown();
    }
}

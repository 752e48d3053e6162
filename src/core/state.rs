use crate::domain::model::{Course, Enrollment, Session};
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Tab {
    #[default]
    Courses,
    MyCourses,
}

/// Progress of the enroll action for one course.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionState {
    Pending,
    Success,
    Error,
}

/// Everything the views are derived from. Owned by the engine and handed to
/// view and render functions by reference.
#[derive(Debug, Clone, PartialEq)]
pub struct AppState {
    pub session: Option<Session>,
    pub loading: bool,
    pub courses: Vec<Course>,
    pub enrollments: Vec<Enrollment>,
    pub search_query: String,
    pub active_tab: Tab,
    pub enrollment_status: HashMap<String, ActionState>,
    pub auth_error: Option<String>,
    pub auth_prompt_open: bool,
}

impl Default for AppState {
    fn default() -> Self {
        Self {
            session: None,
            loading: true,
            courses: Vec::new(),
            enrollments: Vec::new(),
            search_query: String::new(),
            active_tab: Tab::Courses,
            enrollment_status: HashMap::new(),
            auth_error: None,
            auth_prompt_open: false,
        }
    }
}

impl AppState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_signed_in(&self) -> bool {
        self.session.is_some()
    }

    pub fn find_course(&self, course_id: &str) -> Option<&Course> {
        self.courses.iter().find(|c| c.id == course_id)
    }

    pub fn find_enrollment(&self, course_id: &str) -> Option<&Enrollment> {
        self.enrollments.iter().find(|e| e.course_id == course_id)
    }

    pub fn action_state(&self, course_id: &str) -> Option<ActionState> {
        self.enrollment_status.get(course_id).copied()
    }

    pub fn set_action_state(&mut self, course_id: &str, state: ActionState) {
        self.enrollment_status.insert(course_id.to_string(), state);
    }

    /// Drops everything that belongs to the signed-in user.
    pub fn clear_user_data(&mut self) {
        self.session = None;
        self.enrollments.clear();
        self.enrollment_status.clear();
        self.active_tab = Tab::Courses;
    }
}

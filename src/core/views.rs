use crate::core::search::filter_courses;
use crate::core::state::{ActionState, AppState};
use crate::domain::model::{Course, Enrollment, EnrollmentStatus};

/// What the Courses tab offers for a single course.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CourseAction {
    /// Anonymous visitors get no control at all.
    Hidden,
    Status(EnrollmentStatus),
    Enrolling,
    Enroll,
    JoinWaitlist,
}

impl CourseAction {
    pub fn label(&self) -> Option<&'static str> {
        match self {
            CourseAction::Hidden => None,
            CourseAction::Status(status) => Some(status.label()),
            CourseAction::Enrolling => Some("Enrolling..."),
            CourseAction::Enroll => Some("Enroll Now"),
            CourseAction::JoinWaitlist => Some("Join Waitlist"),
        }
    }

    pub fn is_actionable(&self) -> bool {
        matches!(self, CourseAction::Enroll | CourseAction::JoinWaitlist)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CourseCard<'a> {
    pub course: &'a Course,
    pub action: CourseAction,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EnrolledCourse<'a> {
    pub enrollment: &'a Enrollment,
    pub course: &'a Course,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct MyCourses<'a> {
    pub enrolled: Vec<EnrolledCourse<'a>>,
    pub waitlisted: Vec<EnrolledCourse<'a>>,
}

pub fn course_action(state: &AppState, course: &Course) -> CourseAction {
    if !state.is_signed_in() {
        return CourseAction::Hidden;
    }
    if let Some(enrollment) = state.find_enrollment(&course.id) {
        return CourseAction::Status(enrollment.status);
    }
    if state.action_state(&course.id) == Some(ActionState::Pending) {
        return CourseAction::Enrolling;
    }
    if course.has_open_seats() {
        CourseAction::Enroll
    } else {
        CourseAction::JoinWaitlist
    }
}

/// The Courses tab: search applied, one card per matching course.
pub fn course_cards(state: &AppState) -> Vec<CourseCard<'_>> {
    filter_courses(&state.courses, &state.search_query)
        .into_iter()
        .map(|course| CourseCard {
            course,
            action: course_action(state, course),
        })
        .collect()
}

fn joined<'a>(state: &'a AppState, status: EnrollmentStatus) -> Vec<EnrolledCourse<'a>> {
    state
        .enrollments
        .iter()
        .filter(|e| e.status == status)
        .filter_map(|enrollment| {
            // Courses missing from the cache are dropped from the view.
            state
                .find_course(&enrollment.course_id)
                .map(|course| EnrolledCourse { enrollment, course })
        })
        .collect()
}

/// The My Courses tab. Empty for anonymous visitors.
pub fn my_courses(state: &AppState) -> MyCourses<'_> {
    if !state.is_signed_in() {
        return MyCourses::default();
    }
    MyCourses {
        enrolled: joined(state, EnrollmentStatus::Enrolled),
        waitlisted: joined(state, EnrollmentStatus::Waitlisted),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::Session;

    fn course(id: &str, seats: i32) -> Course {
        Course {
            id: id.to_string(),
            code: id.to_uppercase(),
            name: format!("Course {}", id),
            description: None,
            max_seats: 10,
            available_seats: seats,
            created_at: None,
            instructor: None,
            credits: Some(3),
            department: None,
        }
    }

    fn enrollment(course_id: &str, status: EnrollmentStatus) -> Enrollment {
        Enrollment {
            id: format!("e-{}", course_id),
            student_id: "u1".to_string(),
            course_id: course_id.to_string(),
            status,
            created_at: None,
            grade: None,
            course: None,
        }
    }

    fn signed_in_state() -> AppState {
        AppState {
            session: Some(Session::new("u1", "x@example.com")),
            loading: false,
            courses: vec![course("a", 0), course("b", 1), course("c", 5)],
            ..AppState::default()
        }
    }

    #[test]
    fn test_anonymous_sees_no_actions() {
        let mut state = signed_in_state();
        state.session = None;
        let cards = course_cards(&state);
        assert_eq!(cards.len(), 3);
        assert!(cards.iter().all(|c| c.action == CourseAction::Hidden));
    }

    #[test]
    fn test_actions_follow_seats_and_enrollments() {
        let mut state = signed_in_state();
        state.enrollments = vec![enrollment("c", EnrollmentStatus::Waitlisted)];

        let actions: Vec<CourseAction> = course_cards(&state).iter().map(|c| c.action).collect();
        assert_eq!(
            actions,
            vec![
                CourseAction::JoinWaitlist,
                CourseAction::Enroll,
                CourseAction::Status(EnrollmentStatus::Waitlisted),
            ]
        );
    }

    #[test]
    fn test_existing_enrollment_wins_over_pending() {
        let mut state = signed_in_state();
        state.set_action_state("b", ActionState::Pending);
        assert_eq!(course_action(&state, &state.courses[1]), CourseAction::Enrolling);

        state.enrollments = vec![enrollment("b", EnrollmentStatus::Enrolled)];
        let action = course_action(&state, &state.courses[1]);
        assert_eq!(action, CourseAction::Status(EnrollmentStatus::Enrolled));
        assert_eq!(action.label(), Some("Enrolled"));
        assert!(!action.is_actionable());
    }

    #[test]
    fn test_error_state_offers_the_action_again() {
        let mut state = signed_in_state();
        state.set_action_state("a", ActionState::Error);
        assert_eq!(course_action(&state, &state.courses[0]), CourseAction::JoinWaitlist);
    }

    #[test]
    fn test_search_applies_to_cards() {
        let mut state = signed_in_state();
        state.search_query = "course B".to_string();
        let cards = course_cards(&state);
        assert_eq!(cards.len(), 1);
        assert_eq!(cards[0].course.id, "b");
    }

    #[test]
    fn test_my_courses_splits_by_status_and_skips_unknown_courses() {
        let mut state = signed_in_state();
        state.enrollments = vec![
            enrollment("a", EnrollmentStatus::Waitlisted),
            enrollment("b", EnrollmentStatus::Enrolled),
            enrollment("gone", EnrollmentStatus::Enrolled),
        ];

        let view = my_courses(&state);
        assert_eq!(view.enrolled.len(), 1);
        assert_eq!(view.enrolled[0].course.id, "b");
        assert_eq!(view.waitlisted.len(), 1);
        assert_eq!(view.waitlisted[0].course.id, "a");
    }

    #[test]
    fn test_my_courses_empty_when_anonymous() {
        let mut state = signed_in_state();
        state.enrollments = vec![enrollment("b", EnrollmentStatus::Enrolled)];
        state.session = None;
        assert_eq!(my_courses(&state), MyCourses::default());
    }
}

use crate::domain::model::{Course, EnrollmentStatus, NewEnrollment, Session};

/// Status chosen from the client's cached seat count.
pub fn decide_status(course: &Course) -> EnrollmentStatus {
    if course.has_open_seats() {
        EnrollmentStatus::Enrolled
    } else {
        EnrollmentStatus::Waitlisted
    }
}

/// The writes one enroll action performs.
///
/// The insert and the seat update are two independent calls with no transaction,
/// and `seats_after` is computed from the cached count. Two students taking the
/// last seat at the same time can both be enrolled; a failed seat update leaves
/// the enrollment in place with a stale count.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnrollmentPlan {
    pub row: NewEnrollment,
    /// `Some(n)` when the course's `available_seats` must be set to `n`.
    pub seats_after: Option<i32>,
}

impl EnrollmentPlan {
    pub fn for_course(session: &Session, course: &Course) -> Self {
        let status = decide_status(course);
        let seats_after = match status {
            EnrollmentStatus::Enrolled => Some(course.available_seats - 1),
            EnrollmentStatus::Waitlisted => None,
        };
        Self {
            row: NewEnrollment {
                student_id: session.user_id.clone(),
                course_id: course.id.clone(),
                status,
            },
            seats_after,
        }
    }

    pub fn status(&self) -> EnrollmentStatus {
        self.row.status
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn course(seats: i32) -> Course {
        Course {
            id: "c1".to_string(),
            code: "CS101".to_string(),
            name: "Intro".to_string(),
            description: None,
            max_seats: 2,
            available_seats: seats,
            created_at: None,
            instructor: None,
            credits: None,
            department: None,
        }
    }

    #[test]
    fn test_last_seat_enrolls_and_decrements() {
        let plan = EnrollmentPlan::for_course(&Session::new("u1", "x@example.com"), &course(1));
        assert_eq!(plan.status(), EnrollmentStatus::Enrolled);
        assert_eq!(plan.seats_after, Some(0));
        assert_eq!(plan.row.student_id, "u1");
        assert_eq!(plan.row.course_id, "c1");
    }

    #[test]
    fn test_full_course_waitlists_without_seat_update() {
        let plan = EnrollmentPlan::for_course(&Session::new("u1", "x@example.com"), &course(0));
        assert_eq!(plan.status(), EnrollmentStatus::Waitlisted);
        assert_eq!(plan.seats_after, None);
    }

    #[test]
    fn test_negative_cached_count_waitlists() {
        assert_eq!(decide_status(&course(-1)), EnrollmentStatus::Waitlisted);
    }
}

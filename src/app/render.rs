use crate::core::state::{AppState, Tab};
use crate::core::views::{course_cards, my_courses, CourseCard, EnrolledCourse};
use std::fmt::{self, Write};

pub const TITLE: &str = "Course Enrollment";

/// Renders the whole view for the current state.
pub fn render(state: &AppState) -> String {
    let mut out = String::new();
    // Writing into a String cannot fail.
    let _ = write_view(&mut out, state);
    out
}

pub fn write_view<W: Write>(out: &mut W, state: &AppState) -> fmt::Result {
    if state.loading {
        return writeln!(out, "Loading...");
    }

    write_header(out, state)?;
    if state.auth_prompt_open && !state.is_signed_in() {
        write_auth_prompt(out, state)?;
    }

    match state.active_tab {
        Tab::Courses => write_courses(out, state),
        Tab::MyCourses => write_my_courses(out, state),
    }
}

fn write_header<W: Write>(out: &mut W, state: &AppState) -> fmt::Result {
    writeln!(out, "=== {} ===", TITLE)?;
    match &state.session {
        Some(session) => {
            let (courses, mine) = match state.active_tab {
                Tab::Courses => ("[Courses]", "My Courses"),
                Tab::MyCourses => ("Courses", "[My Courses]"),
            };
            writeln!(out, "{} | {}    {} (signout)", courses, mine, session.email)?;
        }
        None => writeln!(out, "Sign In / Sign Up (login)")?,
    }
    if !state.search_query.is_empty() {
        writeln!(out, "Search: {}", state.search_query)?;
    }
    writeln!(out)
}

fn write_auth_prompt<W: Write>(out: &mut W, state: &AppState) -> fmt::Result {
    writeln!(out, "--- Sign In / Sign Up ---")?;
    if let Some(error) = &state.auth_error {
        writeln!(out, "Error: {}", error)?;
    }
    writeln!(out, "signin EMAIL PASSWORD | signup EMAIL PASSWORD | cancel")?;
    writeln!(out)
}

fn write_courses<W: Write>(out: &mut W, state: &AppState) -> fmt::Result {
    let cards = course_cards(state);
    if cards.is_empty() {
        return writeln!(out, "No courses found.");
    }
    for card in &cards {
        write_course_card(out, card)?;
    }
    Ok(())
}

fn write_course_card<W: Write>(out: &mut W, card: &CourseCard<'_>) -> fmt::Result {
    let course = card.course;
    writeln!(out, "{}  {}", course.code, course.name)?;
    if let Some(description) = &course.description {
        writeln!(out, "  {}", description)?;
    }
    writeln!(out, "  {} seats available", course.available_seats)?;
    if let Some(instructor) = &course.instructor {
        writeln!(out, "  Instructor: {}", instructor)?;
    }
    if let Some(credits) = course.credits {
        writeln!(out, "  Credits: {}", credits)?;
    }
    // Brackets mark a command the student can run; parentheses a disabled one.
    if let Some(label) = card.action.label() {
        if card.action.is_actionable() {
            writeln!(out, "  [{}]", label)?;
        } else {
            writeln!(out, "  ({})", label)?;
        }
    }
    writeln!(out)
}

fn write_enrolled_course<W: Write>(out: &mut W, entry: &EnrolledCourse<'_>) -> fmt::Result {
    writeln!(out, "  {}  {}", entry.course.code, entry.course.name)?;
    if let Some(instructor) = &entry.course.instructor {
        writeln!(out, "    Instructor: {}", instructor)?;
    }
    if let Some(grade) = &entry.enrollment.grade {
        writeln!(out, "    Grade: {}", grade)?;
    }
    Ok(())
}

fn write_my_courses<W: Write>(out: &mut W, state: &AppState) -> fmt::Result {
    let mine = my_courses(state);

    writeln!(out, "Enrolled Courses")?;
    if mine.enrolled.is_empty() {
        writeln!(out, "  You haven't enrolled in any courses yet.")?;
    }
    for entry in &mine.enrolled {
        write_enrolled_course(out, entry)?;
    }

    if !mine.waitlisted.is_empty() {
        writeln!(out)?;
        writeln!(out, "Waitlisted Courses")?;
        for entry in &mine.waitlisted {
            write_enrolled_course(out, entry)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::state::ActionState;
    use crate::domain::model::{Course, Enrollment, EnrollmentStatus, Session};

    fn course(id: &str, code: &str, seats: i32) -> Course {
        Course {
            id: id.to_string(),
            code: code.to_string(),
            name: format!("{} course", code),
            description: Some("An introduction".to_string()),
            max_seats: 30,
            available_seats: seats,
            created_at: None,
            instructor: Some("Dr. Hopper".to_string()),
            credits: Some(4),
            department: None,
        }
    }

    fn enrollment(course_id: &str, status: EnrollmentStatus, grade: Option<&str>) -> Enrollment {
        Enrollment {
            id: format!("e-{}", course_id),
            student_id: "u1".to_string(),
            course_id: course_id.to_string(),
            status,
            created_at: None,
            grade: grade.map(str::to_string),
            course: None,
        }
    }

    fn loaded(courses: Vec<Course>) -> AppState {
        AppState {
            loading: false,
            courses,
            ..AppState::default()
        }
    }

    #[test]
    fn test_loading_screen() {
        assert_eq!(render(&AppState::default()), "Loading...\n");
    }

    #[test]
    fn test_anonymous_course_card_has_no_action() {
        let view = render(&loaded(vec![course("c1", "CS101", 5)]));

        assert!(view.contains("Sign In / Sign Up"));
        assert!(view.contains("CS101  CS101 course"));
        assert!(view.contains("5 seats available"));
        assert!(view.contains("Instructor: Dr. Hopper"));
        assert!(view.contains("Credits: 4"));
        assert!(!view.contains("[Enroll Now]"));
        assert!(!view.contains("[My Courses]"));
    }

    #[test]
    fn test_signed_in_actions() {
        let mut state = loaded(vec![
            course("c1", "CS101", 5),
            course("c2", "CS102", 0),
            course("c3", "CS103", 3),
            course("c4", "CS104", 3),
        ]);
        state.session = Some(Session::new("u1", "x@example.com"));
        state.enrollments = vec![enrollment("c3", EnrollmentStatus::Enrolled, None)];
        state.set_action_state("c4", ActionState::Pending);

        let view = render(&state);
        assert!(view.contains("[Courses] | My Courses    x@example.com (signout)"));
        assert!(view.contains("[Enroll Now]"));
        assert!(view.contains("[Join Waitlist]"));
        assert!(view.contains("(Enrolled)"));
        assert!(view.contains("(Enrolling...)"));
        assert!(!view.contains("[Enrolled]"));
    }

    #[test]
    fn test_auth_prompt_shows_error() {
        let mut state = loaded(Vec::new());
        state.auth_prompt_open = true;
        state.auth_error = Some("Invalid login credentials".to_string());

        let view = render(&state);
        assert!(view.contains("--- Sign In / Sign Up ---"));
        assert!(view.contains("Error: Invalid login credentials"));
        assert!(view.contains("No courses found."));
    }

    #[test]
    fn test_my_courses_empty() {
        let mut state = loaded(vec![course("c1", "CS101", 5)]);
        state.session = Some(Session::new("u1", "x@example.com"));
        state.active_tab = Tab::MyCourses;

        let view = render(&state);
        assert!(view.contains("Courses | [My Courses]"));
        assert!(view.contains("You haven't enrolled in any courses yet."));
        assert!(!view.contains("Waitlisted Courses"));
    }

    #[test]
    fn test_my_courses_with_grade_and_waitlist() {
        let mut state = loaded(vec![course("c1", "CS101", 5), course("c2", "CS102", 0)]);
        state.session = Some(Session::new("u1", "x@example.com"));
        state.active_tab = Tab::MyCourses;
        state.enrollments = vec![
            enrollment("c1", EnrollmentStatus::Enrolled, Some("A")),
            enrollment("c2", EnrollmentStatus::Waitlisted, None),
        ];

        let view = render(&state);
        assert!(view.contains("Grade: A"));
        assert!(!view.contains("You haven't enrolled"));
        let waitlisted = view.find("Waitlisted Courses").unwrap();
        assert!(view[waitlisted..].contains("CS102"));
    }
}

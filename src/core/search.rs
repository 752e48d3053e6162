use crate::domain::model::Course;

fn contains_ci(field: Option<&str>, needle: &str) -> bool {
    field
        .map(|value| value.to_lowercase().contains(needle))
        .unwrap_or(false)
}

pub fn matches_query(course: &Course, query: &str) -> bool {
    let needle = query.to_lowercase();
    contains_ci(Some(&course.name), &needle)
        || contains_ci(course.description.as_deref(), &needle)
        || contains_ci(course.instructor.as_deref(), &needle)
}

/// Case-insensitive substring filter over name, description and instructor.
/// Keeps the fetched order; an empty query keeps everything.
pub fn filter_courses<'a>(courses: &'a [Course], query: &str) -> Vec<&'a Course> {
    courses.iter().filter(|c| matches_query(c, query)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn course(id: &str, name: &str, description: Option<&str>, instructor: Option<&str>) -> Course {
        Course {
            id: id.to_string(),
            code: id.to_uppercase(),
            name: name.to_string(),
            description: description.map(str::to_string),
            max_seats: 10,
            available_seats: 10,
            created_at: None,
            instructor: instructor.map(str::to_string),
            credits: None,
            department: None,
        }
    }

    fn catalogue() -> Vec<Course> {
        vec![
            course("c1", "Linear Algebra", Some("Vectors and matrices"), Some("Dr. Noether")),
            course("c2", "Databases", None, Some("Prof. Codd")),
            course("c3", "Compilers", Some("Parsing and code generation"), None),
        ]
    }

    fn ids(courses: &[&Course]) -> Vec<String> {
        courses.iter().map(|c| c.id.clone()).collect()
    }

    #[test]
    fn test_empty_query_returns_all_in_order() {
        let courses = catalogue();
        assert_eq!(ids(&filter_courses(&courses, "")), vec!["c1", "c2", "c3"]);
    }

    #[test]
    fn test_matches_name_case_insensitively() {
        let courses = catalogue();
        assert_eq!(ids(&filter_courses(&courses, "dATAbase")), vec!["c2"]);
    }

    #[test]
    fn test_matches_description_and_instructor() {
        let courses = catalogue();
        assert_eq!(ids(&filter_courses(&courses, "MATRICES")), vec!["c1"]);
        assert_eq!(ids(&filter_courses(&courses, "codd")), vec!["c2"]);
    }

    #[test]
    fn test_missing_fields_never_match() {
        let courses = catalogue();
        // c2 has no description and c3 no instructor; neither may panic or match.
        assert_eq!(ids(&filter_courses(&courses, "parsing")), vec!["c3"]);
        assert!(filter_courses(&courses, "quantum").is_empty());
    }

    #[test]
    fn test_filter_is_exactly_the_matching_subset() {
        let courses = catalogue();
        for query in ["a", "pro", "DR.", "and", "zzz", " "] {
            let filtered = filter_courses(&courses, query);
            let expected: Vec<&Course> = courses
                .iter()
                .filter(|c| {
                    let q = query.to_lowercase();
                    c.name.to_lowercase().contains(&q)
                        || c.description.as_ref().is_some_and(|d| d.to_lowercase().contains(&q))
                        || c.instructor.as_ref().is_some_and(|i| i.to_lowercase().contains(&q))
                })
                .collect();
            assert_eq!(filtered, expected, "query {:?}", query);
        }
    }
}

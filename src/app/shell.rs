use crate::app::render::render;
use crate::core::engine::EnrollEngine;
use crate::core::state::Tab;
use crate::domain::model::EnrollmentStatus;
use crate::domain::ports::{AuthService, CourseRepository};
use crate::utils::error::Result;
use std::io::Write;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};

pub const HELP: &str = "\
Commands:
  show                      redraw the current view
  search [TEXT]             filter courses by name, description or instructor
  tab courses|my            switch tabs
  login                     open the sign-in prompt
  cancel                    close the sign-in prompt
  signin EMAIL PASSWORD     sign in
  signup EMAIL PASSWORD     create an account
  signout                   sign out
  enroll ID_OR_CODE         enroll in a course, or join its waitlist
  refresh                   reload courses and enrollments
  refresh-token             renew the session
  help                      show this help
  quit                      exit";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Help,
    Show,
    Search(String),
    Tab(Tab),
    Login,
    Cancel,
    SignIn { email: String, password: String },
    SignUp { email: String, password: String },
    SignOut,
    Enroll(String),
    Refresh,
    RefreshToken,
    Quit,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CommandError {
    #[error("Unknown command '{0}'. Type 'help' for the list of commands.")]
    Unknown(String),

    #[error("Usage: {0}")]
    Usage(&'static str),
}

impl Command {
    /// Parses one input line. Blank lines redraw the view.
    pub fn parse(line: &str) -> std::result::Result<Self, CommandError> {
        let line = line.trim();
        let (name, rest) = match line.split_once(char::is_whitespace) {
            Some((name, rest)) => (name, rest.trim()),
            None => (line, ""),
        };
        let args: Vec<&str> = rest.split_whitespace().collect();

        match name.to_ascii_lowercase().as_str() {
            "" | "show" => Ok(Command::Show),
            "help" | "?" => Ok(Command::Help),
            "search" => Ok(Command::Search(rest.to_string())),
            "tab" => match args.as_slice() {
                ["courses"] => Ok(Command::Tab(Tab::Courses)),
                ["my"] => Ok(Command::Tab(Tab::MyCourses)),
                _ => Err(CommandError::Usage("tab courses|my")),
            },
            "login" => Ok(Command::Login),
            "cancel" => Ok(Command::Cancel),
            "signin" => match args.as_slice() {
                [email, password] => Ok(Command::SignIn {
                    email: email.to_string(),
                    password: password.to_string(),
                }),
                _ => Err(CommandError::Usage("signin EMAIL PASSWORD")),
            },
            "signup" => match args.as_slice() {
                [email, password] => Ok(Command::SignUp {
                    email: email.to_string(),
                    password: password.to_string(),
                }),
                _ => Err(CommandError::Usage("signup EMAIL PASSWORD")),
            },
            "signout" => Ok(Command::SignOut),
            "enroll" => match args.as_slice() {
                [course] => Ok(Command::Enroll(course.to_string())),
                _ => Err(CommandError::Usage("enroll ID_OR_CODE")),
            },
            "refresh" => Ok(Command::Refresh),
            "refresh-token" => Ok(Command::RefreshToken),
            "quit" | "exit" => Ok(Command::Quit),
            other => Err(CommandError::Unknown(other.to_string())),
        }
    }
}

/// Accepts a course id or, case-insensitively, a course code.
fn resolve_course_id<A: AuthService, R: CourseRepository>(
    engine: &EnrollEngine<A, R>,
    key: &str,
) -> String {
    let state = engine.state();
    state
        .find_course(key)
        .or_else(|| state.courses.iter().find(|c| c.code.eq_ignore_ascii_case(key)))
        .map(|c| c.id.clone())
        .unwrap_or_else(|| key.to_string())
}

/// Runs one command. Returns a message to print above the redrawn view.
pub async fn execute<A: AuthService, R: CourseRepository>(
    engine: &mut EnrollEngine<A, R>,
    command: Command,
) -> Option<String> {
    match command {
        Command::Help => Some(HELP.to_string()),
        Command::Show | Command::Quit => None,
        Command::Search(query) => {
            engine.set_search_query(query);
            None
        }
        Command::Tab(tab) => {
            if engine.set_active_tab(tab) {
                None
            } else {
                Some("Sign in to see your courses.".to_string())
            }
        }
        Command::Login => {
            engine.open_auth_prompt();
            None
        }
        Command::Cancel => {
            engine.close_auth_prompt();
            None
        }
        // Auth failures are shown inside the prompt.
        Command::SignIn { email, password } => engine
            .sign_in(&email, &password)
            .await
            .ok()
            .map(|_| format!("Signed in as {}", email)),
        Command::SignUp { email, password } => match engine.sign_up(&email, &password).await {
            Ok(()) if engine.state().is_signed_in() => Some(format!("Signed in as {}", email)),
            Ok(()) => Some("Check your email to confirm your account.".to_string()),
            Err(_) => None,
        },
        Command::SignOut => {
            engine.sign_out().await;
            Some("Signed out.".to_string())
        }
        Command::Enroll(key) => {
            let course_id = resolve_course_id(engine, &key);
            match engine.enroll(&course_id).await {
                Ok(EnrollmentStatus::Enrolled) => Some(format!("Enrolled in {}.", key)),
                Ok(EnrollmentStatus::Waitlisted) => {
                    Some(format!("Added to the waitlist for {}.", key))
                }
                Err(e) => Some(e.user_friendly_message()),
            }
        }
        Command::Refresh => {
            engine.refresh_courses().await;
            engine.refresh_enrollments().await;
            None
        }
        Command::RefreshToken => match engine.refresh_token().await {
            Ok(()) => Some("Session refreshed.".to_string()),
            Err(e) => Some(e.user_friendly_message()),
        },
    }
}

/// The event loop: one line is one action, and the view is redrawn after each.
/// Session changes from the auth service are applied before every action.
pub async fn run_shell<A, R, I, O>(engine: &mut EnrollEngine<A, R>, input: I, output: &mut O) -> Result<()>
where
    A: AuthService,
    R: CourseRepository,
    I: AsyncBufRead + Unpin,
    O: Write,
{
    write!(output, "{}", render(engine.state()))?;
    write!(output, "> ")?;
    output.flush()?;

    let mut lines = input.lines();
    while let Some(line) = lines.next_line().await? {
        engine.process_session_changes().await;

        let message = match Command::parse(&line) {
            Ok(Command::Quit) => break,
            Ok(command) => execute(engine, command).await,
            Err(e) => Some(e.to_string()),
        };

        writeln!(output)?;
        if let Some(message) = message {
            writeln!(output, "{}", message)?;
            writeln!(output)?;
        }
        write!(output, "{}", render(engine.state()))?;
        write!(output, "> ")?;
        output.flush()?;
    }

    tracing::info!("👋 Shell closed");
    Ok(())
}

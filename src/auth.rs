use crate::error::AcademyError;
use regex::Regex;
use serde::Serialize;
use std::sync::OnceLock;

pub const MIN_PASSWORD: usize = 6;
pub const MIN_FULL_NAME: usize = 2;
pub const MIN_USERNAME: usize = 3;

fn email_pattern() -> &'static Regex {
    static EMAIL: OnceLock<Regex> = OnceLock::new();
    EMAIL.get_or_init(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email pattern"))
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SignupForm {
    pub email: String,
    pub password: String,
    #[serde(skip)]
    pub confirm_password: String,
    pub full_name: String,
    pub username: String,
}

fn check_email(email: &str) -> Result<(), AcademyError> {
    if !email_pattern().is_match(email.trim()) {
        return Err(AcademyError::validation("email", "Invalid email address"));
    }
    Ok(())
}

fn check_len(field: &'static str, value: &str, min: usize, label: &str) -> Result<(), AcademyError> {
    if value.chars().count() < min {
        return Err(AcademyError::validation(
            field,
            format!("{} must be at least {} characters", label, min),
        ));
    }
    Ok(())
}

impl Credentials {
    pub fn validate(&self) -> Result<(), AcademyError> {
        check_email(&self.email)?;
        check_len("password", &self.password, MIN_PASSWORD, "Password")
    }
}

impl SignupForm {
    pub fn validate(&self) -> Result<(), AcademyError> {
        check_email(&self.email)?;
        check_len("password", &self.password, MIN_PASSWORD, "Password")?;
        check_len("confirm_password", &self.confirm_password, MIN_PASSWORD, "Password")?;
        check_len("full_name", self.full_name.trim(), MIN_FULL_NAME, "Full name")?;
        check_len("username", self.username.trim(), MIN_USERNAME, "Username")?;
        if self.password != self.confirm_password {
            return Err(AcademyError::validation("confirm_password", "Passwords don't match"));
        }
        Ok(())
    }
}

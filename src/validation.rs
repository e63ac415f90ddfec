//! Form rules checked before any auth or profile request is sent.

use chrono::{Datelike, Local, NaiveDate};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use validator::{Validate, ValidateEmail, ValidationError};

const MIN_SIGNUP_AGE: i32 = 13;

static USERNAME_CHARS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-zA-Z0-9_]+$").expect("username regex"));
static PHONE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[+]?[(]?[0-9]{1,4}[)]?[-\s.]?[(]?[0-9]{1,4}[)]?[-\s.]?[0-9]{1,9}$")
        .expect("phone regex")
});

#[derive(Debug, Clone, Serialize, Validate)]
pub struct LoginForm {
    #[validate(custom(function = validate_login_username))]
    pub username: String,
    #[validate(custom(function = validate_login_password))]
    pub password: String,
    #[serde(skip)]
    pub remember_me: bool,
}

#[derive(Debug, Clone, Serialize, Validate)]
pub struct SignupForm {
    #[validate(custom(function = validate_signup_username))]
    pub username: String,
    #[validate(custom(function = validate_email_field))]
    pub email: String,
    #[validate(custom(function = validate_signup_password))]
    pub password: String,
    #[validate(custom(function = validate_phone))]
    pub phone: String,
    #[validate(custom(function = validate_signup_dob))]
    pub dob: NaiveDate,
}

#[derive(Debug, Clone, Serialize, Validate)]
pub struct ProfileForm {
    #[validate(custom(function = validate_email_field))]
    pub email: String,
    #[validate(custom(function = validate_phone))]
    pub phone: String,
    #[validate(custom(function = validate_past_dob))]
    pub dob: NaiveDate,
}

fn invalid(code: &'static str, message: &'static str) -> ValidationError {
    let mut err = ValidationError::new(code);
    err.message = Some(message.into());
    err
}

fn check_username_length(value: &str) -> Result<(), ValidationError> {
    let len = value.chars().count();
    if len == 0 {
        return Err(invalid("required", "Username is required"));
    }
    if len < 3 {
        return Err(invalid("length", "Username must be at least 3 characters"));
    }
    if len > 50 {
        return Err(invalid("length", "Username must be less than 50 characters"));
    }
    Ok(())
}

fn check_password_length(value: &str) -> Result<(), ValidationError> {
    if value.is_empty() {
        return Err(invalid("required", "Password is required"));
    }
    if value.chars().count() < 6 {
        return Err(invalid("length", "Password must be at least 6 characters"));
    }
    Ok(())
}

fn validate_login_username(value: &str) -> Result<(), ValidationError> {
    check_username_length(value)
}

fn validate_login_password(value: &str) -> Result<(), ValidationError> {
    check_password_length(value)
}

fn validate_signup_username(value: &str) -> Result<(), ValidationError> {
    check_username_length(value)?;
    if !USERNAME_CHARS.is_match(value) {
        return Err(invalid(
            "charset",
            "Username can only contain letters, numbers, and underscores",
        ));
    }
    Ok(())
}

fn validate_signup_password(value: &str) -> Result<(), ValidationError> {
    check_password_length(value)?;
    if !value.chars().any(|c| c.is_ascii_uppercase()) {
        return Err(invalid(
            "uppercase",
            "Password must contain at least one uppercase letter",
        ));
    }
    if !value.chars().any(|c| c.is_ascii_lowercase()) {
        return Err(invalid(
            "lowercase",
            "Password must contain at least one lowercase letter",
        ));
    }
    if !value.chars().any(|c| c.is_ascii_digit()) {
        return Err(invalid("digit", "Password must contain at least one number"));
    }
    Ok(())
}

fn validate_email_field(value: &str) -> Result<(), ValidationError> {
    if value.is_empty() {
        return Err(invalid("required", "Email is required"));
    }
    if !value.validate_email() {
        return Err(invalid("email", "Please enter a valid email address"));
    }
    Ok(())
}

fn validate_phone(value: &str) -> Result<(), ValidationError> {
    if value.is_empty() {
        return Err(invalid("required", "Phone number is required"));
    }
    if !PHONE.is_match(value) {
        return Err(invalid("phone", "Please enter a valid phone number"));
    }
    Ok(())
}

fn validate_signup_dob(dob: &NaiveDate) -> Result<(), ValidationError> {
    check_signup_dob(*dob, Local::now().date_naive())
}

fn validate_past_dob(dob: &NaiveDate) -> Result<(), ValidationError> {
    check_not_future(*dob, Local::now().date_naive())
}

fn check_not_future(dob: NaiveDate, today: NaiveDate) -> Result<(), ValidationError> {
    if dob > today {
        return Err(invalid("future", "Date of birth cannot be in the future"));
    }
    Ok(())
}

fn check_signup_dob(dob: NaiveDate, today: NaiveDate) -> Result<(), ValidationError> {
    if age_on(dob, today) < MIN_SIGNUP_AGE {
        return Err(invalid(
            "age",
            "You must be at least 13 years old to sign up",
        ));
    }
    check_not_future(dob, today)
}

/// Whole years between `dob` and `today`.
pub fn age_on(dob: NaiveDate, today: NaiveDate) -> i32 {
    let mut age = today.year() - dob.year();
    if (today.month(), today.day()) < (dob.month(), dob.day()) {
        age -= 1;
    }
    age
}

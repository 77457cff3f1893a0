use crate::utils::error::CustomError;
use regex::Regex;

/// Minimum length for a new password
pub const MIN_PASSWORD_LENGTH: usize = 6;

pub fn validate_email(email: &str) -> Result<(), CustomError> {
    let re = Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").unwrap();

    if !re.is_match(email) {
        return Err(CustomError::ValidationError(
            "Invalid email address.".into(),
        ));
    }

    Ok(())
}

pub fn validate_new_password(password: &str) -> Result<(), CustomError> {
    if password.len() < MIN_PASSWORD_LENGTH {
        return Err(CustomError::BadRequestError(
            "Password must be at least 6 characters.".into(),
        ));
    }

    Ok(())
}

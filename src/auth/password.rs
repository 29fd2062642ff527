use crate::error::{AppError, AppResult};

/// Check the account-creation password policy: 8 to 36 characters with at
/// least one upper, one lower, one digit and one special character.
pub fn validate_policy(password: &str) -> AppResult<()> {
    if password.len() < 8 || password.len() >= 37 {
        return Err(AppError::Validation(
            "The password length is invalid".into(),
        ));
    }

    let has_upper = password.chars().any(|c| c.is_ascii_uppercase());
    let has_lower = password.chars().any(|c| c.is_ascii_lowercase());
    let has_digit = password.chars().any(|c| c.is_ascii_digit());
    let has_special = password.chars().any(|c| !c.is_ascii_alphanumeric());

    if !(has_upper && has_lower && has_digit && has_special) {
        return Err(AppError::Validation(
            "The password complexity does not meet the requirements.".into(),
        ));
    }

    Ok(())
}

pub fn hash(password: &str) -> AppResult<String> {
    bcrypt::hash(password, bcrypt::DEFAULT_COST)
        .map_err(|e| AppError::Internal(format!("Password hashing failed: {}", e)))
}

pub fn verify(password: &str, hashed: &str) -> bool {
    bcrypt::verify(password, hashed).unwrap_or(false)
}

use std::fmt;

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};

const MAX_PASSWORD_LENGTH: usize = 64;

#[derive(Debug, PartialEq)]
pub enum HashError {
    /// Parameter is empty.
    PasswordIsEmpty,
    /// The maximum parameter length has been exceeded.
    PasswordExceedMaxLen(usize),
    /// An error occurred while creating the hash.
    Hashing(String),
    /// An error occurred while parsing the hash.
    InvalidHashFormat(String),
}

impl std::error::Error for HashError {}

impl fmt::Display for HashError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match &self {
            HashError::PasswordIsEmpty => write!(f, "Password is empty."),
            HashError::PasswordExceedMaxLen(max_length) => {
                write!(f, "The password exceeds the max length of {} characters.", max_length)
            }
            HashError::Hashing(info) => write!(f, "Error creating hash: {}", info),
            HashError::InvalidHashFormat(info) => write!(f, "Invalid password hash format: {}", info),
        }
    }
}

fn check_password(password: &str) -> Result<(), HashError> {
    if password.is_empty() {
        return Err(HashError::PasswordIsEmpty);
    }
    if password.len() > MAX_PASSWORD_LENGTH {
        return Err(HashError::PasswordExceedMaxLen(MAX_PASSWORD_LENGTH));
    }
    Ok(())
}

/// Hash a password for storage.
pub fn encode_hash(password: &str) -> Result<String, HashError> {
    check_password(password)?;

    let salt = SaltString::generate(&mut OsRng);
    let password_hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| HashError::Hashing(e.to_string()))?
        .to_string();

    Ok(password_hash)
}

/// Check a password against a stored hash.
pub fn verify_hash(password: &str, hashed_password: &str) -> Result<bool, HashError> {
    check_password(password)?;

    let parsed_hash = PasswordHash::new(hashed_password)
        .map_err(|e| HashError::InvalidHashFormat(e.to_string()))?;

    let password_matches = Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .map_or(false, |_| true);

    Ok(password_matches)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn setup_test() -> (String, String) {
        let password = "password123";
        let hashed_password = encode_hash(password).unwrap();
        (password.to_string(), hashed_password)
    }

    #[test]
    fn test_verify_hashed_password_should_return_true() {
        let (password, hashed_password) = setup_test();

        assert_eq!(verify_hash(&password, &hashed_password).unwrap(), true);
    }

    #[test]
    fn test_verify_wrong_password_should_return_false() {
        let (_, hashed_password) = setup_test();

        assert_eq!(verify_hash("wrongpassword", &hashed_password).unwrap(), false);
    }

    #[test]
    fn test_verify_empty_password_should_fail() {
        let (_, hashed_password) = setup_test();

        assert_eq!(verify_hash("", &hashed_password).unwrap_err(), HashError::PasswordIsEmpty);
    }

    #[test]
    fn test_verify_invalid_hash_should_fail() {
        let result = verify_hash("password123", "invalid-hash").unwrap_err();

        assert!(matches!(result, HashError::InvalidHashFormat(_)));
    }

    #[test]
    fn test_hash_empty_password_should_fail() {
        assert_eq!(encode_hash("").unwrap_err(), HashError::PasswordIsEmpty);
    }

    #[test]
    fn test_hash_long_password_should_fail() {
        let long_password = "a".repeat(1000);

        assert_eq!(
            encode_hash(&long_password).unwrap_err(),
            HashError::PasswordExceedMaxLen(MAX_PASSWORD_LENGTH)
        );
    }
}

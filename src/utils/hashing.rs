use bcrypt::{BcryptError, DEFAULT_COST, hash};

/// Hash a password with bcrypt
pub fn hash_password(password: &str) -> Result<String, BcryptError> {
    hash(password, DEFAULT_COST)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hashed_password_verifies_against_original() {
        let hashed = hash_password("newpass1").unwrap();
        assert_ne!(hashed, "newpass1");
        assert!(bcrypt::verify("newpass1", &hashed).unwrap());
    }
}

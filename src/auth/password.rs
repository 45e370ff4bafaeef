//! Password hashing.

use anyhow::Result;

/// Default bcrypt work factor.
pub const DEFAULT_COST: u32 = 12;

/// Hash a password with bcrypt at the given cost.
pub fn hash_password(password: &str, cost: u32) -> Result<String> {
    Ok(bcrypt::hash(password, cost)?)
}

/// Check a password against a stored hash. Malformed hashes never match.
pub fn verify_password(password: &str, hashed: &str) -> bool {
    bcrypt::verify(password, hashed).unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_and_verify() {
        let hashed = hash_password("correct horse", 4).unwrap();
        assert_ne!(hashed, "correct horse");
        assert!(verify_password("correct horse", &hashed));
        assert!(!verify_password("wrong horse", &hashed));
    }

    #[test]
    fn test_malformed_hash_rejected() {
        assert!(!verify_password("anything", "not-a-bcrypt-hash"));
    }

    #[test]
    fn test_cost_out_of_range() {
        assert!(hash_password("password1", 2).is_err());
    }
}

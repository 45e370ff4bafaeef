//! Registration, login and bearer-token resolution.

pub mod password;
pub mod token;

pub use password::{hash_password, verify_password};
pub use token::{Claims, TokenError, TokenService};

use crate::db::Database;
use crate::error::{ApiError, ApiResult, ErrorCode};
use crate::types::{PASSWORD_MIN_LEN, TokenResponse, User, UserResponse};
use tracing::{info, warn};

/// Account operations on top of the user table and the token service.
#[derive(Clone)]
pub struct AuthService {
    db: Database,
    tokens: TokenService,
    bcrypt_cost: u32,
}

/// Trim and lowercase an email address.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Minimal shape check: one `@`, non-empty local part, dotted domain, no spaces.
pub fn is_valid_email(email: &str) -> bool {
    if email.chars().any(char::is_whitespace) {
        return false;
    }
    match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.contains('@')
                && domain
                    .split('.')
                    .filter(|part| !part.is_empty())
                    .count()
                    >= 2
                && !domain.starts_with('.')
                && !domain.ends_with('.')
        }
        None => false,
    }
}

impl AuthService {
    pub fn new(db: Database, tokens: TokenService, bcrypt_cost: u32) -> Self {
        Self {
            db,
            tokens,
            bcrypt_cost,
        }
    }

    pub fn tokens(&self) -> &TokenService {
        &self.tokens
    }

    fn token_response(&self, user: &User) -> ApiResult<TokenResponse> {
        let access_token = self.tokens.issue(user.id).map_err(ApiError::internal)?;
        Ok(TokenResponse {
            access_token,
            token_type: "bearer".to_string(),
            user: UserResponse::from(user),
        })
    }

    /// Create an account and sign the new user in.
    pub async fn register(&self, email: &str, password: &str) -> ApiResult<TokenResponse> {
        let email = normalize_email(email);
        if email.is_empty() {
            return Err(ApiError::missing_field("email"));
        }
        if !is_valid_email(&email) {
            return Err(ApiError::invalid_value("email", "Invalid email address"));
        }
        if password.chars().count() < PASSWORD_MIN_LEN {
            return Err(ApiError::invalid_value(
                "password",
                &format!("Password must be at least {} characters", PASSWORD_MIN_LEN),
            ));
        }

        if self.db.get_user_by_email(&email)?.is_some() {
            warn!(email = %email, "Registration failed: email already registered");
            return Err(email_taken());
        }

        let password = password.to_string();
        let cost = self.bcrypt_cost;
        let hashed = tokio::task::spawn_blocking(move || hash_password(&password, cost))
            .await
            .map_err(ApiError::internal)?
            .map_err(ApiError::internal)?;

        // A concurrent registration can still win the unique constraint.
        let user = self
            .db
            .create_user(&email, &hashed)
            .map_err(|e| ApiError::database("registering user", e))?
            .ok_or_else(email_taken)?;

        info!(user_id = user.id, email = %user.email, "User registered");
        self.token_response(&user)
    }

    /// Check credentials and issue a token. Unknown email and wrong password
    /// are indistinguishable to the caller.
    pub async fn authenticate(&self, email: &str, password: &str) -> ApiResult<TokenResponse> {
        let email = normalize_email(email);
        let Some(user) = self.db.get_user_by_email(&email)? else {
            warn!(email = %email, "Login failed: unknown email");
            return Err(invalid_credentials());
        };

        let password = password.to_string();
        let hashed = user.hashed_password.clone();
        let verified = tokio::task::spawn_blocking(move || verify_password(&password, &hashed))
            .await
            .map_err(ApiError::internal)?;

        if !verified {
            warn!(user_id = user.id, "Login failed: wrong password");
            return Err(invalid_credentials());
        }

        info!(user_id = user.id, "User authenticated");
        self.token_response(&user)
    }

    /// Resolve a bearer token to its user. `None` for bad tokens and deleted users.
    pub fn current_user(&self, token: &str) -> anyhow::Result<Option<User>> {
        match self.tokens.validate(token) {
            Ok(user_id) => self.db.get_user(user_id),
            Err(e) => {
                warn!(error = %e, "Rejected bearer token");
                Ok(None)
            }
        }
    }
}

fn email_taken() -> ApiError {
    ApiError::new(ErrorCode::AlreadyExists, "Email already registered").with_field("email")
}

fn invalid_credentials() -> ApiError {
    ApiError::new(ErrorCode::InvalidCredentials, "Invalid email or password")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_email_shape() {
        assert!(is_valid_email("user@example.com"));
        assert!(is_valid_email("first.last@sub.example.org"));
        assert!(!is_valid_email("userexample.com"));
        assert!(!is_valid_email("@example.com"));
        assert!(!is_valid_email("user@localhost"));
        assert!(!is_valid_email("user@@example.com"));
        assert!(!is_valid_email("user @example.com"));
        assert!(!is_valid_email("user@example."));
    }

    #[test]
    fn test_normalize_email() {
        assert_eq!(normalize_email("  User@Example.COM "), "user@example.com");
    }
}

//! Single-admin login and bearer token checks

use tracing::{info, warn};

use super::jwt::{extract_token_from_header, IssuedToken, JwtValidator};
use super::password::verify_password;
use crate::types::{JournalError, Result};

/// How the admin password is configured
#[derive(Clone)]
pub enum AdminPassword {
    /// Compared as-is
    Plain(String),
    /// Argon2 PHC string
    Hashed(String),
}

impl std::fmt::Debug for AdminPassword {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Plain(_) => f.write_str("Plain(..)"),
            Self::Hashed(_) => f.write_str("Hashed(..)"),
        }
    }
}

/// The one credential pair this backend accepts
#[derive(Debug, Clone)]
pub struct AdminCredentials {
    pub username: String,
    pub password: AdminPassword,
}

/// Identity asserted by a verified token
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal {
    pub username: String,
}

pub struct AuthGateway {
    credentials: AdminCredentials,
    jwt: JwtValidator,
}

impl AuthGateway {
    pub fn new(credentials: AdminCredentials, jwt: JwtValidator) -> Self {
        Self { credentials, jwt }
    }

    /// Exchange the admin credentials for a signed token
    pub fn login(&self, username: &str, password: &str) -> Result<IssuedToken> {
        if username.is_empty() || password.is_empty() {
            return Err(JournalError::Validation("username+password required".into()));
        }

        // Evaluate both halves so a wrong username costs the same as a wrong password
        let user_ok = constant_time_compare(username, &self.credentials.username);
        let pass_ok = match &self.credentials.password {
            AdminPassword::Plain(expected) => constant_time_compare(password, expected),
            AdminPassword::Hashed(hash) => verify_password(password, hash)?,
        };

        if !(user_ok && pass_ok) {
            warn!(username, "Login failed - invalid credentials");
            return Err(JournalError::Auth("Invalid credentials".into()));
        }

        let issued = self.jwt.generate_token(username)?;
        info!(username, expires_at = issued.expires_at, "Login successful");
        Ok(issued)
    }

    /// Verify a token's signature and expiry
    pub fn authenticate(&self, token: &str) -> Result<Principal> {
        let result = self.jwt.verify_token(token);
        match result.claims {
            Some(claims) if result.valid => Ok(Principal {
                username: claims.username,
            }),
            _ => {
                let reason = result.error.unwrap_or_else(|| "Invalid token".into());
                warn!(reason = %reason, "Token rejected");
                Err(JournalError::Auth("Invalid token".into()))
            }
        }
    }

    /// Authenticate the raw value of an Authorization header
    pub fn authenticate_header(&self, header: Option<&str>) -> Result<Principal> {
        let token = extract_token_from_header(header)
            .ok_or_else(|| JournalError::Auth("Missing token".into()))?;
        self.authenticate(token)
    }
}

/// Constant-time string comparison to prevent timing attacks
fn constant_time_compare(a: &str, b: &str) -> bool {
    if a.len() != b.len() {
        return false;
    }

    let mut result = 0u8;
    for (x, y) in a.bytes().zip(b.bytes()) {
        result |= x ^ y;
    }
    result == 0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::jwt::DEFAULT_EXPIRY_SECONDS;
    use crate::auth::password::hash_password;

    fn gateway(password: AdminPassword) -> AuthGateway {
        AuthGateway::new(
            AdminCredentials {
                username: "admin".into(),
                password,
            },
            JwtValidator::new(
                "test-secret-that-is-at-least-32-characters-long".into(),
                DEFAULT_EXPIRY_SECONDS,
            )
            .unwrap(),
        )
    }

    #[test]
    fn test_login_then_authenticate() {
        let gateway = gateway(AdminPassword::Plain("hunter2".into()));

        let issued = gateway.login("admin", "hunter2").unwrap();
        let principal = gateway.authenticate(&issued.token).unwrap();
        assert_eq!(principal.username, "admin");

        let header = format!("Bearer {}", issued.token);
        assert_eq!(
            gateway.authenticate_header(Some(&header)).unwrap(),
            principal
        );
    }

    #[test]
    fn test_bad_credentials() {
        let gateway = gateway(AdminPassword::Plain("hunter2".into()));

        for (user, pass) in [("admin", "wrong"), ("root", "hunter2"), ("admin", "hunter22")] {
            let err = gateway.login(user, pass).unwrap_err();
            assert!(matches!(err, JournalError::Auth(_)), "{user}/{pass}");
        }
    }

    #[test]
    fn test_missing_fields_are_validation_errors() {
        let gateway = gateway(AdminPassword::Plain("hunter2".into()));

        assert!(matches!(
            gateway.login("", "hunter2"),
            Err(JournalError::Validation(_))
        ));
        assert!(matches!(
            gateway.login("admin", ""),
            Err(JournalError::Validation(_))
        ));
    }

    #[test]
    fn test_hashed_password() {
        let hash = hash_password("s3cret").unwrap();
        let gateway = gateway(AdminPassword::Hashed(hash));

        assert!(gateway.login("admin", "s3cret").is_ok());
        assert!(matches!(
            gateway.login("admin", "S3cret"),
            Err(JournalError::Auth(_))
        ));
    }

    #[test]
    fn test_authenticate_rejections() {
        let gateway = gateway(AdminPassword::Plain("hunter2".into()));

        assert!(matches!(
            gateway.authenticate_header(None),
            Err(JournalError::Auth(msg)) if msg == "Missing token"
        ));
        assert!(matches!(
            gateway.authenticate_header(Some("Token abc")),
            Err(JournalError::Auth(msg)) if msg == "Missing token"
        ));
        assert!(matches!(
            gateway.authenticate("not.a.jwt"),
            Err(JournalError::Auth(msg)) if msg == "Invalid token"
        ));

        let other = JwtValidator::new_dev(DEFAULT_EXPIRY_SECONDS)
            .generate_token("admin")
            .unwrap();
        assert!(gateway.authenticate(&other.token).is_err());
    }

    #[test]
    fn test_constant_time_compare() {
        assert!(constant_time_compare("hello", "hello"));
        assert!(!constant_time_compare("hello", "world"));
        assert!(!constant_time_compare("hello", "hello!"));
    }
}

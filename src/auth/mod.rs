//! Authentication for the journal backend
//!
//! Provides:
//! - Single admin credential check (plaintext or Argon2 hash)
//! - JWT token generation and validation
//! - Bearer token extraction

pub mod gateway;
pub mod jwt;
pub mod password;

pub use gateway::{AdminCredentials, AdminPassword, AuthGateway, Principal};
pub use jwt::{extract_token_from_header, Claims, IssuedToken, JwtValidator, DEFAULT_EXPIRY_SECONDS};
pub use password::{hash_password, verify_password};

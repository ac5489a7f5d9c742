//! Configuration for the journal backend
//!
//! CLI arguments with environment variable fallbacks (clap). A `.env`
//! file is loaded by the binary before parsing.

use clap::{Parser, Subcommand};
use hyper::header::HeaderValue;
use std::net::SocketAddr;

use crate::auth::{password, AdminCredentials, AdminPassword, JwtValidator};
use crate::storage::{BlobRef, StorageConfig};
use crate::types::JournalError;

const DEV_ADMIN_PASSWORD: &str = "password";

/// Pib Journal backend
#[derive(Parser, Debug, Clone)]
#[command(name = "pib-journal")]
#[command(about = "Single-admin journal API backed by a remote file store")]
pub struct Args {
    #[command(subcommand)]
    pub command: Option<Command>,

    /// Address to listen on
    #[arg(long, env = "LISTEN", default_value = "0.0.0.0:3000")]
    pub listen: SocketAddr,

    /// Port override (hosting platforms usually only set PORT)
    #[arg(long, env = "PORT")]
    pub port: Option<u16>,

    /// Enable development mode (insecure defaults, in-memory storage fallback)
    #[arg(long, env = "DEV_MODE", default_value = "false")]
    pub dev_mode: bool,

    /// JWT secret for token signing (required in production)
    #[arg(long, env = "JWT_SECRET")]
    pub jwt_secret: Option<String>,

    /// JWT token expiry in seconds
    #[arg(long, env = "JWT_EXPIRY_SECONDS", default_value = "43200")]
    pub jwt_expiry_seconds: u64,

    /// Admin username
    #[arg(long, env = "ADMIN_USER", default_value = "admin")]
    pub admin_user: String,

    /// Admin password, plaintext
    #[arg(long, env = "ADMIN_PASS")]
    pub admin_pass: Option<String>,

    /// Admin password as an Argon2 PHC hash (takes precedence over ADMIN_PASS)
    #[arg(long, env = "ADMIN_PASS_HASH")]
    pub admin_pass_hash: Option<String>,

    /// Remote file store configuration
    #[command(flatten)]
    pub storage: StorageArgs,

    /// Allowed CORS origin
    #[arg(long, env = "CORS_ORIGIN", default_value = "*")]
    pub cors_origin: String,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "LOG_LEVEL", default_value = "info")]
    pub log_level: String,

    /// Emit logs as JSON lines
    #[arg(long, env = "LOG_JSON", default_value = "false")]
    pub log_json: bool,
}

/// Remote file store configuration
#[derive(Parser, Debug, Clone)]
pub struct StorageArgs {
    /// Storage API base URL
    #[arg(long, env = "FILESS_API_BASE", default_value = "https://api.filess.io")]
    pub filess_api_base: String,

    /// Storage API key
    #[arg(long, env = "FILESS_API_KEY")]
    pub filess_api_key: Option<String>,

    /// Pinned index file id or URL, skips the lookup by name
    #[arg(long, env = "FILESS_INDEX_ID")]
    pub filess_index_id: Option<String>,

    /// Outbound request timeout in seconds (transport default when unset)
    #[arg(long, env = "STORAGE_TIMEOUT_SECS")]
    pub storage_timeout_secs: Option<u64>,

    /// Delete the previous index version after each index write
    #[arg(long, env = "PRUNE_INDEX_VERSIONS", default_value = "false")]
    pub prune_index_versions: bool,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Print an Argon2 hash suitable for ADMIN_PASS_HASH
    HashPassword {
        /// Password to hash
        password: String,
    },
}

impl Args {
    /// Effective listen address (PORT overrides the port of LISTEN)
    pub fn listen_addr(&self) -> SocketAddr {
        let mut addr = self.listen;
        if let Some(port) = self.port {
            addr.set_port(port);
        }
        addr
    }

    /// Build the JWT validator (dev secret when none configured in dev mode)
    pub fn jwt_validator(&self) -> Result<JwtValidator, JournalError> {
        match (&self.jwt_secret, self.dev_mode) {
            (Some(secret), _) => JwtValidator::new(secret.clone(), self.jwt_expiry_seconds),
            (None, true) => Ok(JwtValidator::new_dev(self.jwt_expiry_seconds)),
            (None, false) => Err(JournalError::Config(
                "JWT_SECRET is required in production mode".into(),
            )),
        }
    }

    /// Admin credential pair
    pub fn admin_credentials(&self) -> Result<AdminCredentials, JournalError> {
        let password = match (&self.admin_pass_hash, &self.admin_pass) {
            (Some(hash), _) => AdminPassword::Hashed(hash.clone()),
            (None, Some(pass)) => AdminPassword::Plain(pass.clone()),
            (None, None) if self.dev_mode => AdminPassword::Plain(DEV_ADMIN_PASSWORD.to_string()),
            (None, None) => {
                return Err(JournalError::Config(
                    "ADMIN_PASS or ADMIN_PASS_HASH is required in production mode".into(),
                ))
            }
        };

        Ok(AdminCredentials {
            username: self.admin_user.clone(),
            password,
        })
    }

    /// Whether to talk to the remote store (false means in-memory, dev mode only)
    pub fn uses_remote_storage(&self) -> bool {
        self.storage.filess_api_key.is_some() || !self.dev_mode
    }

    pub fn storage_config(&self) -> StorageConfig {
        StorageConfig {
            base_url: self.storage.filess_api_base.clone(),
            api_key: self.storage.filess_api_key.clone(),
            timeout_secs: self.storage.storage_timeout_secs,
        }
    }

    /// Pinned index reference, if any
    pub fn index_ref(&self) -> Option<BlobRef> {
        self.storage
            .filess_index_id
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(BlobRef::from)
    }

    /// CORS origin as a header value
    pub fn cors_header(&self) -> Result<HeaderValue, JournalError> {
        HeaderValue::from_str(&self.cors_origin)
            .map_err(|e| JournalError::Config(format!("Invalid CORS_ORIGIN: {}", e)))
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), String> {
        self.jwt_validator().map_err(|e| e.to_string())?;
        self.admin_credentials().map_err(|e| e.to_string())?;
        self.cors_header().map_err(|e| e.to_string())?;

        if self.admin_user.is_empty() {
            return Err("ADMIN_USER must not be empty".to_string());
        }

        if let Some(ref hash) = self.admin_pass_hash {
            if !password::is_valid_hash(hash) {
                return Err("ADMIN_PASS_HASH is not a valid PHC hash string".to_string());
            }
        }

        if !self.dev_mode && self.storage.filess_api_key.is_none() {
            return Err("FILESS_API_KEY is required in production mode".to_string());
        }

        if self.storage.prune_index_versions && self.index_ref().is_some() {
            return Err(
                "PRUNE_INDEX_VERSIONS would delete the pinned FILESS_INDEX_ID; unset one of them"
                    .to_string(),
            );
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "test-secret-that-is-at-least-32-characters-long";

    fn parse(args: &[&str]) -> Args {
        let mut argv = vec!["pib-journal"];
        argv.extend_from_slice(args);
        Args::try_parse_from(argv).unwrap()
    }

    /// Complete production configuration, independent of the process environment
    fn production_args() -> Args {
        let mut args = parse(&[]);
        args.dev_mode = false;
        args.jwt_secret = Some(SECRET.to_string());
        args.admin_user = "admin".to_string();
        args.admin_pass = Some("hunter2".to_string());
        args.admin_pass_hash = None;
        args.cors_origin = "*".to_string();
        args.storage.filess_api_key = Some("key".to_string());
        args.storage.filess_index_id = None;
        args.storage.prune_index_versions = false;
        args
    }

    #[test]
    fn test_production_requires_secrets() {
        assert!(production_args().validate().is_ok());

        let mut args = production_args();
        args.jwt_secret = None;
        assert!(args.validate().is_err());

        let mut args = production_args();
        args.admin_pass = None;
        assert!(args.validate().is_err());

        let mut args = production_args();
        args.storage.filess_api_key = None;
        assert!(args.validate().is_err());
        assert!(args.uses_remote_storage());

        let mut args = production_args();
        args.cors_origin = "bad\norigin".to_string();
        assert!(args.validate().is_err());
    }

    #[test]
    fn test_short_secret_rejected() {
        let mut args = production_args();
        args.jwt_secret = Some("short".to_string());
        assert!(args.validate().is_err());
    }

    #[test]
    fn test_dev_mode_defaults() {
        let args = parse(&["--dev-mode"]);
        assert!(args.jwt_validator().is_ok());
        assert!(matches!(
            args.admin_credentials().unwrap().password,
            AdminPassword::Plain(_)
        ));
        if args.storage.filess_api_key.is_none() {
            assert!(!args.uses_remote_storage());
        }
    }

    #[test]
    fn test_port_overrides_listen() {
        let args = parse(&["--listen", "127.0.0.1:8080", "--port", "4000"]);
        assert_eq!(args.listen_addr(), "127.0.0.1:4000".parse().unwrap());
    }

    #[test]
    fn test_hash_takes_precedence() {
        let hash = password::hash_password("s3cret").unwrap();
        let args = parse(&["--dev-mode", "--admin-pass", "plain", "--admin-pass-hash", &hash]);
        assert!(matches!(
            args.admin_credentials().unwrap().password,
            AdminPassword::Hashed(_)
        ));
    }

    #[test]
    fn test_pruning_conflicts_with_pinned_index() {
        let args = parse(&[
            "--dev-mode",
            "--prune-index-versions",
            "--filess-index-id",
            "abc",
        ]);
        assert!(args.validate().is_err());
    }

    #[test]
    fn test_blank_index_id_is_ignored() {
        let args = parse(&["--filess-index-id", "  "]);
        assert!(args.index_ref().is_none());
    }

    #[test]
    fn test_hash_password_subcommand() {
        let args = parse(&["hash-password", "s3cret"]);
        assert!(matches!(
            args.command,
            Some(Command::HashPassword { ref password }) if password == "s3cret"
        ));
    }
}

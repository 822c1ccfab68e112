//! Configuration Management
//!
//! Connection parameters are sourced once at process start from environment
//! variables and stay immutable for the process lifetime. Callers may
//! override the target database per call, but never the base settings.
//!
//! # Environment Variables
//! - `POSTGRES_HOST` (default: `localhost`)
//! - `POSTGRES_PORT` (default: `5432`)
//! - `POSTGRES_USER` (default: `postgres`)
//! - `POSTGRES_PASSWORD` (default: empty)
//! - `POSTGRES_DB` (default: `postgres`)
//!
//! # Password Handling
//! The password never appears in any textual representation. `sanitized()`
//! returns a view that has no password field at all, and the `Debug` impl
//! substitutes a fixed mask.

use std::env;
use std::fmt;

use serde::Serialize;

use crate::error::{OpsError, Result};

/// PostgreSQL connection parameters, constructed once at startup
#[derive(Clone)]
pub struct ConnectionSettings {
    /// Server hostname
    pub host: String,

    /// Server port
    pub port: u16,

    /// Username
    pub user: String,

    /// Password
    /// WARNING: Sensitive data, do not log or include in error messages
    pub password: String,

    /// Default database for connections without a per-call override
    pub database: String,
}

impl ConnectionSettings {
    /// Build settings from `POSTGRES_*` environment variables
    ///
    /// # Errors
    ///
    /// Returns `Config` if `POSTGRES_PORT` is set but not a valid port number.
    pub fn from_env() -> Result<Self> {
        let port_raw = env::var("POSTGRES_PORT").unwrap_or_else(|_| "5432".to_string());
        let port: u16 = port_raw
            .parse()
            .map_err(|_| OpsError::config(format!("POSTGRES_PORT is not a valid port: {port_raw}")))?;

        Ok(Self {
            host: env::var("POSTGRES_HOST").unwrap_or_else(|_| "localhost".to_string()),
            port,
            user: env::var("POSTGRES_USER").unwrap_or_else(|_| "postgres".to_string()),
            password: env::var("POSTGRES_PASSWORD").unwrap_or_default(),
            database: env::var("POSTGRES_DB").unwrap_or_else(|_| "postgres".to_string()),
        })
    }

    /// Settings view safe for display and logging
    ///
    /// The password is structurally absent from the returned value, not
    /// masked: there is no field that could leak it.
    #[must_use]
    pub fn sanitized(&self) -> SanitizedSettings {
        SanitizedSettings {
            host: self.host.clone(),
            port: self.port,
            user: self.user.clone(),
            database: self.database.clone(),
        }
    }
}

impl fmt::Debug for ConnectionSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionSettings")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("user", &self.user)
            .field("password", &"***")
            .field("database", &self.database)
            .finish()
    }
}

/// Connection parameters with the password omitted
#[derive(Debug, Clone, Serialize)]
pub struct SanitizedSettings {
    /// Server hostname
    pub host: String,

    /// Server port
    pub port: u16,

    /// Username
    pub user: String,

    /// Default database
    pub database: String,
}

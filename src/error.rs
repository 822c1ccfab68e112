//! Error Handling Infrastructure
//!
//! This module defines all error types used throughout pgops.
//! All errors are structured and map to specific error codes, and every
//! public tool boundary converts them into a user-facing text message.
//!
//! # Error Categories
//! - `Connectivity`: server unreachable, authentication failed, unknown database
//! - `PoolExhausted`: no pooled connection became available within the timeout
//! - `Query`: statement failed server-side
//! - `NotInstalled`: optional extension absent (an expected outcome, not a fault)
//! - `InvalidInput`: malformed input or missing required parameters
//! - `Config`: invalid environment-derived configuration

use thiserror::Error;

/// Main error type for pgops operations
#[derive(Error, Debug)]
pub enum OpsError {
    /// Cannot reach or authenticate to the PostgreSQL server
    #[error("Connection failed: {0}")]
    Connectivity(String),

    /// No connection available from the pool within the acquisition timeout
    #[error("Connection pool exhausted: {0}")]
    PoolExhausted(String),

    /// Query execution failed server-side
    #[error("Query execution failed: {0}")]
    Query(String),

    /// Optional extension is not installed on the server
    #[error("{0} extension is not installed or enabled")]
    NotInstalled(String),

    /// Invalid input or missing required parameters
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Configuration error (bad port, missing required setting, etc.)
    #[error("Configuration error: {0}")]
    Config(String),
}

impl OpsError {
    /// Convert error to a stable error code string
    ///
    /// Error codes are stable and suitable for programmatic handling by agents.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::Connectivity(_) => "CONNECTIVITY_ERROR",
            Self::PoolExhausted(_) => "POOL_EXHAUSTED",
            Self::Query(_) => "QUERY_FAILED",
            Self::NotInstalled(_) => "NOT_INSTALLED",
            Self::InvalidInput(_) => "INVALID_INPUT",
            Self::Config(_) => "CONFIG_ERROR",
        }
    }

    /// Get human-readable error message (agent-appropriate, no sensitive data)
    ///
    /// Safe to surface to callers: never contains credentials, SQL text, or
    /// bound parameter values (those are logged at debug verbosity only).
    #[must_use]
    pub fn message(&self) -> String {
        self.to_string()
    }

    /// Create a connectivity error
    pub fn connectivity(message: impl Into<String>) -> Self {
        Self::Connectivity(message.into())
    }

    /// Create a pool exhausted error
    pub fn pool_exhausted(message: impl Into<String>) -> Self {
        Self::PoolExhausted(message.into())
    }

    /// Create a query failed error
    pub fn query(message: impl Into<String>) -> Self {
        Self::Query(message.into())
    }

    /// Create a not-installed error for the named extension
    pub fn not_installed(extension: impl Into<String>) -> Self {
        Self::NotInstalled(extension.into())
    }

    /// Create an invalid input error
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput(message.into())
    }

    /// Create a configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }
}

/// Result type alias for pgops operations
pub type Result<T> = std::result::Result<T, OpsError>;

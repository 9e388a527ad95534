//! Upstream backend access.
//!
//! [`Backend`] is the seam the student service depends on; [`BackendClient`] is the
//! HTTP implementation used in production.

pub mod client;

pub use client::{BackendClient, DEFAULT_TIMEOUT};

use crate::{error::Error, relay::SessionTokenSet, student::StudentRecord};
use async_trait::async_trait;
use secrecy::SecretString;
use std::fmt;

pub const LOGIN_PATH: &str = "/api/v1/auth/login";
pub const STUDENTS_PATH: &str = "/api/v1/students";
pub const CSRF_HEADER: &str = "x-csrf-token";

/// Username and password forwarded verbatim to the upstream login.
#[derive(Clone)]
pub struct Credentials {
    username: String,
    password: SecretString,
}

impl Credentials {
    #[must_use]
    pub fn new(username: impl Into<String>, password: SecretString) -> Self {
        Self {
            username: username.into(),
            password,
        }
    }

    #[must_use]
    pub fn username(&self) -> &str {
        &self.username
    }

    #[must_use]
    pub const fn password(&self) -> &SecretString {
        &self.password
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

#[async_trait]
pub trait Backend: Send + Sync {
    /// Exchange credentials for whatever session tokens the upstream sets.
    ///
    /// A partial set is a success; completeness is checked by callers that need it.
    async fn authenticate(&self, credentials: &Credentials) -> Result<SessionTokenSet, Error>;

    /// Fetch one student record, presenting the caller's tokens.
    async fn fetch_record(&self, id: u64, tokens: &SessionTokenSet)
        -> Result<StudentRecord, Error>;
}

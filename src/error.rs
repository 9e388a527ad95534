//! Error taxonomy for the request path.
//!
//! Every variant names the operation (and student id, where there is one) that
//! failed, and its `Display` text is what the client receives in the
//! `{"error": ...}` envelope.

use crate::api::response;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use std::{fmt, time::Duration};
use thiserror::Error;
use tracing::{debug, error};

/// Upstream-facing operation an error belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Login,
    FetchStudent(u64),
    GenerateReport(u64),
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Login => write!(f, "login request"),
            Self::FetchStudent(id) => write!(f, "student {id} request"),
            Self::GenerateReport(id) => write!(f, "report for student {id}"),
        }
    }
}

#[derive(Debug, Error)]
pub enum Error {
    #[error("{0}")]
    BadRequest(String),
    #[error("missing or invalid required tokens")]
    MissingCredentials,
    #[error("login failed: {0}")]
    AuthRejected(String),
    #[error("failed to get student {id}: {message}")]
    NotFound { id: u64, message: String },
    #[error("failed to get student {id}: {status} {message}")]
    Upstream {
        id: u64,
        status: StatusCode,
        message: String,
    },
    #[error("{operation} failed: {source}")]
    Transport {
        operation: Operation,
        #[source]
        source: reqwest::Error,
    },
    #[error("failed to decode student {id}: {source}")]
    Decode {
        id: u64,
        #[source]
        source: serde_json::Error,
    },
    #[error("failed to render report for student {id}: {reason}")]
    Render { id: u64, reason: String },
    #[error("failed to relay {cookie} cookie")]
    Relay { cookie: &'static str },
    #[error("{operation} cancelled after {}ms", .deadline.as_millis())]
    Cancelled {
        operation: Operation,
        deadline: Duration,
    },
}

impl Error {
    /// HTTP status reported to the client.
    ///
    /// Upstream not-found is deliberately reported as `500`: the gateway does not
    /// distinguish a missing record from other upstream failures at the status level.
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::MissingCredentials | Self::AuthRejected(_) => StatusCode::UNAUTHORIZED,
            Self::NotFound { .. }
            | Self::Upstream { .. }
            | Self::Transport { .. }
            | Self::Decode { .. }
            | Self::Render { .. }
            | Self::Relay { .. }
            | Self::Cancelled { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = self.status();

        if status.is_server_error() {
            error!("{self}");
        } else {
            debug!("{self}");
        }

        response::error(status, self.to_string())
    }
}

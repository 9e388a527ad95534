//! # Student Gateway (Session Relay & Report Service)
//!
//! `student-gateway` sits between a client and a single upstream school backend. It
//! relays the backend's login session to the client and re-shapes one backend
//! resource, the student record, into JSON and a rendered PDF report.
//!
//! ## Session Relay
//!
//! The upstream issues three cookies on login: `accessToken`, `refreshToken` and
//! `csrfToken`. The gateway never decodes or verifies them. It only checks that each
//! one is present and non-empty, then forwards the opaque values:
//!
//! - **Login:** the tokens found in the upstream `Set-Cookie` headers are set on the
//!   client response. Missing tokens are passed through as missing.
//! - **Record access:** all three cookies must be present on the inbound request,
//!   otherwise the request is rejected with `401` before the upstream is contacted.
//!   The CSRF value is sent upstream twice, as a cookie and as `x-csrf-token`.
//!
//! ## Identity Model
//!
//! There is no shared service identity. Every upstream call carries the caller's own
//! tokens, so each request is scoped to the session that made it.
//!
//! ## Reports
//!
//! Reports are single-record A4 documents with a fixed title and twenty label/value
//! rows in a fixed order. Rendering is deterministic and all-or-nothing.

pub mod api;
pub mod backend;
pub mod cli;
pub mod error;
pub mod relay;
pub mod student;

pub use error::{Error, Operation};

#[allow(clippy::doc_markdown, clippy::needless_raw_string_hashes)]
pub mod built_info {
    include!(concat!(env!("OUT_DIR"), "/built.rs"));
}

pub const GIT_COMMIT_HASH: &str = match built_info::GIT_COMMIT_HASH {
    Some(hash) => hash,
    None => "unknown",
};

pub const APP_USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"),);

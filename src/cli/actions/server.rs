use crate::{
    api,
    backend::BackendClient,
    relay::CookiePolicy,
    student::StudentService,
};
use anyhow::{Context, Result};
use axum::http::HeaderValue;
use std::{sync::Arc, time::Duration};
use tracing::info;
use url::Url;

#[derive(Debug)]
pub struct Args {
    pub port: u16,
    pub backend_url: Url,
    pub backend_timeout: Duration,
    pub request_deadline: Duration,
    pub cookie_secure: bool,
    pub allowed_origin: Option<HeaderValue>,
}

/// Execute the server action.
/// # Errors
/// Returns an error if the backend client cannot be built or the server fails to start.
pub async fn execute(args: Args) -> Result<()> {
    log_startup_args(&args);

    let backend = BackendClient::new(args.backend_url, args.backend_timeout)
        .context("Failed to build backend HTTP client")?;

    let service = StudentService::new(Arc::new(backend), args.request_deadline);
    let policy = CookiePolicy::new(args.cookie_secure);

    let app = api::app(service, policy, args.allowed_origin);

    api::new(args.port, app).await
}

fn log_startup_args(args: &Args) {
    let entries = startup_entries(args);
    log_entries("Startup configuration", &entries);
}

fn startup_entries(args: &Args) -> Vec<(&'static str, String)> {
    vec![
        ("listen", format!("tcp:{}", args.port)),
        ("backend_url", redact_url(&args.backend_url)),
        (
            "backend_timeout",
            format!("{}s", args.backend_timeout.as_secs()),
        ),
        (
            "request_deadline",
            format!("{}s", args.request_deadline.as_secs()),
        ),
        ("cookie_secure", args.cookie_secure.to_string()),
        (
            "allowed_origin",
            args.allowed_origin
                .as_ref()
                .and_then(|origin| origin.to_str().ok())
                .unwrap_or("none")
                .to_string(),
        ),
    ]
}

fn redact_url(url: &Url) -> String {
    let mut redacted = url.clone();
    if redacted.password().is_some() {
        let _ = redacted.set_password(Some("REDACTED"));
    }
    redacted.to_string()
}

fn log_entries(title: &str, entries: &[(&str, String)]) {
    let max_key_len = entries.iter().map(|(key, _)| key.len()).max().unwrap_or(0);
    let mut message = format!("{}\n\n{title}:", banner());
    for (key, value) in entries {
        let padding = " ".repeat(max_key_len.saturating_sub(key.len()));
        let _ =
            std::fmt::Write::write_fmt(&mut message, format_args!("\n  {key}:{padding} {value}"));
    }
    info!("{message}");
}

fn banner() -> String {
    format!(
        "student-gateway - {} - {}",
        env!("CARGO_PKG_VERSION"),
        short_commit(crate::GIT_COMMIT_HASH)
    )
}

fn short_commit(hash: &str) -> String {
    let trimmed = hash.trim();
    if trimmed.len() > 7 {
        trimmed[..7].to_string()
    } else {
        trimmed.to_string()
    }
}

use crate::cli::{
    actions::{server::Args, Action},
    commands::{
        backend::{ARG_BACKEND_TIMEOUT, ARG_BACKEND_URL, ARG_REQUEST_DEADLINE},
        ARG_ALLOWED_ORIGIN, ARG_COOKIE_SECURE, ARG_PORT,
    },
};
use anyhow::{anyhow, Context, Result};
use axum::http::HeaderValue;
use std::time::Duration;
use url::Url;

/// Parse and check the upstream base URL; only `http` and `https` are accepted.
///
/// # Errors
/// Returns an error if the URL does not parse, has no host, or uses another scheme.
pub fn parse_backend_url(raw: &str) -> Result<Url> {
    let url = Url::parse(raw).with_context(|| format!("invalid backend URL: {raw}"))?;

    match url.scheme() {
        "http" | "https" => {}
        scheme => return Err(anyhow!("unsupported backend URL scheme: {scheme}")),
    }

    if url.host().is_none() {
        return Err(anyhow!("invalid backend URL: no host specified"));
    }

    Ok(url)
}

/// # Errors
/// Returns an error if required arguments are missing or inconsistent.
pub fn handler(matches: &clap::ArgMatches) -> Result<Action> {
    let port = matches.get_one::<u16>(ARG_PORT).copied().unwrap_or(8080);

    let backend_url = matches
        .get_one::<String>(ARG_BACKEND_URL)
        .context("missing required argument: --backend-url")?;
    let backend_url = parse_backend_url(backend_url)?;

    let backend_timeout = matches
        .get_one::<u64>(ARG_BACKEND_TIMEOUT)
        .copied()
        .map_or(crate::backend::DEFAULT_TIMEOUT, Duration::from_secs);
    let request_deadline = matches
        .get_one::<u64>(ARG_REQUEST_DEADLINE)
        .copied()
        .map_or(crate::student::service::DEFAULT_DEADLINE, Duration::from_secs);

    let allowed_origin = matches
        .get_one::<String>(ARG_ALLOWED_ORIGIN)
        .map(|origin| {
            HeaderValue::from_str(origin)
                .with_context(|| format!("invalid allowed origin: {origin}"))
        })
        .transpose()?;

    Ok(Action::Server(Args {
        port,
        backend_url,
        backend_timeout,
        request_deadline,
        cookie_secure: matches.get_flag(ARG_COOKIE_SECURE),
        allowed_origin,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::commands;

    #[test]
    fn parse_backend_url_accepts_http_and_https() {
        assert!(parse_backend_url("http://backend.tld:5007").is_ok());
        assert!(parse_backend_url("https://backend.tld/school").is_ok());
    }

    #[test]
    fn parse_backend_url_rejects_other_schemes() {
        for raw in ["ftp://backend.tld", "unix:///tmp/backend.sock", "backend.tld"] {
            assert!(parse_backend_url(raw).is_err(), "{raw}");
        }
    }

    #[test]
    fn handler_builds_server_action() -> Result<()> {
        temp_env::with_vars_unset(
            [
                "STUDENT_GATEWAY_PORT",
                "STUDENT_GATEWAY_BACKEND_TIMEOUT",
                "STUDENT_GATEWAY_REQUEST_DEADLINE",
                "STUDENT_GATEWAY_COOKIE_SECURE",
                "STUDENT_GATEWAY_ALLOWED_ORIGIN",
            ],
            || {
                let matches = commands::new().get_matches_from(vec![
                    "student-gateway",
                    "--backend-url",
                    "http://backend.tld:5007",
                    "--backend-timeout",
                    "4",
                    "--allowed-origin",
                    "https://portal.tld",
                ]);

                let Action::Server(args) = handler(&matches)?;
                assert_eq!(args.port, 8080);
                assert_eq!(args.backend_url.as_str(), "http://backend.tld:5007/");
                assert_eq!(args.backend_timeout, Duration::from_secs(4));
                assert_eq!(args.request_deadline, Duration::from_secs(20));
                assert!(!args.cookie_secure);
                assert_eq!(
                    args.allowed_origin,
                    Some(HeaderValue::from_static("https://portal.tld"))
                );
                Ok(())
            },
        )
    }

    #[test]
    fn handler_rejects_bad_backend_url() {
        let matches = commands::new().get_matches_from(vec![
            "student-gateway",
            "--backend-url",
            "ftp://backend.tld",
        ]);
        assert!(handler(&matches).is_err());
    }
}

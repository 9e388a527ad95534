//! `Cookie` / `Set-Cookie` handling on both sides of the relay.

use super::{valid_token, CookieLifetime, SessionTokenSet, TokenName};
use crate::error::Error;
use axum::http::{header::COOKIE, HeaderMap, HeaderValue};
use tracing::debug;

/// Split a `Cookie` header (or the leading pair of a `Set-Cookie` directive) into
/// `name=value` pairs. Pairs without `=` are skipped.
fn cookie_pairs(header: &str) -> impl Iterator<Item = (&str, &str)> {
    header.split(';').filter_map(|pair| {
        let (name, value) = pair.trim().split_once('=')?;
        Some((name.trim(), unquote(value.trim())))
    })
}

fn unquote(value: &str) -> &str {
    value
        .strip_prefix('"')
        .and_then(|v| v.strip_suffix('"'))
        .unwrap_or(value)
}

// Expires values are kept only when they are plain visible ASCII.
fn lifetime_of(attributes: &str) -> CookieLifetime {
    let mut lifetime = CookieLifetime::default();

    for attribute in attributes.split(';') {
        let Some((key, value)) = attribute.split_once('=') else {
            continue;
        };
        let (key, value) = (key.trim(), value.trim());

        if key.eq_ignore_ascii_case("max-age") {
            lifetime.max_age = value.parse().ok();
        } else if key.eq_ignore_ascii_case("expires")
            && !value.is_empty()
            && value.bytes().all(|b| b == b' ' || b.is_ascii_graphic())
        {
            lifetime.expires = Some(value.to_string());
        }
    }

    lifetime
}

/// Build a token set from the `Set-Cookie` directives of an upstream login response.
///
/// Only the three recognised names are kept; everything else, and any empty value,
/// is ignored. `Max-Age` and `Expires` are kept with each token; the other attributes
/// are replaced by [`CookiePolicy`]. When the same name is set more than once, the
/// last non-empty value wins.
pub fn extract_from_login_response<'a, I>(directives: I) -> SessionTokenSet
where
    I: IntoIterator<Item = &'a str>,
{
    let mut tokens = SessionTokenSet::default();

    for directive in directives {
        let (leading, attributes) = directive.split_once(';').unwrap_or((directive, ""));
        let Some((name, value)) = cookie_pairs(leading).next() else {
            continue;
        };

        match TokenName::from_cookie_name(name) {
            Some(token) => tokens.insert_with_lifetime(token, value, lifetime_of(attributes)),
            None => debug!("ignoring upstream cookie: {}", name),
        }
    }

    tokens
}

/// First value sent for `name` across all `Cookie` headers of the request.
fn request_cookie<'h>(headers: &'h HeaderMap, name: &str) -> Option<&'h str> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|header| header.to_str().ok())
        .flat_map(cookie_pairs)
        .find_map(|(key, value)| (key == name).then_some(value))
}

/// Recover the full token set from an inbound request.
///
/// Fails with [`Error::MissingCredentials`] as soon as one of the three cookies is
/// absent or empty; no partial set is ever returned.
///
/// # Errors
/// Returns [`Error::MissingCredentials`] if any token is missing or empty.
pub fn require_from_request(headers: &HeaderMap) -> Result<SessionTokenSet, Error> {
    let mut tokens = SessionTokenSet::default();

    for name in TokenName::ALL {
        let value = request_cookie(headers, name.cookie_name())
            .and_then(valid_token)
            .ok_or_else(|| {
                debug!("request is missing the {} cookie", name);
                Error::MissingCredentials
            })?;
        tokens.insert(name, value);
    }

    Ok(tokens)
}

/// Attributes applied to the cookies relayed to the client after login.
#[derive(Debug, Clone, Copy, Default)]
pub struct CookiePolicy {
    secure: bool,
}

impl CookiePolicy {
    #[must_use]
    pub const fn new(secure: bool) -> Self {
        Self { secure }
    }

    #[must_use]
    pub const fn secure(&self) -> bool {
        self.secure
    }

    /// One `Set-Cookie` value per present token, carrying the upstream lifetime.
    ///
    /// # Errors
    /// Returns [`Error::Relay`] if a token cannot be encoded as a header value.
    pub fn set_cookie_headers(&self, tokens: &SessionTokenSet) -> Result<Vec<HeaderValue>, Error> {
        tokens
            .iter()
            .map(|(name, value)| {
                let lifetime = tokens
                    .lifetime(name)
                    .map(CookieLifetime::attributes)
                    .unwrap_or_default();
                let mut cookie = format!(
                    "{}={value}; Path=/{lifetime}; HttpOnly; SameSite=Lax",
                    name.cookie_name()
                );
                if self.secure {
                    cookie.push_str("; Secure");
                }
                HeaderValue::from_str(&cookie).map_err(|_| Error::Relay {
                    cookie: name.cookie_name(),
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request_headers(cookies: &[&str]) -> HeaderMap {
        let mut headers = HeaderMap::new();
        for cookie in cookies {
            headers.append(COOKIE, HeaderValue::from_str(cookie).unwrap());
        }
        headers
    }

    #[test]
    fn extracts_all_three_tokens() {
        let tokens = extract_from_login_response([
            "accessToken=access123; Path=/; HttpOnly",
            "refreshToken=refresh123; Path=/; HttpOnly",
            "csrfToken=csrf123; Path=/",
        ]);
        assert!(tokens.is_complete());
        assert_eq!(tokens.get(TokenName::Access), Some("access123"));
        assert_eq!(tokens.get(TokenName::Refresh), Some("refresh123"));
        assert_eq!(tokens.get(TokenName::Csrf), Some("csrf123"));
    }

    #[test]
    fn partial_response_yields_partial_set() {
        let tokens = extract_from_login_response(["csrfToken=csrf123", "sid=abc"]);
        assert_eq!(tokens.len(), 1);
        assert_eq!(tokens.get(TokenName::Csrf), Some("csrf123"));
        assert_eq!(tokens.get(TokenName::Access), None);
    }

    #[test]
    fn unrelated_and_empty_cookies_are_discarded() {
        let tokens = extract_from_login_response([
            "connect.sid=s%3Aabc; Path=/",
            "accessToken=; Path=/; Max-Age=0",
            "malformed",
        ]);
        assert!(tokens.is_empty());
    }

    #[test]
    fn duplicate_names_last_value_wins() {
        let tokens = extract_from_login_response([
            "accessToken=first",
            "refreshToken=r",
            "accessToken=second",
            "csrfToken=c",
        ]);
        assert_eq!(tokens.get(TokenName::Access), Some("second"));
    }

    #[test]
    fn duplicate_with_empty_value_keeps_previous() {
        let tokens = extract_from_login_response(["accessToken=first", "accessToken="]);
        assert_eq!(tokens.get(TokenName::Access), Some("first"));
    }

    #[test]
    fn input_order_does_not_change_result() {
        let forward = extract_from_login_response(["accessToken=a", "refreshToken=r", "csrfToken=c"]);
        let backward = extract_from_login_response(["csrfToken=c", "refreshToken=r", "accessToken=a"]);
        assert_eq!(forward.cookie_header(), backward.cookie_header());
    }

    #[test]
    fn quoted_values_are_unquoted() {
        let tokens = extract_from_login_response([r#"csrfToken="abc"; Path=/"#]);
        assert_eq!(tokens.get(TokenName::Csrf), Some("abc"));
    }

    #[test]
    fn require_accepts_complete_request() {
        let headers =
            request_headers(&["accessToken=a; refreshToken=r; csrfToken=c; theme=dark"]);
        let tokens = require_from_request(&headers).unwrap();
        assert!(tokens.is_complete());
        assert_eq!(tokens.get(TokenName::Refresh), Some("r"));
    }

    #[test]
    fn require_reads_across_multiple_cookie_headers() {
        let headers = request_headers(&["accessToken=a", "refreshToken=r", "csrfToken=c"]);
        assert!(require_from_request(&headers).unwrap().is_complete());
    }

    #[test]
    fn require_fails_when_any_token_is_missing() {
        let cases = [
            "refreshToken=r; csrfToken=c",
            "accessToken=a; csrfToken=c",
            "accessToken=a; refreshToken=r",
        ];
        for cookie in cases {
            let headers = request_headers(&[cookie]);
            assert!(
                matches!(
                    require_from_request(&headers),
                    Err(Error::MissingCredentials)
                ),
                "expected failure for {cookie}"
            );
        }
    }

    #[test]
    fn require_fails_on_empty_token() {
        let headers = request_headers(&["accessToken=; refreshToken=r; csrfToken=c"]);
        assert!(matches!(
            require_from_request(&headers),
            Err(Error::MissingCredentials)
        ));
    }

    #[test]
    fn require_fails_without_cookie_header() {
        assert!(matches!(
            require_from_request(&HeaderMap::new()),
            Err(Error::MissingCredentials)
        ));
    }

    #[test]
    fn require_uses_first_value_for_a_name() {
        let headers =
            request_headers(&["accessToken=first; accessToken=second; refreshToken=r; csrfToken=c"]);
        let tokens = require_from_request(&headers).unwrap();
        assert_eq!(tokens.get(TokenName::Access), Some("first"));
    }

    #[test]
    fn set_cookie_headers_follow_policy() {
        let tokens = SessionTokenSet::new("a", "r", "c");

        let plain = CookiePolicy::default().set_cookie_headers(&tokens).unwrap();
        assert_eq!(plain.len(), 3);
        assert_eq!(plain[0], "accessToken=a; Path=/; HttpOnly; SameSite=Lax");

        let secure = CookiePolicy::new(true).set_cookie_headers(&tokens).unwrap();
        assert!(secure
            .iter()
            .all(|value| value.to_str().unwrap().ends_with("; Secure")));
    }

    #[test]
    fn upstream_lifetime_is_relayed() {
        let tokens = extract_from_login_response([
            "accessToken=a; Path=/; Max-Age=900; HttpOnly",
            "refreshToken=r; Path=/; expires=Wed, 21 Oct 2026 07:28:00 GMT; HttpOnly",
            "csrfToken=c; Path=/",
        ]);
        let headers = CookiePolicy::default().set_cookie_headers(&tokens).unwrap();

        assert_eq!(
            headers[0],
            "accessToken=a; Path=/; Max-Age=900; HttpOnly; SameSite=Lax"
        );
        assert_eq!(
            headers[1],
            "refreshToken=r; Path=/; Expires=Wed, 21 Oct 2026 07:28:00 GMT; HttpOnly; SameSite=Lax"
        );
        assert_eq!(headers[2], "csrfToken=c; Path=/; HttpOnly; SameSite=Lax");
    }

    #[test]
    fn unparseable_lifetime_attributes_are_dropped() {
        let tokens = extract_from_login_response(["accessToken=a; Max-Age=soon; Expires="]);
        assert!(tokens.lifetime(TokenName::Access).unwrap().is_session());
    }

    #[test]
    fn duplicate_name_keeps_lifetime_of_winning_value() {
        let tokens = extract_from_login_response([
            "accessToken=old; Max-Age=60",
            "accessToken=new; Max-Age=900",
        ]);
        assert_eq!(tokens.get(TokenName::Access), Some("new"));
        assert_eq!(tokens.lifetime(TokenName::Access).unwrap().max_age, Some(900));
    }

    #[test]
    fn set_cookie_headers_skip_absent_tokens() {
        let tokens = extract_from_login_response(["csrfToken=c"]);
        let headers = CookiePolicy::default().set_cookie_headers(&tokens).unwrap();
        assert_eq!(headers.len(), 1);
        assert!(headers[0].to_str().unwrap().starts_with("csrfToken=c;"));
    }
}

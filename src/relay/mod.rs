//! Session token relay between the client and the upstream backend.
//!
//! The upstream issues three opaque tokens on login. This module owns their
//! names, the single notion of a "valid" token, and the typed set that carries
//! them through one request. Parsing of `Cookie`/`Set-Cookie` headers lives in
//! [`cookies`].

pub mod cookies;

pub use cookies::{extract_from_login_response, require_from_request, CookiePolicy};

use secrecy::{ExposeSecret, SecretString};
use std::fmt;

/// The three session tokens relayed by the gateway.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenName {
    Access,
    Refresh,
    Csrf,
}

impl TokenName {
    pub const ALL: [Self; 3] = [Self::Access, Self::Refresh, Self::Csrf];

    /// Cookie name used by the upstream and relayed to the client.
    #[must_use]
    pub const fn cookie_name(self) -> &'static str {
        match self {
            Self::Access => "accessToken",
            Self::Refresh => "refreshToken",
            Self::Csrf => "csrfToken",
        }
    }

    const fn index(self) -> usize {
        match self {
            Self::Access => 0,
            Self::Refresh => 1,
            Self::Csrf => 2,
        }
    }

    #[must_use]
    pub fn from_cookie_name(name: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|token| token.cookie_name() == name)
    }
}

impl fmt::Display for TokenName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.cookie_name())
    }
}

/// A token value is usable iff it is non-empty.
#[must_use]
pub fn valid_token(value: &str) -> Option<&str> {
    if value.is_empty() {
        None
    } else {
        Some(value)
    }
}

/// Expiry attributes the upstream attached to a token cookie.
///
/// Relayed unchanged to the client so a cookie never outlives the token it carries.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CookieLifetime {
    pub max_age: Option<i64>,
    pub expires: Option<String>,
}

impl CookieLifetime {
    #[must_use]
    pub fn is_session(&self) -> bool {
        self.max_age.is_none() && self.expires.is_none()
    }

    /// `Set-Cookie` attributes, each with its leading `; `.
    pub(crate) fn attributes(&self) -> String {
        let mut attributes = String::new();
        if let Some(max_age) = self.max_age {
            attributes.push_str(&format!("; Max-Age={max_age}"));
        }
        if let Some(expires) = &self.expires {
            attributes.push_str(&format!("; Expires={expires}"));
        }
        attributes
    }
}

/// One slot per [`TokenName`]; each either holds a non-empty value or is empty.
///
/// Values are kept as [`SecretString`] so they never show up in `Debug` output or
/// logs. A set has no public setters: it is built once, by extraction from a login
/// response or recovery from a request, and read from then on.
#[derive(Debug, Default)]
pub struct SessionTokenSet {
    access: Option<SecretString>,
    refresh: Option<SecretString>,
    csrf: Option<SecretString>,
    lifetimes: [CookieLifetime; 3],
}

impl SessionTokenSet {
    /// Build a set from explicit values, dropping any that are empty.
    #[must_use]
    pub fn new(access: &str, refresh: &str, csrf: &str) -> Self {
        let mut tokens = Self::default();
        tokens.insert(TokenName::Access, access);
        tokens.insert(TokenName::Refresh, refresh);
        tokens.insert(TokenName::Csrf, csrf);
        tokens
    }

    pub(crate) fn insert(&mut self, name: TokenName, value: &str) {
        self.insert_with_lifetime(name, value, CookieLifetime::default());
    }

    // Overwrites the slot and its lifetime, so the last valid value seen for a name wins.
    pub(crate) fn insert_with_lifetime(
        &mut self,
        name: TokenName,
        value: &str,
        lifetime: CookieLifetime,
    ) {
        if let Some(value) = valid_token(value) {
            *self.slot_mut(name) = Some(SecretString::from(value.to_string()));
            self.lifetimes[name.index()] = lifetime;
        }
    }

    fn slot(&self, name: TokenName) -> Option<&SecretString> {
        match name {
            TokenName::Access => self.access.as_ref(),
            TokenName::Refresh => self.refresh.as_ref(),
            TokenName::Csrf => self.csrf.as_ref(),
        }
    }

    fn slot_mut(&mut self, name: TokenName) -> &mut Option<SecretString> {
        match name {
            TokenName::Access => &mut self.access,
            TokenName::Refresh => &mut self.refresh,
            TokenName::Csrf => &mut self.csrf,
        }
    }

    #[must_use]
    pub fn get(&self, name: TokenName) -> Option<&str> {
        self.slot(name).map(|value| value.expose_secret())
    }

    /// Lifetime of a present token; `None` when the slot is empty.
    #[must_use]
    pub fn lifetime(&self, name: TokenName) -> Option<&CookieLifetime> {
        self.slot(name).map(|_| &self.lifetimes[name.index()])
    }

    /// All three tokens present and non-empty.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        TokenName::ALL.into_iter().all(|name| self.get(name).is_some())
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.iter().count()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Present tokens in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = (TokenName, &str)> + '_ {
        TokenName::ALL
            .into_iter()
            .filter_map(move |name| self.get(name).map(|value| (name, value)))
    }

    /// Render the present tokens as a single outbound `Cookie` header value.
    #[must_use]
    pub fn cookie_header(&self) -> Option<String> {
        let header = self
            .iter()
            .map(|(name, value)| format!("{}={value}", name.cookie_name()))
            .collect::<Vec<_>>()
            .join("; ");

        if header.is_empty() {
            None
        } else {
            Some(header)
        }
    }
}

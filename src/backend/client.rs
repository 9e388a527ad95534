use super::{Backend, Credentials, CSRF_HEADER, LOGIN_PATH, STUDENTS_PATH};
use crate::{
    error::{Error, Operation},
    relay::{extract_from_login_response, SessionTokenSet, TokenName},
    student::StudentRecord,
    APP_USER_AGENT,
};
use async_trait::async_trait;
use reqwest::{
    header::{COOKIE, SET_COOKIE},
    Client, StatusCode,
};
use secrecy::ExposeSecret;
use serde_json::json;
use std::time::Duration;
use tracing::{debug, instrument};
use url::Url;

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// HTTP client for the upstream backend.
///
/// Holds only transport configuration; nothing about a caller survives a call.
#[derive(Debug, Clone)]
pub struct BackendClient {
    base_url: Url,
    client: Client,
}

impl BackendClient {
    /// # Errors
    /// Returns an error if the underlying HTTP client cannot be built.
    pub fn new(base_url: Url, timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .user_agent(APP_USER_AGENT)
            .timeout(timeout)
            .build()?;

        Ok(Self { base_url, client })
    }

    #[must_use]
    pub const fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Join `endpoint` onto the base URL, keeping any path prefix the base carries.
    #[must_use]
    pub fn endpoint_url(&self, endpoint: &str) -> String {
        let endpoint_url = format!(
            "{}{endpoint}",
            self.base_url.as_str().trim_end_matches('/')
        );

        debug!("endpoint URL: {}", endpoint_url);

        endpoint_url
    }
}

fn body_text(body: &[u8]) -> String {
    String::from_utf8_lossy(body).trim().to_string()
}

#[async_trait]
impl Backend for BackendClient {
    #[instrument(skip(self, credentials), fields(username = %credentials.username()))]
    async fn authenticate(&self, credentials: &Credentials) -> Result<SessionTokenSet, Error> {
        let login_url = self.endpoint_url(LOGIN_PATH);

        let login_payload = json!({
            "username": credentials.username(),
            "password": credentials.password().expose_secret(),
        });

        let response = self
            .client
            .post(&login_url)
            .json(&login_payload)
            .send()
            .await
            .map_err(|source| Error::Transport {
                operation: Operation::Login,
                source,
            })?;

        if response.status() != StatusCode::OK {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();

            debug!("{} - {}", login_url, status);

            return Err(Error::AuthRejected(body.trim().to_string()));
        }

        let tokens = extract_from_login_response(
            response
                .headers()
                .get_all(SET_COOKIE)
                .iter()
                .filter_map(|value| value.to_str().ok()),
        );

        debug!("upstream login returned {} of 3 tokens", tokens.len());

        Ok(tokens)
    }

    #[instrument(skip(self, tokens))]
    async fn fetch_record(
        &self,
        id: u64,
        tokens: &SessionTokenSet,
    ) -> Result<StudentRecord, Error> {
        let student_url = self.endpoint_url(&format!("{STUDENTS_PATH}/{id}"));
        let transport = |source: reqwest::Error| Error::Transport {
            operation: Operation::FetchStudent(id),
            source,
        };

        let mut request = self.client.get(&student_url);
        if let Some(cookie) = tokens.cookie_header() {
            request = request.header(COOKIE, cookie);
        }
        if let Some(csrf) = tokens.get(TokenName::Csrf) {
            request = request.header(CSRF_HEADER, csrf);
        }

        let response = request.send().await.map_err(transport)?;
        let status = response.status();
        let body = response.bytes().await.map_err(transport)?;

        match status {
            StatusCode::OK => {
                serde_json::from_slice(&body).map_err(|source| Error::Decode { id, source })
            }
            StatusCode::NOT_FOUND => Err(Error::NotFound {
                id,
                message: body_text(&body),
            }),
            _ => Err(Error::Upstream {
                id,
                status,
                message: body_text(&body),
            }),
        }
    }
}

use crate::{
    api::response::{self, Data, ErrorBody},
    backend::Credentials,
    error::Error,
    relay::CookiePolicy,
    student::StudentService,
};
use axum::{
    extract::{rejection::JsonRejection, Extension},
    http::{header::SET_COOKIE, StatusCode},
    response::Response,
    Json,
};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{debug, instrument};
use utoipa::ToSchema;

#[derive(ToSchema, Deserialize)]
pub struct LoginRequest {
    username: String,
    #[schema(format = Password)]
    password: String,
}

impl fmt::Debug for LoginRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoginRequest")
            .field("username", &self.username)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct LoginMessage {
    message: String,
}

#[utoipa::path(
    post,
    path= "/api/v1/login",
    request_body = LoginRequest,
    responses (
        (status = 200, description = "Login successful, session cookies set", body = Data<LoginMessage>),
        (status = 400, description = "Malformed request body", body = ErrorBody),
        (status = 401, description = "Upstream rejected the credentials", body = ErrorBody),
        (status = 500, description = "Upstream unreachable or deadline exceeded", body = ErrorBody),
    ),
    tag= "auth"
)]
/// Log in upstream and relay the issued session tokens as cookies.
///
/// Whatever subset of tokens the upstream sets is relayed; completeness is only
/// enforced on the record routes.
#[instrument(skip_all)]
pub async fn login(
    Extension(service): Extension<StudentService>,
    Extension(policy): Extension<CookiePolicy>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Response, Error> {
    let Json(request) = payload.map_err(|rejection| Error::BadRequest(rejection.body_text()))?;

    debug!("login request: {:?}", request);

    let credentials = Credentials::new(request.username, SecretString::from(request.password));
    let tokens = service.login(&credentials).await?;
    let cookies = policy.set_cookie_headers(&tokens)?;

    let mut response = response::data(
        StatusCode::OK,
        LoginMessage {
            message: "Login successful".to_string(),
        },
    );
    for cookie in cookies {
        response.headers_mut().append(SET_COOKIE, cookie);
    }

    Ok(response)
}

use crate::{
    api::response::{self, Data, ErrorBody},
    error::Error,
    relay::require_from_request,
    student::{StudentRecord, StudentService},
};
use axum::{
    extract::{Extension, Path},
    http::{
        header::{CONTENT_DISPOSITION, CONTENT_TYPE},
        HeaderMap, HeaderValue, StatusCode,
    },
    response::{IntoResponse, Response},
};
use tracing::instrument;

fn parse_id(raw: &str) -> Result<u64, Error> {
    raw.parse::<u64>()
        .map_err(|_| Error::BadRequest(format!("invalid student id: {raw}")))
}

#[utoipa::path(
    get,
    path= "/api/v1/{id}",
    params(
        ("id" = u64, Path, description = "Student id")
    ),
    responses (
        (status = 200, description = "Student record", body = Data<StudentRecord>),
        (status = 400, description = "Invalid student id", body = ErrorBody),
        (status = 401, description = "Missing or invalid session cookies", body = ErrorBody),
        (status = 500, description = "Upstream failure", body = ErrorBody),
    ),
    tag= "students"
)]
#[instrument(skip(service, headers))]
pub async fn get_student(
    Extension(service): Extension<StudentService>,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> Result<Response, Error> {
    let id = parse_id(&id)?;
    let tokens = require_from_request(&headers)?;

    let record = service.get_student(id, &tokens).await?;

    Ok(response::data(StatusCode::OK, record))
}

#[utoipa::path(
    get,
    path= "/api/v1/{id}/report",
    params(
        ("id" = u64, Path, description = "Student id")
    ),
    responses (
        (status = 200, description = "PDF report", content_type = "application/pdf", body = Vec<u8>),
        (status = 400, description = "Invalid student id", body = ErrorBody),
        (status = 401, description = "Missing or invalid session cookies", body = ErrorBody),
        (status = 500, description = "Upstream or rendering failure", body = ErrorBody),
    ),
    tag= "students"
)]
#[instrument(skip(service, headers))]
pub async fn get_report(
    Extension(service): Extension<StudentService>,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> Result<Response, Error> {
    let id = parse_id(&id)?;
    let tokens = require_from_request(&headers)?;

    let document = service.generate_report(id, &tokens).await?;

    let disposition = HeaderValue::from_str(&format!(
        "attachment; filename={}",
        document.filename()
    ))
    .map_err(|err| Error::Render {
        id,
        reason: err.to_string(),
    })?;

    Ok((
        StatusCode::OK,
        [
            (CONTENT_TYPE, HeaderValue::from_static("application/pdf")),
            (CONTENT_DISPOSITION, disposition),
        ],
        document.into_bytes(),
    )
        .into_response())
}

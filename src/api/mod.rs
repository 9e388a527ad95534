#![allow(clippy::needless_for_each)]

use crate::{
    api::handlers::{
        get_report, get_student, health, health::__path_health, login, login::__path_login,
        students::{__path_get_report, __path_get_student},
    },
    relay::CookiePolicy,
    student::{StudentRecord, StudentService},
};
use anyhow::Result;
use axum::{
    body::Body,
    extract::MatchedPath,
    http::{header::CONTENT_TYPE, HeaderName, HeaderValue, Method, Request, StatusCode},
    response::Response,
    routing::{get, post},
    Extension, Router,
};
use std::any::Any;
use tokio::{net::TcpListener, signal};
use tower::ServiceBuilder;
use tower_http::{
    catch_panic::CatchPanicLayer, cors::CorsLayer, request_id::PropagateRequestIdLayer,
    set_header::SetRequestHeaderLayer, trace::TraceLayer,
};
use tracing::{error, info, info_span, Span};
use ulid::Ulid;
use utoipa::OpenApi;

pub mod handlers;
pub mod response;


pub const API_PREFIX: &str = "/api/v1";

#[derive(OpenApi)]
#[openapi(
    paths(health, login, get_student, get_report),
    components(schemas(
        health::Health,
        login::LoginRequest,
        login::LoginMessage,
        StudentRecord,
        response::ErrorBody
    )),
    tags(
        (name = "student-gateway", description = "Session-relaying gateway for student records and reports")
    )
)]
struct ApiDoc;

#[must_use]
pub fn openapi() -> utoipa::openapi::OpenApi {
    ApiDoc::openapi()
}

/// Record routes, relative to [`API_PREFIX`].
pub fn router() -> Router {
    Router::new()
        .route("/login", post(login))
        .route("/:id", get(get_student))
        .route("/:id/report", get(get_report))
}

/// Full application: API routes under [`API_PREFIX`], `/health`, and the middleware stack.
///
/// CORS is only installed when an origin is given; credentials are allowed for that
/// origin alone so the relayed cookies are sent back.
pub fn app(service: StudentService, policy: CookiePolicy, allowed_origin: Option<HeaderValue>) -> Router {
    let app = Router::new()
        .nest(API_PREFIX, router())
        .route("/health", get(health).options(health))
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestHeaderLayer::if_not_present(
                    HeaderName::from_static("x-request-id"),
                    |_req: &_| HeaderValue::from_str(Ulid::new().to_string().as_str()).ok(),
                ))
                .layer(PropagateRequestIdLayer::new(HeaderName::from_static(
                    "x-request-id",
                )))
                .layer(TraceLayer::new_for_http().make_span_with(make_span))
                .layer(CatchPanicLayer::custom(handle_panic))
                .layer(Extension(service))
                .layer(Extension(policy)),
        );

    match allowed_origin {
        Some(origin) => app.layer(
            CorsLayer::new()
                .allow_headers([CONTENT_TYPE])
                .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
                .allow_origin(origin)
                .allow_credentials(true),
        ),
        None => app,
    }
}

/// Start the server
/// # Errors
/// Return error if failed to start the server
pub async fn new(port: u16, app: Router) -> Result<()> {
    let listener = TcpListener::bind(format!("::0:{port}")).await?;

    info!("Listening on [::]:{}", port);

    axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Gracefully shutdown");

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = signal::ctrl_c().await {
            error!("Failed to listen for Ctrl+C: {}", err);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(err) => {
                error!("Failed to listen for SIGTERM: {}", err);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }
}

fn handle_panic(err: Box<dyn Any + Send + 'static>) -> Response {
    let detail = err
        .downcast_ref::<String>()
        .map(String::as_str)
        .or_else(|| err.downcast_ref::<&str>().copied())
        .unwrap_or("unknown panic");

    error!("handler panicked: {}", detail);

    response::error(StatusCode::INTERNAL_SERVER_ERROR, "internal server error")
}

fn make_span(request: &Request<Body>) -> Span {
    let request_id = request
        .headers()
        .get("x-request-id")
        .and_then(|val| val.to_str().ok())
        .unwrap_or("none");
    let matched_path = request
        .extensions()
        .get::<MatchedPath>()
        .map_or_else(|| request.uri().path(), MatchedPath::as_str);

    info_span!(
        "http.request",
        http.method = %request.method(),
        http.route = matched_path,
        request_id
    )
}

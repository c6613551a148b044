//! `server` handler: the admin HTTP interface.
//!
//! `GET /start`, `/stop`, `/park` submit a command and answer once the mower
//! complies (200) or the wait times out (500). `GET /status` serves the last
//! report from a short-lived cache. Anything else is a 400.

use std::net::SocketAddr;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant};

use axum::{
    Json, Router,
    body::Body,
    extract::State,
    http::{Request, Response, StatusCode},
    response::IntoResponse,
    routing::get,
};
use serde_json::json;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::{
    Span, debug_span,
    field::{Empty, display},
    info, warn,
};

use mowctl_core::{Command, Controller, StatusReport};

use crate::cli::ServerArgs;
use crate::config::{Config, Session};
use crate::error::CliError;

/// Shared handler state.
#[derive(Clone)]
pub struct AppState {
    controller: Controller,
    command_timeout: Duration,
    expire: Duration,
    cache: Arc<Mutex<Option<CachedReport>>>,
}

struct CachedReport {
    at: Instant,
    report: StatusReport,
}

impl AppState {
    pub fn new(controller: Controller, command_timeout: Duration, expire: Duration) -> Self {
        Self {
            controller,
            command_timeout,
            expire,
            cache: Arc::new(Mutex::new(None)),
        }
    }

    fn cached(&self) -> Option<StatusReport> {
        let cache = self.cache.lock().unwrap_or_else(PoisonError::into_inner);
        cache
            .as_ref()
            .filter(|c| c.at.elapsed() < self.expire)
            .map(|c| c.report.clone())
    }

    fn store(&self, report: Option<StatusReport>) {
        *self.cache.lock().unwrap_or_else(PoisonError::into_inner) =
            report.map(|report| CachedReport {
                at: Instant::now(),
                report,
            });
    }
}

/// Build the admin router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/start", get(start))
        .route("/stop", get(stop))
        .route("/park", get(park))
        .route("/status", get(status))
        .fallback(unknown_path)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|request: &Request<Body>| {
                    debug_span!("request",
                        method = %request.method(),
                        uri = %request.uri().path(),
                        status = Empty,
                    )
                })
                .on_response(|response: &Response<Body>, _: Duration, span: &Span| {
                    span.record("status", display(response.status()));
                }),
        )
        .with_state(state)
}

pub async fn handle(args: ServerArgs, session: &Session, cfg: &Config) -> Result<(), CliError> {
    let controller = session.spawn_supervisor(Duration::from_secs(cfg.defaults.poll_interval))?;
    let state = AppState::new(
        controller.clone(),
        Duration::from_secs(args.timeout.unwrap_or(cfg.defaults.timeout)),
        Duration::from_secs(args.expire.unwrap_or(cfg.defaults.status_expire)),
    );

    let addr = SocketAddr::new(args.address, args.port);
    let listener = TcpListener::bind(addr).await?;
    info!(%addr, "admin server listening");

    axum::serve(listener, router(state))
        .with_graceful_shutdown(interrupted(tokio::signal::ctrl_c()))
        .await?;

    controller.shutdown().await;
    Ok(())
}

/// Resolves once `signal` fires. Never resolves if the handler could not be
/// installed.
async fn interrupted(signal: impl Future<Output = std::io::Result<()>>) {
    match signal.await {
        Ok(()) => info!("interrupted, shutting down"),
        Err(e) => {
            warn!(error = %e, "cannot listen for Ctrl-C, serve until killed");
            std::future::pending::<()>().await;
        }
    }
}

// ── Handlers ─────────────────────────────────────────────────────────

async fn start(State(state): State<AppState>) -> impl IntoResponse {
    submit(&state, Command::Start).await
}

async fn stop(State(state): State<AppState>) -> impl IntoResponse {
    submit(&state, Command::Stop).await
}

async fn park(State(state): State<AppState>) -> impl IntoResponse {
    submit(&state, Command::Park).await
}

async fn submit(state: &AppState, command: Command) -> (StatusCode, Json<serde_json::Value>) {
    let satisfied = state
        .controller
        .submit_command(command, state.command_timeout)
        .await;
    if satisfied {
        // The cached report predates the state change.
        state.store(None);
    }

    let code = if satisfied {
        StatusCode::OK
    } else {
        StatusCode::INTERNAL_SERVER_ERROR
    };
    (
        code,
        Json(json!({ "command": command, "satisfied": satisfied })),
    )
}

/// Handle `GET /status`
///
/// Answers from cache while it is younger than `expire`; otherwise waits
/// (bounded by the command timeout) for the supervisor's latest report.
async fn status(State(state): State<AppState>) -> Response<Body> {
    if let Some(report) = state.cached() {
        return Json(report).into_response();
    }
    match state.controller.report(state.command_timeout).await {
        Some(report) => {
            state.store(Some(report.clone()));
            Json(report).into_response()
        }
        None => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "error": "mower status unavailable" })),
        )
            .into_response(),
    }
}

async fn unknown_path() -> (StatusCode, Json<serde_json::Value>) {
    (
        StatusCode::BAD_REQUEST,
        Json(json!({ "error": "unknown path" })),
    )
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use std::time::Duration;

    use async_trait::async_trait;
    use secrecy::SecretString;
    use tokio::net::TcpListener;

    use mowctl_core::{
        ApiError, Command, Controller, Credentials, DeviceApi, DeviceSnapshot, SupervisorConfig,
    };

    use super::{AppState, interrupted, router};

    /// Always reports the same vendor code.
    struct FixedDevice {
        code: &'static str,
    }

    #[async_trait]
    impl DeviceApi for FixedDevice {
        async fn login(&mut self, _: &str, _: &SecretString) -> Result<(), ApiError> {
            Ok(())
        }

        async fn fetch_status(&mut self) -> Result<DeviceSnapshot, ApiError> {
            Ok(DeviceSnapshot::from_code(self.code))
        }

        async fn send_control(&mut self, _: Command) -> Result<(), ApiError> {
            Ok(())
        }

        async fn logout(&mut self) -> Result<(), ApiError> {
            Ok(())
        }
    }

    async fn setup_test_server(code: &'static str) -> (u16, Controller) {
        let config = SupervisorConfig::new(Credentials::new("user", "pass"))
            .with_poll_interval(Duration::from_secs(1));
        let controller = Controller::spawn(config, FixedDevice { code });
        let state = AppState::new(
            controller.clone(),
            Duration::from_secs(1),
            Duration::from_secs(30),
        );

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        tokio::spawn(async move { axum::serve(listener, router(state)).await });

        (port, controller)
    }

    #[tokio::test]
    async fn satisfied_command_answers_ok() {
        let (port, controller) = setup_test_server("OK_CUTTING").await;

        let response = reqwest::get(format!("http://127.0.0.1:{port}/start"))
            .await
            .unwrap();

        assert_eq!(response.status(), 200);
        let body: serde_json::Value = response.json().await.unwrap();
        assert_eq!(body["command"], "START");
        assert_eq!(body["satisfied"], true);
        controller.shutdown().await;
    }

    #[tokio::test]
    async fn unsatisfied_command_times_out_with_500() {
        let (port, controller) = setup_test_server("ERROR").await;

        let response = reqwest::get(format!("http://127.0.0.1:{port}/park"))
            .await
            .unwrap();

        assert_eq!(response.status(), 500);
        let body: serde_json::Value = response.json().await.unwrap();
        assert_eq!(body["satisfied"], false);
        controller.shutdown().await;
    }

    #[tokio::test]
    async fn status_returns_normalized_report() {
        let (port, controller) = setup_test_server("OK_CHARGING").await;

        let response = reqwest::get(format!("http://127.0.0.1:{port}/status"))
            .await
            .unwrap();

        assert_eq!(response.status(), 200);
        let body: serde_json::Value = response.json().await.unwrap();
        assert_eq!(body["status"], "charging");
        assert_eq!(body["snapshot"]["status_code"], "OK_CHARGING");
        controller.shutdown().await;
    }

    #[tokio::test]
    async fn unknown_path_is_bad_request() {
        let (port, controller) = setup_test_server("OK_CHARGING").await;

        let response = reqwest::get(format!("http://127.0.0.1:{port}/mow-faster"))
            .await
            .unwrap();

        assert_eq!(response.status(), 400);
        controller.shutdown().await;
    }

    #[tokio::test]
    async fn signal_handler_failure_keeps_serving() {
        let failed = interrupted(async { Err(std::io::Error::other("no signal support")) });
        assert!(tokio::time::timeout(Duration::from_millis(50), failed).await.is_err());

        let fired = interrupted(async { Ok(()) });
        assert!(tokio::time::timeout(Duration::from_millis(50), fired).await.is_ok());
    }
}

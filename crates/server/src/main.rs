use std::{net::SocketAddr, sync::Arc};

use axum::{
    body::Bytes,
    extract::{Path, State},
    http::{header, StatusCode},
    middleware,
    response::{IntoResponse, Redirect, Response},
    routing::get,
    Extension, Json, Router,
};
use server_api::{
    pages::{PageLookup, TemplateDir},
    render_page,
    session::SessionCodec,
    submit, ApiContext,
};
use shared::{
    domain::PageId,
    error::{ApiError, ErrorCode},
    form::FieldSet,
};
use storage::SubmissionLog;
use tower_http::limit::RequestBodyLimitLayer;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

mod app_state;
mod config;
mod session_layer;

use app_state::AppState;
use config::{load_settings, prepare_log_path, Settings};
use session_layer::{session_layer, SessionHandle};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let settings = load_settings();
    prepare_log_path(&settings.submission_log)?;
    if settings.uses_default_secret() {
        warn!("using the built-in session secret; set SECRET_KEY in production");
    }
    if !settings.pages_dir.is_dir() {
        warn!(pages_dir = %settings.pages_dir.display(), "pages directory does not exist");
    }

    let app = build_router(build_state(&settings), settings.max_body_bytes);

    let addr: SocketAddr = settings.server_bind.parse()?;
    info!(
        %addr,
        log = %settings.submission_log.display(),
        pages = %settings.pages_dir.display(),
        "survey server listening"
    );
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

fn build_state(settings: &Settings) -> Arc<AppState> {
    let api = ApiContext::new(
        Arc::new(SubmissionLog::new(&settings.submission_log)),
        Arc::new(TemplateDir::new(&settings.pages_dir)),
    );
    Arc::new(AppState {
        api,
        sessions: Arc::new(SessionCodec::new(&settings.session_secret)),
    })
}

fn build_router(state: Arc<AppState>, max_body_bytes: usize) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/*page", get(serve_page).post(submit_page))
        .layer(middleware::from_fn_with_state(state.clone(), session_layer))
        .layer(RequestBodyLimitLayer::new(max_body_bytes))
        .with_state(state)
}

async fn index() -> Redirect {
    Redirect::to(&PageId::start().location())
}

async fn serve_page(
    State(state): State<Arc<AppState>>,
    Extension(session): Extension<SessionHandle>,
    Path(page): Path<String>,
) -> Result<Response, (StatusCode, Json<ApiError>)> {
    let page = PageId::new(page);
    let mut session = session.lock().await;
    let lookup = render_page(&state.api, &mut session, &page)
        .await
        .map_err(into_response_error)?;

    match lookup {
        PageLookup::Found(content) => {
            Ok(([(header::CONTENT_TYPE, content.content_type)], content.body).into_response())
        }
        PageLookup::NotFound => Err(into_response_error(ApiError::not_found(format!(
            "page '{page}' not found"
        )))),
    }
}

/// Any path accepts a form post, `/save` included.
async fn submit_page(
    State(state): State<Arc<AppState>>,
    Extension(session): Extension<SessionHandle>,
    body: Bytes,
) -> Result<Redirect, (StatusCode, Json<ApiError>)> {
    let fields = FieldSet::from_urlencoded(&body);
    let mut session = session.lock().await;
    let destination = submit(&state.api, &mut session, &fields)
        .await
        .map_err(into_response_error)?;
    Ok(Redirect::to(&destination.location()))
}

fn into_response_error(err: ApiError) -> (StatusCode, Json<ApiError>) {
    let status = match err.code {
        ErrorCode::NotFound => StatusCode::NOT_FOUND,
        ErrorCode::Internal => StatusCode::INTERNAL_SERVER_ERROR,
    };
    (status, Json(err))
}

#[cfg(test)]
#[path = "tests/main_tests.rs"]
mod tests;

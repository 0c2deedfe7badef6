use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::{header, HeaderMap, HeaderValue},
    middleware::Next,
    response::Response,
};
use server_api::{
    identity::ensure_visitor_id,
    session::{Session, SessionCodec},
};
use tokio::sync::Mutex;
use tracing::{debug, error};

use crate::app_state::AppState;

pub(crate) const SESSION_COOKIE: &str = "survey_session";

/// Request-scoped handle to the visitor's session.
#[derive(Clone)]
pub(crate) struct SessionHandle(Arc<Mutex<Session>>);

impl SessionHandle {
    fn new(session: Session) -> Self {
        Self(Arc::new(Mutex::new(session)))
    }

    pub(crate) async fn lock(&self) -> tokio::sync::MutexGuard<'_, Session> {
        self.0.lock().await
    }
}

/// Loads the session cookie, assigns a visitor id before the handler runs and
/// writes the cookie back if anything changed.
pub(crate) async fn session_layer(
    State(state): State<Arc<AppState>>,
    mut request: Request,
    next: Next,
) -> Response {
    let mut session = load_session(&state.sessions, request.headers());
    ensure_visitor_id(&mut session);

    let handle = SessionHandle::new(session);
    request.extensions_mut().insert(handle.clone());

    let mut response = next.run(request).await;

    let session = handle.lock().await;
    if session.is_modified() {
        match store_session(&state.sessions, &session) {
            Ok(cookie) => {
                response.headers_mut().append(header::SET_COOKIE, cookie);
            }
            Err(err) => error!(error = %err, "failed to write session cookie"),
        }
    }
    response
}

fn load_session(codec: &SessionCodec, headers: &HeaderMap) -> Session {
    let Some(token) = cookie_value(headers, SESSION_COOKIE) else {
        return Session::new();
    };
    codec.decode(token).unwrap_or_else(|err| {
        debug!(error = %err, "discarding unreadable session cookie");
        Session::new()
    })
}

fn store_session(codec: &SessionCodec, session: &Session) -> anyhow::Result<HeaderValue> {
    let token = codec.encode(session)?;
    let cookie = format!("{SESSION_COOKIE}={token}; Path=/; HttpOnly; SameSite=Lax");
    Ok(HeaderValue::from_str(&cookie)?)
}

fn cookie_value<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get_all(header::COOKIE)
        .into_iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, _)| *key == name)
        .map(|(_, value)| value)
}

use std::sync::Arc;

use server_api::{session::SessionCodec, ApiContext};

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) api: ApiContext,
    pub(crate) sessions: Arc<SessionCodec>,
}

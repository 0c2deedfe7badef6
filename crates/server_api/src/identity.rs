use shared::domain::VisitorId;
use tracing::debug;

use crate::session::{Session, VISITOR_ID_KEY};

/// Returns the session's visitor id, minting one first if the session has none.
///
/// An id already present is never replaced.
pub fn ensure_visitor_id(session: &mut Session) -> VisitorId {
    if let Some(existing) = session.visitor_id() {
        return existing;
    }

    let visitor_id = VisitorId::generate();
    session.set(VISITOR_ID_KEY, visitor_id.as_str());
    debug!(%visitor_id, "assigned new visitor id");
    visitor_id
}

#[cfg(test)]
#[path = "tests/identity_tests.rs"]
mod tests;

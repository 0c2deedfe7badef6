pub mod answers;
pub mod identity;
pub mod navigation;
pub mod pages;
pub mod session;

use std::sync::Arc;

use shared::{
    domain::PageId,
    error::ApiError,
    form::FieldSet,
    protocol::SubmissionRecord,
};
use storage::SubmissionStore;
use tracing::{debug, error, info};

use crate::{
    answers::{extract_answers, QUESTION_PREFIX},
    identity::ensure_visitor_id,
    navigation::{resolve_destination, NavigationHints, PAGE_FIELD, ROLE_FIELD},
    pages::{PageLookup, PageSource},
    session::{Session, ROLE_KEY},
};

pub const DEFAULT_CONFIRMATION: &str = "Odpověď uložena";

#[derive(Clone)]
pub struct ApiContext {
    pub log: Arc<dyn SubmissionStore>,
    pub pages: Arc<dyn PageSource>,
    pub question_prefix: String,
    pub confirmation: String,
}

impl ApiContext {
    pub fn new(log: Arc<dyn SubmissionStore>, pages: Arc<dyn PageSource>) -> Self {
        Self {
            log,
            pages,
            question_prefix: QUESTION_PREFIX.to_string(),
            confirmation: DEFAULT_CONFIRMATION.to_string(),
        }
    }
}

/// Records one form submission and returns the page to redirect to.
///
/// Role and confirmation reach the session only after the record is
/// appended, so a failed append leaves them untouched.
pub async fn submit(
    ctx: &ApiContext,
    session: &mut Session,
    fields: &FieldSet,
) -> Result<PageId, ApiError> {
    let visitor_id = ensure_visitor_id(session);
    let answers = extract_answers(fields, &ctx.question_prefix);
    let page = PageId::new(fields.get_one(PAGE_FIELD).unwrap_or_default());
    let record = SubmissionRecord::new(visitor_id.clone(), page, answers);

    ctx.log.append(&record).await.map_err(|err| {
        error!(%visitor_id, page = %record.page, error = %err, "failed to persist submission");
        ApiError::internal(err.to_string())
    })?;

    if let Some(role) = fields.get_non_empty(ROLE_FIELD) {
        session.set(ROLE_KEY, role);
    }
    session.flash(ctx.confirmation.clone());

    let destination = resolve_destination(&NavigationHints::from_fields(fields));
    info!(
        %visitor_id,
        page = %record.page,
        answers = record.answers.len(),
        %destination,
        "submission saved"
    );
    Ok(destination)
}

/// Looks up `page`; a found page consumes the session's pending flashes.
pub async fn render_page(
    ctx: &ApiContext,
    session: &mut Session,
    page: &PageId,
) -> Result<PageLookup, ApiError> {
    let lookup = ctx.pages.lookup(page).await.map_err(internal)?;
    match lookup {
        PageLookup::Found(content) => {
            let flashes = session.take_flashes();
            Ok(PageLookup::Found(content.with_flashes(&flashes)))
        }
        PageLookup::NotFound => {
            debug!(%page, "page not found");
            Ok(PageLookup::NotFound)
        }
    }
}

fn internal(err: anyhow::Error) -> ApiError {
    error!(error = %err, "page lookup failed");
    ApiError::internal(err.to_string())
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;

use shared::{domain::PageId, form::FieldSet};

pub const NEXT_FIELD: &str = "next";
pub const ROLE_FIELD: &str = "role";
pub const PAGE_FIELD: &str = "page";

/// Routing fields read from a submitted form. Empty strings count as absent.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NavigationHints<'a> {
    pub next: Option<&'a str>,
    pub role: Option<&'a str>,
    pub page: Option<&'a str>,
}

impl<'a> NavigationHints<'a> {
    pub fn from_fields(fields: &'a FieldSet) -> Self {
        Self {
            next: fields.get_non_empty(NEXT_FIELD),
            role: fields.get_non_empty(ROLE_FIELD),
            page: fields.get_non_empty(PAGE_FIELD),
        }
    }
}

/// Picks where a visitor goes after submitting.
///
/// First match wins: explicit `next`, then the entry page of the chosen
/// role, then the originating page, then the start page. The destination is
/// not checked for existence.
pub fn resolve_destination(hints: &NavigationHints<'_>) -> PageId {
    if let Some(next) = non_empty(hints.next) {
        return PageId::new(next);
    }
    if let Some(role) = non_empty(hints.role) {
        return PageId::roleplay_entry(role);
    }
    if let Some(page) = non_empty(hints.page) {
        return PageId::new(page);
    }
    PageId::start()
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.is_empty())
}

#[cfg(test)]
#[path = "tests/navigation_tests.rs"]
mod tests;

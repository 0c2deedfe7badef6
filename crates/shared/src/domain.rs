use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Page every visitor lands on when nothing else decides the destination.
pub const START_PAGE: &str = "stranky/dotaznik.html";

/// Anonymous visitor token kept in the session cookie.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VisitorId(String);

impl VisitorId {
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for VisitorId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl fmt::Display for VisitorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Path-like page name, e.g. `roleplay/merchant/1otazka.html`.
///
/// Used both as a lookup key for page content and as a plain value inside
/// submitted forms. Nothing here checks that a page actually exists.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PageId(String);

impl PageId {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn start() -> Self {
        Self::new(START_PAGE)
    }

    /// First page of the branching sequence for `role`.
    pub fn roleplay_entry(role: &str) -> Self {
        Self::new(format!("roleplay/{role}/1otazka.html"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Absolute, percent-encoded URL path for redirects.
    pub fn location(&self) -> String {
        let path = format!("/{}", self.0.trim_start_matches('/'));
        match url::Url::parse("http://survey.invalid/") {
            Ok(mut url) => {
                url.set_path(&path);
                url.path().to_string()
            }
            Err(_) => path,
        }
    }
}

impl fmt::Display for PageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
#[path = "tests/domain_tests.rs"]
mod tests;
